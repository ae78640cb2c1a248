//! Text payloads exchanged with the QR collaborator.
//!
//! Three shapes are understood:
//!
//! ```text
//! Farmer: S1 | Animal: A1 | Med: M1 | Dose: 10mg | Treat: 2025-01-01 | Withdraw: 2025-01-10
//! https://farm.example/index.html#view&farmer=S1&animal=A1&med=M1&dose=10mg&treat=2025-01-01&wd=2025-01-10
//! {"data": {"farmerName": "S1", "animalId": "A1", ...}}
//! ```
//!
//! The pipe-separated form is short enough to keep QR density low and stays
//! readable when scanned by a generic phone camera. The URL form opens the
//! record view of a deployed page. The JSON form is accepted either as a bare
//! record or wrapped in a block-like object with `data`.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::TypeError;
use crate::treatment::{
    TreatmentRecord, ANIMAL_ID, DOSAGE, FARMER_NAME, MEDICINE_NAME, TREAT_DATE, WITHDRAW_DATE,
};

/// Which payload shape a decoded text used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat {
    LensText,
    Url,
    Json,
}

/// A treatment record recovered from scanned text.
///
/// Decoding is lenient: fields absent from the payload come back empty.
/// Run [`TreatmentRecord::validate`] before appending the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPayload {
    pub format: PayloadFormat,
    pub record: TreatmentRecord,
}

/// Render a record as the pipe-separated text payload.
pub fn encode_lens_text(record: &TreatmentRecord) -> String {
    [
        format!("Farmer: {}", record.farmer_name),
        format!("Animal: {}", record.animal_id),
        format!("Med: {}", record.medicine_name),
        format!("Dose: {}", record.dosage),
        format!("Treat: {}", record.treat_date),
        format!("Withdraw: {}", record.withdraw_date),
    ]
    .join(" | ")
}

/// Render a record as a `#view` URL under `base`.
///
/// Only `http://` and `https://` bases produce a URL; anything else falls
/// back to [`encode_lens_text`]. A base that already has a fragment gets the
/// parameters appended to it.
pub fn encode_url_payload(base: &str, record: &TreatmentRecord) -> String {
    if !is_http_base(base) {
        return encode_lens_text(record);
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("farmer", &record.farmer_name)
        .append_pair("animal", &record.animal_id)
        .append_pair("med", &record.medicine_name)
        .append_pair("dose", &record.dosage)
        .append_pair("treat", &record.treat_date)
        .append_pair("wd", &record.withdraw_date)
        .finish();
    let sep = if base.contains('#') { "&" } else { "#view&" };
    format!("{base}{sep}{query}")
}

fn is_http_base(base: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        base.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Decode scanned text: pipe-separated form first, then a `#view` URL, then
/// JSON.
pub fn decode_payload(text: &str) -> Result<DecodedPayload, TypeError> {
    if let Some(record) = decode_lens_text(text) {
        return Ok(DecodedPayload {
            format: PayloadFormat::LensText,
            record,
        });
    }
    if let Some(record) = decode_url(text) {
        return Ok(DecodedPayload {
            format: PayloadFormat::Url,
            record,
        });
    }
    decode_json(text).map(|record| DecodedPayload {
        format: PayloadFormat::Json,
        record,
    })
}

fn decode_lens_text(text: &str) -> Option<TreatmentRecord> {
    let mut pairs = HashMap::new();
    for segment in text.split('|') {
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        pairs.insert(key, value.trim().to_string());
    }

    let present = |key: &str| pairs.get(key).is_some_and(|v| !v.is_empty());
    if !present("farmer") && !present("animal") {
        return None;
    }

    let withdraw_date = pairs
        .remove("withdraw")
        .or_else(|| pairs.remove("withdrawal"))
        .unwrap_or_default();
    let mut take = |key: &str| pairs.remove(key).unwrap_or_default();

    Some(TreatmentRecord {
        farmer_name: take("farmer"),
        animal_id: take("animal"),
        medicine_name: take("med"),
        dosage: take("dose"),
        treat_date: take("treat"),
        withdraw_date,
    })
}

fn decode_url(text: &str) -> Option<TreatmentRecord> {
    let (_, fragment) = text.trim().split_once('#')?;
    let params = fragment.strip_prefix("view")?;
    let mut pairs: HashMap<String, String> = form_urlencoded::parse(params.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut take = |key: &str| pairs.remove(key).unwrap_or_default();

    Some(TreatmentRecord {
        farmer_name: take("farmer"),
        animal_id: take("animal"),
        medicine_name: take("med"),
        dosage: take("dose"),
        treat_date: take("treat"),
        withdraw_date: take("wd"),
    })
}

fn decode_json(text: &str) -> Result<TreatmentRecord, TypeError> {
    let value: Value = serde_json::from_str(text).map_err(|_| TypeError::UnrecognizedPayload)?;
    let object = match value.get("data") {
        Some(data) if data.is_object() => data,
        _ if value.is_object() => &value,
        _ => return Err(TypeError::UnrecognizedPayload),
    };

    let field = |key: &str| match object.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Ok(TreatmentRecord {
        farmer_name: field(FARMER_NAME),
        animal_id: field(ANIMAL_ID),
        medicine_name: field(MEDICINE_NAME),
        dosage: field(DOSAGE),
        treat_date: field(TREAT_DATE),
        withdraw_date: field(WITHDRAW_DATE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreatmentRecord {
        TreatmentRecord::new("S1", "A1", "M1", "10mg", "2025-01-01", "2025-01-10")
    }

    #[test]
    fn lens_text_layout() {
        assert_eq!(
            encode_lens_text(&sample()),
            "Farmer: S1 | Animal: A1 | Med: M1 | Dose: 10mg | Treat: 2025-01-01 | Withdraw: 2025-01-10"
        );
    }

    #[test]
    fn lens_text_decodes_back() {
        let decoded = decode_payload(&encode_lens_text(&sample())).unwrap();
        assert_eq!(decoded.format, PayloadFormat::LensText);
        assert_eq!(decoded.record, sample());
    }

    #[test]
    fn lens_keys_case_insensitive_and_values_keep_colons() {
        let decoded = decode_payload("FARMER: Jo | animal: A:7 | Withdrawal: 2025-02-01").unwrap();
        assert_eq!(decoded.record.farmer_name, "Jo");
        assert_eq!(decoded.record.animal_id, "A:7");
        assert_eq!(decoded.record.withdraw_date, "2025-02-01");
        assert_eq!(decoded.record.dosage, "");
    }

    #[test]
    fn lens_needs_farmer_or_animal() {
        assert_eq!(
            decode_payload("Med: X | Dose: 1"),
            Err(TypeError::UnrecognizedPayload)
        );
    }

    #[test]
    fn lens_with_blank_farmer_and_animal_rejected() {
        assert_eq!(
            decode_payload("Farmer: | Animal: "),
            Err(TypeError::UnrecognizedPayload)
        );
        assert!(decode_payload("Farmer: | Animal: A1").is_ok());
    }

    #[test]
    fn url_payload_layout() {
        let mut record = sample();
        record.medicine_name = "Pen & Strep".into();
        assert_eq!(
            encode_url_payload("https://farm.example/index.html", &record),
            "https://farm.example/index.html#view&farmer=S1&animal=A1&med=Pen+%26+Strep\
             &dose=10mg&treat=2025-01-01&wd=2025-01-10"
        );
    }

    #[test]
    fn url_payload_decodes_back() {
        let mut record = sample();
        record.dosage = "5 ml | 2x/day".into();
        let url = encode_url_payload("HTTPS://farm.example/", &record);
        assert!(url.starts_with("HTTPS://farm.example/#view&"));
        let decoded = decode_payload(&url).unwrap();
        assert_eq!(decoded.format, PayloadFormat::Url);
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn url_base_with_fragment_appends_params() {
        let url = encode_url_payload("http://farm.example/#view", &sample());
        assert!(url.starts_with("http://farm.example/#view&farmer=S1"));
        assert_eq!(decode_payload(&url).unwrap().record, sample());
    }

    #[test]
    fn non_http_base_falls_back_to_lens_text() {
        for base in ["", "ftp://farm.example/", "farm.example", "é"] {
            assert_eq!(encode_url_payload(base, &sample()), encode_lens_text(&sample()));
        }
    }

    #[test]
    fn url_without_view_fragment_rejected() {
        assert_eq!(
            decode_payload("https://farm.example/#other&farmer=S1"),
            Err(TypeError::UnrecognizedPayload)
        );
    }

    #[test]
    fn json_bare_record() {
        let text = serde_json::to_string(&sample()).unwrap();
        let decoded = decode_payload(&text).unwrap();
        assert_eq!(decoded.format, PayloadFormat::Json);
        assert_eq!(decoded.record, sample());
    }

    #[test]
    fn json_block_wrapper() {
        let text = r#"{"index":3,"data":{"farmerName":"S1","animalId":"A1","dosage":5}}"#;
        let decoded = decode_payload(text).unwrap();
        assert_eq!(decoded.record.farmer_name, "S1");
        assert_eq!(decoded.record.dosage, "5");
        assert_eq!(decoded.record.medicine_name, "");
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(decode_payload("hello"), Err(TypeError::UnrecognizedPayload));
        assert_eq!(decode_payload("42"), Err(TypeError::UnrecognizedPayload));
    }
}
