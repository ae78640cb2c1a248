use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::record::Record;

/// Wire keys of the treatment schema, in canonical order.
pub const FARMER_NAME: &str = "farmerName";
pub const ANIMAL_ID: &str = "animalId";
pub const MEDICINE_NAME: &str = "medicineName";
pub const DOSAGE: &str = "dosage";
pub const TREAT_DATE: &str = "treatDate";
pub const WITHDRAW_DATE: &str = "withdrawDate";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One veterinary treatment event as entered by an operator.
///
/// This is the application's view of a [`Record`]. The ledger never sees this
/// type directly; callers convert it with `Record::from(&treatment)` before
/// appending. Dates are kept as the `YYYY-MM-DD` strings the operator entered
/// so that the hashed bytes are exactly what was recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecord {
    pub farmer_name: String,
    pub animal_id: String,
    pub medicine_name: String,
    pub dosage: String,
    pub treat_date: String,
    pub withdraw_date: String,
}

impl TreatmentRecord {
    /// Build a record, trimming surrounding whitespace from every field.
    pub fn new(
        farmer_name: &str,
        animal_id: &str,
        medicine_name: &str,
        dosage: &str,
        treat_date: &str,
        withdraw_date: &str,
    ) -> Self {
        Self {
            farmer_name: farmer_name.trim().to_string(),
            animal_id: animal_id.trim().to_string(),
            medicine_name: medicine_name.trim().to_string(),
            dosage: dosage.trim().to_string(),
            treat_date: treat_date.trim().to_string(),
            withdraw_date: withdraw_date.trim().to_string(),
        }
    }

    /// Caller-side field validation.
    ///
    /// Every field must be non-blank, both dates must be calendar dates, and
    /// the withdrawal date must not precede the treatment date.
    pub fn validate(&self) -> Result<(), TypeError> {
        for (name, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(TypeError::MissingField(name));
            }
        }
        let treat = parse_date(TREAT_DATE, &self.treat_date)?;
        let withdraw = parse_date(WITHDRAW_DATE, &self.withdraw_date)?;
        if withdraw < treat {
            return Err(TypeError::WithdrawalBeforeTreatment);
        }
        Ok(())
    }

    /// Fields as `(wire key, value)` pairs in canonical order.
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            (FARMER_NAME, &self.farmer_name),
            (ANIMAL_ID, &self.animal_id),
            (MEDICINE_NAME, &self.medicine_name),
            (DOSAGE, &self.dosage),
            (TREAT_DATE, &self.treat_date),
            (WITHDRAW_DATE, &self.withdraw_date),
        ]
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, TypeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| TypeError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

impl From<&TreatmentRecord> for Record {
    fn from(t: &TreatmentRecord) -> Self {
        t.fields().into_iter().collect()
    }
}

impl From<TreatmentRecord> for Record {
    fn from(t: TreatmentRecord) -> Self {
        Record::from(&t)
    }
}

impl TryFrom<&Record> for TreatmentRecord {
    type Error = TypeError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        let field = |key: &'static str| {
            r.get(key)
                .map(str::to_string)
                .ok_or(TypeError::MissingField(key))
        };
        Ok(Self {
            farmer_name: field(FARMER_NAME)?,
            animal_id: field(ANIMAL_ID)?,
            medicine_name: field(MEDICINE_NAME)?,
            dosage: field(DOSAGE)?,
            treat_date: field(TREAT_DATE)?,
            withdraw_date: field(WITHDRAW_DATE)?,
        })
    }
}
