use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use vtl_ledger::{Block, EntryChainStore, Ledger, LedgerOrigin};
use vtl_store::FileEntryStore;
use vtl_types::{
    decode_payload, encode_lens_text, encode_url_payload, PayloadFormat, Record, TreatmentRecord,
};

use crate::cli::*;
use crate::config::CliConfig;

type FileLedger = Ledger<EntryChainStore<FileEntryStore>>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let json = matches!(cli.format, OutputFormat::Json);
    // Decoding never touches the ledger.
    if let Command::Decode(args) = cli.command {
        return cmd_decode(args, json);
    }

    let config = CliConfig::resolve(cli.config.as_deref(), cli.data_dir.as_deref())?;
    let mut ledger = open_ledger(&config)?;

    match cli.command {
        Command::Init => cmd_init(&ledger, &config, json),
        Command::Append(args) => cmd_append(&mut ledger, args, json),
        Command::AppendPayload(args) => cmd_append_payload(&mut ledger, args, json),
        Command::Latest => {
            let tip = ledger.latest()?;
            print_block(tip, json)
        }
        Command::Log(args) => cmd_log(&ledger, args, json),
        Command::Show(args) => {
            let block = ledger
                .get(args.index)
                .with_context(|| format!("no block at index {}", args.index))?;
            print_block(block, json)
        }
        Command::Verify(args) => cmd_verify(&ledger, args, json),
        Command::Reset(args) => cmd_reset(&mut ledger, args, json),
        Command::Lens(args) => cmd_lens(&ledger, args, json),
        Command::Decode(args) => cmd_decode(args, json),
    }
}

fn open_ledger(config: &CliConfig) -> anyhow::Result<FileLedger> {
    let store = FileEntryStore::open(&config.data_dir)
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
    let port = EntryChainStore::from_config(store, &config.ledger);
    Ledger::open(port, &config.ledger).context("cannot open ledger")
}

fn cmd_init(ledger: &FileLedger, config: &CliConfig, json: bool) -> anyhow::Result<()> {
    let tip = ledger.latest()?;
    let origin = match ledger.origin() {
        LedgerOrigin::Loaded => "loaded",
        LedgerOrigin::GenesisCreated => "genesis created",
        LedgerOrigin::Recovered => "recovered (unreadable chain set aside)",
        LedgerOrigin::Reset => "reset",
    };
    if json {
        println!(
            "{}",
            json!({
                "data_dir": config.data_dir,
                "entry": ledger.port().key(),
                "origin": origin,
                "blocks": ledger.len(),
                "tip": tip.hash(),
                "quarantined": ledger.quarantined(),
            })
        );
        return Ok(());
    }
    println!(
        "{} Ledger ready in {}",
        "✓".green().bold(),
        config.data_dir.display().to_string().bold()
    );
    println!("  Entry: {}", ledger.port().key());
    println!("  Origin: {}", origin.cyan());
    println!("  Blocks: {}", ledger.len().to_string().bold());
    println!("  Tip: {}", tip.hash().yellow());
    if let Some(key) = ledger.quarantined() {
        println!(
            "  {} previous data kept under {}",
            "!".red().bold(),
            config.data_dir.join(key).display().to_string().bold()
        );
    }
    Ok(())
}

fn cmd_append(ledger: &mut FileLedger, args: AppendArgs, json: bool) -> anyhow::Result<()> {
    let treatment = TreatmentRecord::new(
        &args.farmer,
        &args.animal,
        &args.medicine,
        &args.dose,
        &args.treat,
        &args.withdraw,
    );
    append_treatment(ledger, treatment, json)
}

fn cmd_append_payload(
    ledger: &mut FileLedger,
    args: PayloadArgs,
    json: bool,
) -> anyhow::Result<()> {
    let decoded = decode_payload(&args.text)?;
    append_treatment(ledger, decoded.record, json)
}

fn append_treatment(
    ledger: &mut FileLedger,
    treatment: TreatmentRecord,
    json: bool,
) -> anyhow::Result<()> {
    treatment.validate()?;
    let block = ledger.append(Record::from(&treatment))?;
    if json {
        println!("{}", serde_json::to_string_pretty(block)?);
        return Ok(());
    }
    println!(
        "{} Block {} appended",
        "✓".green().bold(),
        format!("#{}", block.index()).yellow().bold()
    );
    println!("  Hash: {}", block.hash().yellow());
    println!("  Prev: {}", block.previous_hash().dimmed());
    println!("  Payload: {}", encode_lens_text(&treatment));
    Ok(())
}

fn cmd_log(ledger: &FileLedger, args: LogArgs, json: bool) -> anyhow::Result<()> {
    let shown = tail(ledger.blocks(), args.limit);

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }
    for block in shown {
        let field = |key: &str| {
            block
                .record()
                .and_then(|r| r.get(key))
                .unwrap_or_default()
                .to_string()
        };
        if args.oneline {
            println!(
                "{} {} {}",
                format!("#{}", block.index()).yellow(),
                block.short_hash().dimmed(),
                if block.record().is_some() {
                    field("animalId")
                } else {
                    "genesis".to_string()
                }
            );
        } else {
            println!(
                "{}  hash: {}...  prev: {}...  farmer: {}  animal: {}",
                format!("#{}", block.index()).yellow().bold(),
                block.short_hash(),
                block.previous_hash().get(..12).unwrap_or(block.previous_hash()),
                field("farmerName"),
                field("animalId"),
            );
        }
    }
    Ok(())
}

/// The last `limit` blocks, or all of them.
fn tail(blocks: &[Block], limit: Option<usize>) -> &[Block] {
    let skip = limit.map_or(0, |n| blocks.len().saturating_sub(n));
    &blocks[skip..]
}

fn cmd_verify(ledger: &FileLedger, args: VerifyArgs, json: bool) -> anyhow::Result<()> {
    let valid = ledger.validate_chain();
    let report = ledger.validation_report();

    if json {
        println!(
            "{}",
            json!({ "valid": valid, "blocks": ledger.len(), "violations": report.violations })
        );
    } else {
        if valid {
            println!("{} Chain is valid", "✓".green().bold());
        } else {
            println!("{} Chain is INVALID", "✗".red().bold());
        }
        println!("  Blocks: {}", ledger.len().to_string().bold());
        if args.detail {
            for v in &report.violations {
                println!(
                    "  {} position {}: {}",
                    format!("{:?}", v.kind).red(),
                    v.position,
                    v.description
                );
            }
            if report.is_clean() {
                println!("  No findings.");
            }
        }
    }

    if !valid {
        bail!("ledger integrity check failed");
    }
    Ok(())
}

fn cmd_reset(ledger: &mut FileLedger, args: ResetArgs, json: bool) -> anyhow::Result<()> {
    if !args.yes {
        bail!("reset discards every block and cannot be undone; re-run with --yes");
    }
    let discarded = ledger.len();
    let genesis = ledger.reset()?;
    if json {
        println!("{}", json!({ "discarded": discarded, "genesis": genesis }));
    } else {
        println!("{} Chain cleared ({} blocks discarded)", "✓".green().bold(), discarded);
        println!("  Genesis: {}", genesis.hash().yellow());
    }
    Ok(())
}

fn cmd_lens(ledger: &FileLedger, args: LensArgs, json: bool) -> anyhow::Result<()> {
    let (index, payload) = lens_payload(ledger, &args)?;
    if json {
        println!("{}", json!({ "index": index, "payload": payload }));
    } else {
        println!("{payload}");
    }
    Ok(())
}

/// The QR payload for a block: a `#view` URL when `--url` names an http(s)
/// base, the pipe-separated text otherwise.
fn lens_payload(ledger: &FileLedger, args: &LensArgs) -> anyhow::Result<(u64, String)> {
    let block = match args.index {
        Some(i) => ledger
            .get(i)
            .with_context(|| format!("no block at index {i}"))?,
        None => ledger.latest()?,
    };
    let Some(record) = block.record() else {
        bail!("the genesis block has no treatment record; add at least one block first");
    };
    let treatment = TreatmentRecord::try_from(record)
        .with_context(|| format!("block #{} is not a treatment record", block.index()))?;
    let payload = match args.url.as_deref() {
        Some(base) => encode_url_payload(base, &treatment),
        None => encode_lens_text(&treatment),
    };
    Ok((block.index(), payload))
}

fn cmd_decode(args: PayloadArgs, json: bool) -> anyhow::Result<()> {
    let decoded = decode_payload(&args.text)?;
    let format = match decoded.format {
        PayloadFormat::LensText => "lens-text",
        PayloadFormat::Url => "url",
        PayloadFormat::Json => "json",
    };
    if json {
        println!("{}", json!({ "format": format, "record": decoded.record }));
        return Ok(());
    }
    let r = &decoded.record;
    println!("Format: {}", format.cyan());
    println!("  Farmer: {}", r.farmer_name);
    println!("  Animal: {}", r.animal_id);
    println!("  Medicine: {}", r.medicine_name);
    println!("  Dosage: {}", r.dosage);
    println!("  Treat: {}", r.treat_date);
    println!("  Withdraw: {}", r.withdraw_date);
    if let Err(e) = r.validate() {
        println!("  {} {}", "!".red().bold(), e);
    }
    Ok(())
}

fn print_block(block: &Block, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(block)?);
        return Ok(());
    }
    println!("Block {}", format!("#{}", block.index()).yellow().bold());
    println!("  Timestamp: {}", block.timestamp());
    println!("  Hash: {}", block.hash().yellow());
    println!("  Prev: {}", block.previous_hash().dimmed());
    println!("  Nonce: {}", block.nonce());
    match block.record() {
        Some(record) => {
            for (key, value) in record.iter() {
                println!("  {}: {}", key.bold(), value);
            }
        }
        None => println!("  {}", "genesis".cyan()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, CliConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: dir.path().join("ledger"),
            ..CliConfig::default()
        };
        (dir, config)
    }

    fn append_args(dose: &str) -> AppendArgs {
        AppendArgs {
            farmer: "S1".into(),
            animal: "A1".into(),
            medicine: "M1".into(),
            dose: dose.into(),
            treat: "2025-01-01".into(),
            withdraw: "2025-01-10".into(),
        }
    }

    #[test]
    fn append_then_verify() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        cmd_append(&mut ledger, append_args("10mg"), false).unwrap();
        assert_eq!(ledger.len(), 2);
        cmd_verify(&ledger, VerifyArgs { detail: true }, false).unwrap();

        let reopened = open_ledger(&config).unwrap();
        assert_eq!(reopened.origin(), LedgerOrigin::Loaded);
        assert_eq!(reopened.blocks(), ledger.blocks());
    }

    #[test]
    fn init_reports_recovered_store() {
        let (_dir, config) = temp_config();
        std::fs::create_dir_all(&config.data_dir).unwrap();
        let entry = config.data_dir.join(&config.ledger.storage_key);
        std::fs::write(&entry, [0xff, 0xfe, b'[']).unwrap();

        let ledger = open_ledger(&config).unwrap();
        assert_eq!(ledger.origin(), LedgerOrigin::Recovered);
        assert_eq!(ledger.quarantined(), Some("simple_chain_qr.corrupt"));
        cmd_init(&ledger, &config, false).unwrap();
        cmd_init(&ledger, &config, true).unwrap();
        assert_eq!(
            std::fs::read(config.data_dir.join("simple_chain_qr.corrupt")).unwrap(),
            [0xff, 0xfe, b'[']
        );
    }

    #[test]
    fn append_rejects_invalid_dates() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        let mut args = append_args("10mg");
        args.withdraw = "2024-12-01".into();
        assert!(cmd_append(&mut ledger, args, false).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn append_payload_records_scanned_text() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        let text = "Farmer: S1 | Animal: A1 | Med: M1 | Dose: 5ml | Treat: 2025-03-01 | Withdraw: 2025-03-04";
        cmd_append_payload(&mut ledger, PayloadArgs { text: text.into() }, true).unwrap();
        let record = ledger.latest().unwrap().record().unwrap();
        assert_eq!(record.get("dosage"), Some("5ml"));
    }

    #[test]
    fn reset_requires_confirmation() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        cmd_append(&mut ledger, append_args("1"), false).unwrap();
        assert!(cmd_reset(&mut ledger, ResetArgs { yes: false }, false).is_err());
        assert_eq!(ledger.len(), 2);
        cmd_reset(&mut ledger, ResetArgs { yes: true }, false).unwrap();
        assert_eq!(ledger.len(), 1);
    }

    fn lens_args(index: Option<usize>, url: Option<&str>) -> LensArgs {
        LensArgs {
            index,
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn lens_refuses_genesis() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        assert!(cmd_lens(&ledger, lens_args(None, None), false).is_err());
        cmd_append(&mut ledger, append_args("1"), false).unwrap();
        cmd_lens(&ledger, lens_args(None, None), false).unwrap();
        assert!(cmd_lens(&ledger, lens_args(Some(9), None), false).is_err());
    }

    #[test]
    fn lens_url_payload_and_fallback() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        cmd_append(&mut ledger, append_args("10mg"), false).unwrap();

        let (index, url) =
            lens_payload(&ledger, &lens_args(None, Some("https://farm.example/"))).unwrap();
        assert_eq!(index, 1);
        assert!(url.starts_with("https://farm.example/#view&farmer=S1&animal=A1"));
        assert!(url.ends_with("&wd=2025-01-10"));

        let (_, text) = lens_payload(&ledger, &lens_args(Some(1), Some("farm.example"))).unwrap();
        assert_eq!(text, lens_payload(&ledger, &lens_args(Some(1), None)).unwrap().1);
        assert!(text.starts_with("Farmer: S1 | Animal: A1"));
    }

    #[test]
    fn log_limit_keeps_the_tail() {
        let (_dir, config) = temp_config();
        let mut ledger = open_ledger(&config).unwrap();
        for dose in ["1", "2", "3"] {
            cmd_append(&mut ledger, append_args(dose), false).unwrap();
        }
        let indices = |limit| -> Vec<u64> {
            tail(ledger.blocks(), limit).iter().map(Block::index).collect()
        };
        assert_eq!(indices(Some(2)), vec![2, 3]);
        assert_eq!(indices(Some(10)), vec![0, 1, 2, 3]);
        assert_eq!(indices(Some(0)), Vec::<u64>::new());
        assert_eq!(indices(None), vec![0, 1, 2, 3]);

        for oneline in [false, true] {
            cmd_log(&ledger, LogArgs { limit: Some(10), oneline }, false).unwrap();
            cmd_log(&ledger, LogArgs { limit: Some(2), oneline }, true).unwrap();
        }
    }

    #[test]
    fn verify_fails_on_tampered_file() {
        let (_dir, config) = temp_config();
        {
            let mut ledger = open_ledger(&config).unwrap();
            cmd_append(&mut ledger, append_args("10mg"), false).unwrap();
            cmd_append(&mut ledger, append_args("11mg"), false).unwrap();
        }
        let path = config.data_dir.join(&config.ledger.storage_key);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replacen("10mg", "20mg", 1)).unwrap();

        let ledger = open_ledger(&config).unwrap();
        assert!(cmd_verify(&ledger, VerifyArgs { detail: true }, true).is_err());
    }

    #[test]
    fn decode_unrecognized_is_error() {
        assert!(cmd_decode(PayloadArgs { text: "hello".into() }, false).is_err());
        cmd_decode(PayloadArgs { text: "Animal: A1".into() }, false).unwrap();
    }
}
