use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vtl",
    about = "Veterinary treatment ledger: tamper-evident treatment records",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (default: ./vtl.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the ledger entry, overriding the config file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the ledger, creating the genesis block if needed
    Init,
    /// Record a treatment event
    Append(AppendArgs),
    /// Record a treatment event from scanned payload text
    AppendPayload(PayloadArgs),
    /// Show the most recent block
    Latest,
    /// List blocks
    Log(LogArgs),
    /// Show one block
    Show(ShowArgs),
    /// Check chain integrity
    Verify(VerifyArgs),
    /// Discard the whole chain and start a new one
    Reset(ResetArgs),
    /// Print the text payload of a block for QR encoding
    Lens(LensArgs),
    /// Parse scanned payload text without recording it
    Decode(PayloadArgs),
}

#[derive(Args)]
pub struct AppendArgs {
    #[arg(long)]
    pub farmer: String,
    #[arg(long)]
    pub animal: String,
    #[arg(long)]
    pub medicine: String,
    #[arg(long)]
    pub dose: String,
    /// Treatment date, YYYY-MM-DD
    #[arg(long)]
    pub treat: String,
    /// Withdrawal date, YYYY-MM-DD
    #[arg(long)]
    pub withdraw: String,
}

#[derive(Args)]
pub struct PayloadArgs {
    pub text: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub index: usize,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// List every violation with its position
    #[arg(long)]
    pub detail: bool,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm the destructive reset
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct LensArgs {
    /// Block index (default: the latest block)
    pub index: Option<usize>,
    /// Emit a `#view` URL under this http(s) base instead of plain text
    #[arg(long, value_name = "BASE")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["vtl", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
    }

    #[test]
    fn parse_append() {
        let cli = Cli::try_parse_from([
            "vtl", "append", "--farmer", "S1", "--animal", "A1", "--medicine", "M1",
            "--dose", "10mg", "--treat", "2025-01-01", "--withdraw", "2025-01-10",
        ])
        .unwrap();
        if let Command::Append(args) = cli.command {
            assert_eq!(args.farmer, "S1");
            assert_eq!(args.dose, "10mg");
            assert_eq!(args.withdraw, "2025-01-10");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn append_requires_all_fields() {
        assert!(Cli::try_parse_from(["vtl", "append", "--farmer", "S1"]).is_err());
    }

    #[test]
    fn parse_append_payload() {
        let cli =
            Cli::try_parse_from(["vtl", "append-payload", "Farmer: S1 | Animal: A1"]).unwrap();
        if let Command::AppendPayload(args) = cli.command {
            assert_eq!(args.text, "Farmer: S1 | Animal: A1");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_log_oneline() {
        let cli = Cli::try_parse_from(["vtl", "log", "--oneline", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(args.oneline);
            assert_eq!(args.limit, Some(5));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["vtl", "show", "3"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.index, 3);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verify_detail() {
        let cli = Cli::try_parse_from(["vtl", "verify", "--detail"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert!(args.detail);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_reset_without_confirmation() {
        let cli = Cli::try_parse_from(["vtl", "reset"]).unwrap();
        if let Command::Reset(args) = cli.command {
            assert!(!args.yes);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_lens_default_tip() {
        let cli = Cli::try_parse_from(["vtl", "lens"]).unwrap();
        if let Command::Lens(args) = cli.command {
            assert_eq!(args.index, None);
            assert_eq!(args.url, None);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_lens_url() {
        let cli = Cli::try_parse_from(["vtl", "lens", "2", "--url", "https://farm.example/"])
            .unwrap();
        if let Command::Lens(args) = cli.command {
            assert_eq!(args.index, Some(2));
            assert_eq!(args.url.as_deref(), Some("https://farm.example/"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "vtl", "--verbose", "--format", "json", "--data-dir", "/tmp/vtl", "latest",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/vtl")));
        assert!(matches!(cli.command, Command::Latest));
    }
}
