use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vtl_ledger::LedgerConfig;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "vtl.toml";

/// CLI configuration, read from TOML.
///
/// ```toml
/// data_dir = ".vtl"
/// storage_key = "simple_chain_qr"
/// on_corrupt = "start-fresh"   # or "fail"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    #[serde(flatten)]
    pub ledger: LedgerConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".vtl"),
            ledger: LedgerConfig::default(),
        }
    }
}

impl CliConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Resolve configuration: an explicit file must exist; otherwise
    /// `vtl.toml` is used when present, else defaults. `data_dir` overrides
    /// whatever the file says.
    pub fn resolve(explicit: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(dir) = data_dir {
            config.data_dir = dir.to_path_buf();
        }
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtl_ledger::CorruptPolicy;

    #[test]
    fn default_config() {
        let c = CliConfig::default();
        assert_eq!(c.data_dir, PathBuf::from(".vtl"));
        assert_eq!(c.ledger.storage_key, "simple_chain_qr");
        assert_eq!(c.ledger.on_corrupt, CorruptPolicy::StartFresh);
    }

    #[test]
    fn parse_full_file() {
        let c = CliConfig::from_toml(
            r#"
            data_dir = "/var/lib/vtl"
            storage_key = "farm_7"
            on_corrupt = "fail"
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/vtl"));
        assert_eq!(c.ledger.storage_key, "farm_7");
        assert_eq!(c.ledger.on_corrupt, CorruptPolicy::Fail);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = CliConfig::from_toml("on_corrupt = \"fail\"").unwrap();
        assert_eq!(c.data_dir, PathBuf::from(".vtl"));
        assert_eq!(c.ledger.storage_key, "simple_chain_qr");
    }

    #[test]
    fn bad_policy_rejected() {
        assert!(CliConfig::from_toml("on_corrupt = \"ignore\"").is_err());
    }

    #[test]
    fn explicit_file_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "data_dir = \"from-file\"\nstorage_key = \"k\"").unwrap();

        let c = CliConfig::resolve(Some(&path), None).unwrap();
        assert_eq!(c.data_dir, PathBuf::from("from-file"));

        let c = CliConfig::resolve(Some(&path), Some(Path::new("flag"))).unwrap();
        assert_eq!(c.data_dir, PathBuf::from("flag"));
        assert_eq!(c.ledger.storage_key, "k");
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::resolve(Some(&dir.path().join("nope.toml")), None).is_err());
    }
}
