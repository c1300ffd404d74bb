use serde::Deserialize;
use std::{fs, path::Path};

pub const CONFIG_ENV_VAR: &str = "USAGE_COSTING_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "usage-costing.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Rows buffered between the file reader and the reconstructor.
    pub channel_capacity: usize,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> u8 {
        // Checked ASCII in `AppConfig::validate`.
        self.delimiter as u8
    }
}

impl AppConfig {
    /// Reads the file named by `USAGE_COSTING_CONFIG`, falling back to
    /// `usage-costing.toml`. Only the fallback may be absent.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => {
                tracing::debug!(path = DEFAULT_CONFIG_PATH, "no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source.channel_capacity == 0 {
            anyhow::bail!("source.channel_capacity must be at least 1");
        }
        if !self.source.delimiter.is_ascii() || self.source.delimiter == '"' {
            anyhow::bail!(
                "source.delimiter must be a single ASCII character other than '\"', got {:?}",
                self.source.delimiter
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.source.channel_capacity, 1024);
        assert_eq!(cfg.source.delimiter_byte(), b',');
        assert!(!cfg.output.pretty);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [source]
            channel_capacity = 16
            delimiter = "|"

            [output]
            pretty = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.source.channel_capacity, 16);
        assert_eq!(cfg.source.delimiter_byte(), b'|');
        assert!(cfg.output.pretty);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AppConfig::from_toml("[source]\nchannel_capacity = 0").is_err());
        assert!(AppConfig::from_toml("[source]\ndelimiter = \"é\"").is_err());
        assert!(AppConfig::from_toml("[source]\nchannel_capacity = \"many\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(AppConfig::from_file("/definitely/not/usage-costing.toml").is_err());
    }
}
