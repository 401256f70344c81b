use std::{
    fs,
    io::{self, BufRead},
    path,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("Line parsing error: {0}")]
    LineParse(String),
    #[error("Missing config field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Read a yaml document from disk.
pub fn load_yaml(
    config_file_path: impl AsRef<path::Path>,
) -> Result<serde_yaml::Value, ConfigError> {
    let content: String = fs::read_to_string(config_file_path)?;
    let config: serde_yaml::Value = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load all lines of a text file.
pub fn load_lines(
    file_path: impl AsRef<path::Path>,
) -> Result<Vec<String>, ConfigError> {
    let file = fs::File::open(file_path)?;
    let lines = io::BufReader::new(file)
        .lines()
        .map(|l| l.map_err(|e| ConfigError::LineParse(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines)
}

pub trait Configurable {
    fn config(&self) -> &serde_yaml::Value;

    // read configuration from yaml config
    fn load_config(
        config_file_path: impl AsRef<path::Path>,
    ) -> Result<serde_yaml::Value, ConfigError> {
        load_yaml(config_file_path)
    }

    /// Load Vec<String> from file with path `file path`
    fn load_text_file_lines(
        file_path: impl AsRef<path::Path>,
    ) -> Result<Vec<String>, ConfigError> {
        load_lines(file_path)
    }

    /// Extract Value from config using dot notation i.e. "agent.version"
    fn get_config_value(&self, key: &str) -> Option<&serde_yaml::Value> {
        let keys: Vec<&str> = key.split('.').collect();
        Self::get_value_recursive(self.config(), &keys)
    }

    fn get_value_recursive<'a>(
        config: &'a serde_yaml::Value,
        keys: &[&str],
    ) -> Option<&'a serde_yaml::Value> {
        if keys.is_empty() {
            return None;
        };

        match config {
            serde_yaml::Value::Mapping(map) => {
                let key = keys[0];
                let remaining_keys = &keys[1..];

                if let Some(value) =
                    map.get(serde_yaml::Value::String(key.to_string()))
                {
                    if remaining_keys.is_empty() {
                        Some(value)
                    } else {
                        Self::get_value_recursive(value, remaining_keys)
                    }
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
