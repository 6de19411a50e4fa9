// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Shuffle layer configuration

use std::collections::HashMap;
use std::result;
use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::error::{Result, ShuffleError};

/// Prefix shared by all configuration keys of the shuffle layer.
pub const RSS_CONFIG_PREFIX: &str = "rss";
/// Whether shuffle data is pushed row-based rather than as columnar batches.
pub const RSS_ROW_BASED: &str = "rss.row.based";
/// Maximum number of bytes pushed to the remote shuffle service per request.
pub const RSS_WRITER_BUFFER_SIZE: &str = "rss.writer.buffer.size";

/// Result of parsing a single configuration value.
pub type ParseResult<T> = result::Result<T, String>;

/// Value types a configuration entry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    /// `true`/`false` flag.
    Boolean,
    /// Unsigned integer.
    UInt64,
    /// Arbitrary string.
    Utf8,
}

static CONFIG_ENTRIES: LazyLock<HashMap<String, ConfigEntry>> = LazyLock::new(|| {
    let entries = vec![
        ConfigEntry::new(
            RSS_ROW_BASED.to_string(),
            "Push shuffle data row-based instead of as columnar batches".to_string(),
            ConfigType::Boolean,
            None,
        ),
        ConfigEntry::new(
            RSS_WRITER_BUFFER_SIZE.to_string(),
            "Maximum bytes per push request to the remote shuffle service".to_string(),
            ConfigType::UInt64,
            Some((3 * 1024 * 1024).to_string()),
        ),
    ];
    entries
        .into_iter()
        .map(|e| (e.name.clone(), e))
        .collect::<HashMap<_, _>>()
});

/// Configuration option meta-data
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    name: String,
    #[allow(dead_code)]
    description: String,
    data_type: ConfigType,
    default_value: Option<String>,
}

impl ConfigEntry {
    fn new(
        name: String,
        description: String,
        data_type: ConfigType,
        default_value: Option<String>,
    ) -> Self {
        Self {
            name,
            description,
            data_type,
            default_value,
        }
    }
}

/// Shuffle layer configuration.
///
/// Settings are stored as strings and validated against the known entry
/// table. The dispatcher applies a per-call set-if-missing on
/// [`RSS_ROW_BASED`], so the settings map is behind a lock and all mutation
/// goes through `&self`.
#[derive(Debug)]
pub struct ShuffleConfig {
    settings: RwLock<HashMap<String, String>>,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self::with_settings(HashMap::new()).unwrap()
    }
}

impl ShuffleConfig {
    /// Create a new configuration based on key-value pairs
    pub fn with_settings(settings: HashMap<String, String>) -> Result<Self> {
        let supported_entries = ShuffleConfig::valid_entries();
        for (name, entry) in supported_entries {
            if let Some(v) = settings.get(name) {
                // validate that we can parse the user-supplied value
                Self::parse_value(v.as_str(), entry.data_type).map_err(|e| {
                    ShuffleError::Configuration(format!(
                        "Failed to parse user-supplied value '{v}' for configuration setting '{name}': {e}"
                    ))
                })?;
            } else if let Some(v) = entry.default_value.clone() {
                Self::parse_value(v.as_str(), entry.data_type).map_err(|e| {
                    ShuffleError::Configuration(format!(
                        "Failed to parse default value '{v}' for configuration setting '{name}': {e}"
                    ))
                })?;
            }
        }

        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    /// Validates that a value parses as the given configuration type.
    pub fn parse_value(val: &str, data_type: ConfigType) -> ParseResult<()> {
        match data_type {
            ConfigType::UInt64 => {
                val.parse::<usize>().map_err(|e| format!("{e:?}"))?;
            }
            ConfigType::Boolean => {
                val.parse::<bool>().map_err(|e| format!("{e:?}"))?;
            }
            ConfigType::Utf8 => {
                // any string is valid
            }
        }

        Ok(())
    }

    /// All available configuration options
    pub fn valid_entries() -> &'static HashMap<String, ConfigEntry> {
        &CONFIG_ENTRIES
    }

    /// Returns the current value of a setting, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.settings.read().get(key).cloned()
    }

    /// Sets a known configuration key, overwriting any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = Self::checked_entry(key)?;
        Self::parse_value(value, entry.data_type).map_err(|e| {
            ShuffleError::Configuration(format!(
                "Failed to parse value '{value}' for configuration setting '{key}': {e}"
            ))
        })?;
        self.settings
            .write()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    /// Sets a known configuration key only if it has no value yet.
    ///
    /// Returns `true` if the value was inserted by this call. An explicit
    /// value already present is never overwritten.
    pub fn set_if_missing(&self, key: &str, value: &str) -> Result<bool> {
        let entry = Self::checked_entry(key)?;
        Self::parse_value(value, entry.data_type).map_err(|e| {
            ShuffleError::Configuration(format!(
                "Failed to parse value '{value}' for configuration setting '{key}': {e}"
            ))
        })?;
        let mut settings = self.settings.write();
        if settings.contains_key(key) {
            return Ok(false);
        }
        settings.insert(key.to_owned(), value.to_owned());
        Ok(true)
    }

    /// Whether shuffle data is pushed row-based.
    pub fn row_based(&self) -> bool {
        self.settings
            .read()
            .get(RSS_ROW_BASED)
            // infallible because we validate all configs on insertion
            .map(|v| v.parse::<bool>().unwrap())
            .unwrap_or(false)
    }

    /// Maximum bytes per push request to the remote shuffle service.
    pub fn writer_buffer_size(&self) -> usize {
        self.get_usize_setting(RSS_WRITER_BUFFER_SIZE)
    }

    fn checked_entry(key: &str) -> Result<&'static ConfigEntry> {
        Self::valid_entries().get(key).ok_or_else(|| {
            ShuffleError::Configuration(format!(
                "configuration key '{key}' does not exist"
            ))
        })
    }

    fn get_usize_setting(&self, key: &str) -> usize {
        if let Some(v) = self.settings.read().get(key) {
            // infallible because we validate all configs on insertion
            v.parse().unwrap()
        } else {
            let entries = Self::valid_entries();
            // infallible because every entry resolved this way has a default
            let v = entries.get(key).unwrap().default_value.as_ref().unwrap();
            v.parse().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() -> Result<()> {
        let config = ShuffleConfig::default();
        assert_eq!(3 * 1024 * 1024, config.writer_buffer_size());
        assert!(!config.row_based());
        assert!(config.get(RSS_ROW_BASED).is_none());
        Ok(())
    }

    #[test]
    fn set_if_missing_inserts_once() -> Result<()> {
        let config = ShuffleConfig::default();
        assert!(config.set_if_missing(RSS_ROW_BASED, "false")?);
        assert!(!config.set_if_missing(RSS_ROW_BASED, "true")?);
        assert_eq!(Some("false".to_string()), config.get(RSS_ROW_BASED));
        Ok(())
    }

    #[test]
    fn set_if_missing_keeps_explicit_value() -> Result<()> {
        let config = ShuffleConfig::default();
        config.set(RSS_ROW_BASED, "true")?;
        assert!(!config.set_if_missing(RSS_ROW_BASED, "false")?);
        assert!(config.row_based());
        Ok(())
    }

    #[test]
    fn unknown_key_is_rejected() {
        let config = ShuffleConfig::default();
        let result = config.set("rss.no.such.key", "1");
        assert!(matches!(result, Err(ShuffleError::Configuration(_))));
    }

    #[test]
    fn invalid_value_is_rejected() {
        let settings = HashMap::from([(RSS_ROW_BASED.to_string(), "maybe".to_string())]);
        assert!(ShuffleConfig::with_settings(settings).is_err());
    }
}
