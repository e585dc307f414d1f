//! Configuration management

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wlanapi::{WLAN_CLIENT_VERSION_2, WLAN_CLIENT_VERSION_XP};

use crate::connect::{ConnectionMode, ConnectionParameters};
use crate::dot11::{BssType, MacAddress, Ssid};
use crate::ie::TruncationPolicy;
use crate::network::list_flags;
use crate::session::ClientOptions;
use crate::{Result, WifiError};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub general: GeneralConfig,
    pub session: SessionConfig,
    pub decode: DecodeConfig,
    /// Named connection presets
    pub networks: Vec<NetworkPreset>,
    pub cli: CliConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Configuration file version
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Client version requested from `WlanOpenHandle`
    pub client_version: u32,
    /// Upper bound for one operation, in seconds
    pub timeout_secs: u64,
    /// List ad hoc profiles with the available networks
    pub include_adhoc_profiles: bool,
    /// List hidden networks that have a manual profile
    pub include_manual_hidden_profiles: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub truncation: TruncationPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Print JSON instead of text
    pub json: bool,
    /// Interface used when none is given on the command line
    pub default_interface: Option<Uuid>,
}

/// Connection mode names accepted in presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetMode {
    #[default]
    Profile,
    TemporaryProfile,
    DiscoverySecure,
    DiscoveryUnsecure,
    Auto,
}

/// A named set of connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPreset {
    pub name: String,
    #[serde(default)]
    pub mode: PresetMode,
    /// Profile name, or profile XML for a temporary profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<Ssid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bssids: Vec<MacAddress>,
    #[serde(default = "default_bss_type")]
    pub bss_type: BssType,
    #[serde(default)]
    pub flags: u32,
}

fn default_bss_type() -> BssType {
    BssType::Infrastructure
}

impl NetworkPreset {
    /// Build validated connection parameters
    pub fn to_parameters(&self) -> Result<ConnectionParameters> {
        let profile = || {
            self.profile.clone().ok_or_else(|| {
                WifiError::InvalidConnection(format!("preset '{}' needs a profile", self.name))
            })
        };
        let mode = match self.mode {
            PresetMode::Profile => ConnectionMode::Profile(profile()?),
            PresetMode::TemporaryProfile => ConnectionMode::TemporaryProfile(profile()?),
            PresetMode::DiscoverySecure => ConnectionMode::DiscoverySecure,
            PresetMode::DiscoveryUnsecure => ConnectionMode::DiscoveryUnsecure,
            PresetMode::Auto => ConnectionMode::Auto,
        };
        if mode.profile().is_none() && self.profile.is_some() {
            return Err(WifiError::InvalidConnection(format!(
                "preset '{}' sets a profile its mode does not use",
                self.name
            )));
        }
        ConnectionParameters::new(mode, self.ssid.clone(), self.bssids.clone(), self.bss_type, self.flags)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_version: WLAN_CLIENT_VERSION_2,
            timeout_secs: 30,
            include_adhoc_profiles: false,
            include_manual_hidden_profiles: false,
        }
    }
}

impl WifiConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| WifiError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WifiError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(WifiError::Config(format!(
                "Invalid log level '{}'",
                self.general.log_level
            )));
        }
        if ![WLAN_CLIENT_VERSION_XP, WLAN_CLIENT_VERSION_2].contains(&self.session.client_version) {
            return Err(WifiError::Config(format!(
                "Unsupported client version {}",
                self.session.client_version
            )));
        }
        if self.session.timeout_secs == 0 {
            return Err(WifiError::Config("Timeout must be greater than 0".to_string()));
        }

        let mut names = HashSet::new();
        for preset in &self.networks {
            if preset.name.trim().is_empty() {
                return Err(WifiError::Config("Network preset without a name".to_string()));
            }
            if !names.insert(preset.name.as_str()) {
                return Err(WifiError::Config(format!("Duplicate network preset '{}'", preset.name)));
            }
            preset
                .to_parameters()
                .map_err(|e| WifiError::Config(format!("Network preset '{}': {}", preset.name, e)))?;
        }
        Ok(())
    }

    /// Look up a preset by name
    pub fn preset(&self, name: &str) -> Option<&NetworkPreset> {
        self.networks.iter().find(|preset| preset.name == name)
    }

    /// Options for [`crate::WlanClient`]
    pub fn client_options(&self) -> ClientOptions {
        let mut available_network_flags = 0;
        if self.session.include_adhoc_profiles {
            available_network_flags |= list_flags::INCLUDE_ALL_ADHOC_PROFILES;
        }
        if self.session.include_manual_hidden_profiles {
            available_network_flags |= list_flags::INCLUDE_ALL_MANUAL_HIDDEN_PROFILES;
        }
        ClientOptions {
            client_version: self.session.client_version,
            truncation: self.decode.truncation,
            available_network_flags,
        }
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(name: &str) -> NetworkPreset {
        NetworkPreset {
            name: name.to_string(),
            mode: PresetMode::Profile,
            profile: Some(name.to_string()),
            ssid: None,
            bssids: Vec::new(),
            bss_type: BssType::Infrastructure,
            flags: 0,
        }
    }

    #[test]
    fn test_default_config() {
        let config = WifiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.client_version, 2);
        assert_eq!(config.decode.truncation, TruncationPolicy::Reject);
        assert_eq!(config.client_options(), ClientOptions::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = WifiConfig::default();
        config.decode.truncation = TruncationPolicy::Clamp;
        config.session.include_manual_hidden_profiles = true;
        config.networks.push(NetworkPreset {
            mode: PresetMode::DiscoverySecure,
            profile: None,
            ssid: Some("cafe".parse().unwrap()),
            bssids: vec!["00:11:22:33:44:55".parse().unwrap()],
            ..preset("cafe")
        });
        config.cli.default_interface = Some(Uuid::nil());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: WifiConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.client_options().available_network_flags, 2);
        assert_eq!(parsed.client_options().truncation, TruncationPolicy::Clamp);
    }

    #[test]
    fn test_partial_file() {
        let config: WifiConfig = toml::from_str(
            r#"
            [decode]
            truncation = "clamp"

            [[networks]]
            name = "home"
            profile = "home"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.decode.truncation, TruncationPolicy::Clamp);
        assert_eq!(config.preset("home").unwrap().bss_type, BssType::Infrastructure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = WifiConfig::default();
        config.general.log_level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = WifiConfig::default();
        config.session.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = WifiConfig::default();
        config.session.client_version = 3;
        assert!(config.validate().is_err());

        let mut config = WifiConfig::default();
        config.networks = vec![preset("home"), preset("home")];
        assert!(config.validate().is_err());

        let mut config = WifiConfig::default();
        config.networks = vec![NetworkPreset { profile: None, ..preset("home") }];
        assert!(matches!(config.validate(), Err(WifiError::Config(_))));
    }

    #[test]
    fn test_preset_rejects_unused_profile() {
        let preset = NetworkPreset {
            mode: PresetMode::Auto,
            ..preset("auto")
        };
        assert!(matches!(preset.to_parameters(), Err(WifiError::InvalidConnection(_))));
    }
}
