//! Connection parameters for `WlanConnect`
//!
//! Each connection mode carries only what it needs. Combinations the mode
//! cannot use are rejected when the parameters are built, so a value of
//! [`ConnectionParameters`] is always structurally valid.

use std::fmt;

use serde::{Deserialize, Serialize};
use wlanapi::ConnectRequest;

use crate::dot11::{BssType, MacAddress, Ssid};
use crate::{Result, WifiError};

/// `WLAN_CONNECTION_*` flags
pub mod flags {
    pub const HIDDEN_NETWORK: u32 = 0x0000_0001;
    pub const ADHOC_JOIN_ONLY: u32 = 0x0000_0002;
    pub const IGNORE_PRIVACY_BIT: u32 = 0x0000_0004;
    pub const EAPOL_PASSTHROUGH: u32 = 0x0000_0008;
    pub const PERSIST_DISCOVERY_PROFILE: u32 = 0x0000_0010;
    pub const PERSIST_DISCOVERY_PROFILE_CONNECTION_MODE_AUTO: u32 = 0x0000_0020;
    pub const PERSIST_DISCOVERY_PROFILE_OVERWRITE_EXISTING: u32 = 0x0000_0040;

    pub const ALL: u32 = HIDDEN_NETWORK
        | ADHOC_JOIN_ONLY
        | IGNORE_PRIVACY_BIT
        | EAPOL_PASSTHROUGH
        | PERSIST_DISCOVERY_PROFILE
        | PERSIST_DISCOVERY_PROFILE_CONNECTION_MODE_AUTO
        | PERSIST_DISCOVERY_PROFILE_OVERWRITE_EXISTING;
}

/// `WLAN_CONNECTION_MODE` with the data each mode uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "profile", rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Connect with a stored profile, by name
    Profile(String),
    /// Connect with a profile document that is not stored
    TemporaryProfile(String),
    DiscoverySecure,
    DiscoveryUnsecure,
    Auto,
}

impl ConnectionMode {
    pub fn raw(&self) -> u32 {
        match self {
            Self::Profile(_) => 0,
            Self::TemporaryProfile(_) => 1,
            Self::DiscoverySecure => 2,
            Self::DiscoveryUnsecure => 3,
            Self::Auto => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile(_) => "wlan_connection_mode_profile",
            Self::TemporaryProfile(_) => "wlan_connection_mode_temporary_profile",
            Self::DiscoverySecure => "wlan_connection_mode_discovery_secure",
            Self::DiscoveryUnsecure => "wlan_connection_mode_discovery_unsecure",
            Self::Auto => "wlan_connection_mode_auto",
        }
    }

    pub fn is_discovery(&self) -> bool {
        matches!(self, Self::DiscoverySecure | Self::DiscoveryUnsecure)
    }

    /// Profile name or document passed as `strProfile`
    pub fn profile(&self) -> Option<&str> {
        match self {
            Self::Profile(text) | Self::TemporaryProfile(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated `WLAN_CONNECTION_PARAMETERS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionParameters {
    mode: ConnectionMode,
    ssid: Option<Ssid>,
    desired_bssids: Vec<MacAddress>,
    bss_type: BssType,
    flags: u32,
}

impl ConnectionParameters {
    pub fn new(
        mode: ConnectionMode,
        ssid: Option<Ssid>,
        desired_bssids: Vec<MacAddress>,
        bss_type: BssType,
        flags: u32,
    ) -> Result<Self> {
        let parameters = Self {
            mode,
            ssid,
            desired_bssids,
            bss_type,
            flags,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Start building parameters for `mode`
    pub fn builder(mode: ConnectionMode) -> ConnectionParametersBuilder {
        ConnectionParametersBuilder::new(mode)
    }

    /// Parameters for connecting with the stored profile `name`
    pub fn profile(name: impl Into<String>) -> Result<Self> {
        Self::builder(ConnectionMode::Profile(name.into())).build()
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(WifiError::InvalidConnection(message.to_string()));

        if let Some(profile) = self.mode.profile() {
            if profile.trim().is_empty() {
                return invalid(match self.mode {
                    ConnectionMode::Profile(_) => "profile name is empty",
                    _ => "temporary profile document is empty",
                });
            }
        }
        if self.mode.is_discovery() {
            if self.ssid.as_ref().map_or(true, Ssid::is_empty) {
                return invalid("discovery modes require an SSID");
            }
            if self.bss_type == BssType::Any {
                return invalid("discovery modes require an infrastructure or independent BSS type");
            }
        }
        if self.mode == ConnectionMode::Auto && (self.ssid.is_some() || !self.desired_bssids.is_empty()) {
            return invalid("auto mode takes neither an SSID nor BSSIDs");
        }
        if self.flags & !flags::ALL != 0 {
            return Err(WifiError::InvalidConnection(format!(
                "unknown connection flags {:#010x}",
                self.flags & !flags::ALL
            )));
        }
        if self.flags & flags::ADHOC_JOIN_ONLY != 0 && self.bss_type != BssType::Independent {
            return invalid("adhoc join only requires the independent BSS type");
        }
        Ok(())
    }

    pub fn mode(&self) -> &ConnectionMode {
        &self.mode
    }

    pub fn ssid(&self) -> Option<&Ssid> {
        self.ssid.as_ref()
    }

    pub fn desired_bssids(&self) -> &[MacAddress] {
        &self.desired_bssids
    }

    pub fn bss_type(&self) -> BssType {
        self.bss_type
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Flatten into the native request
    pub fn to_request(&self) -> ConnectRequest {
        ConnectRequest {
            mode: self.mode.raw(),
            profile: self.mode.profile().map(str::to_string),
            ssid: self.ssid.as_ref().map(|ssid| ssid.as_bytes().to_vec()),
            desired_bssids: self.desired_bssids.iter().map(|mac| mac.0).collect(),
            bss_type: self.bss_type.raw(),
            flags: self.flags,
        }
    }
}

/// Builder for [`ConnectionParameters`]
#[derive(Debug, Clone)]
pub struct ConnectionParametersBuilder {
    mode: ConnectionMode,
    ssid: Option<Ssid>,
    desired_bssids: Vec<MacAddress>,
    bss_type: BssType,
    flags: u32,
}

impl ConnectionParametersBuilder {
    pub fn new(mode: ConnectionMode) -> Self {
        Self {
            mode,
            ssid: None,
            desired_bssids: Vec::new(),
            bss_type: BssType::Infrastructure,
            flags: 0,
        }
    }

    pub fn ssid(mut self, ssid: Ssid) -> Self {
        self.ssid = Some(ssid);
        self
    }

    /// Add a desired BSSID, earlier ones are preferred
    pub fn bssid(mut self, bssid: MacAddress) -> Self {
        self.desired_bssids.push(bssid);
        self
    }

    pub fn bss_type(mut self, bss_type: BssType) -> Self {
        self.bss_type = bss_type;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }

    pub fn build(self) -> Result<ConnectionParameters> {
        ConnectionParameters::new(self.mode, self.ssid, self.desired_bssids, self.bss_type, self.flags)
    }
}
