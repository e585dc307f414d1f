//! Available-network descriptors

use std::fmt;

use serde::Serialize;
use wlanapi::layout::{available_network as layout, WLAN_MAX_NAME_LENGTH};

use crate::dot11::{AuthAlgorithm, BssType, CipherAlgorithm, PhyType, Ssid};
use crate::record::{list_records, RecordReader};
use crate::Result;

/// `WLAN_AVAILABLE_NETWORK_*` flags
pub mod flags {
    pub const CONNECTED: u32 = 0x1;
    pub const HAS_PROFILE: u32 = 0x2;
    pub const CONSOLE_USER_PROFILE: u32 = 0x4;
    pub const INTERWORKING_SUPPORTED: u32 = 0x8;
    pub const HOTSPOT2_ENABLED: u32 = 0x10;
    pub const ANQP_SUPPORTED: u32 = 0x20;
    pub const HOTSPOT2_DOMAIN: u32 = 0x40;
    pub const HOTSPOT2_ROAMING: u32 = 0x80;
    pub const AUTO_CONNECT_FAILED: u32 = 0x100;
}

/// Flags accepted by `WlanGetAvailableNetworkList`
pub mod list_flags {
    pub const INCLUDE_ALL_ADHOC_PROFILES: u32 = 0x1;
    pub const INCLUDE_ALL_MANUAL_HIDDEN_PROFILES: u32 = 0x2;
}

/// One network as seen by the autoconfiguration service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WirelessNetwork {
    pub ssid: Ssid,
    /// Empty when no profile is associated
    pub profile_name: String,
    pub bss_type: BssType,
    pub number_of_bssids: u32,
    pub connectable: bool,
    /// `WLAN_REASON_CODE`, zero when connectable
    pub not_connectable_reason: u32,
    pub number_of_phy_types: u32,
    pub phy_types: Vec<PhyType>,
    pub more_phy_types: bool,
    /// Percentage, 0 to 100
    pub signal_quality: u32,
    pub security_enabled: bool,
    pub auth_algorithm: AuthAlgorithm,
    pub cipher_algorithm: CipherAlgorithm,
    pub flags: u32,
}

impl WirelessNetwork {
    /// Project a `WLAN_AVAILABLE_NETWORK` record
    pub fn from_record(record: &[u8]) -> Result<Self> {
        let reader = RecordReader::new("WLAN_AVAILABLE_NETWORK", record, layout::SIZE)?;

        let number_of_phy_types = reader.u32(layout::NUMBER_OF_PHY_TYPES)?;
        let phy_types = (0..(number_of_phy_types as usize).min(layout::MAX_PHY_TYPES))
            .map(|i| PhyType::from_raw(reader.u32(layout::PHY_TYPES + i * 4)?))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            ssid: Ssid::truncated(reader.ssid(layout::SSID)?),
            profile_name: reader.wide_string(layout::PROFILE_NAME, WLAN_MAX_NAME_LENGTH)?,
            bss_type: BssType::from_raw(reader.u32(layout::BSS_TYPE)?)?,
            number_of_bssids: reader.u32(layout::NUMBER_OF_BSSIDS)?,
            connectable: reader.bool(layout::CONNECTABLE)?,
            not_connectable_reason: reader.u32(layout::NOT_CONNECTABLE_REASON)?,
            number_of_phy_types,
            phy_types,
            more_phy_types: reader.bool(layout::MORE_PHY_TYPES)?,
            signal_quality: reader.u32(layout::SIGNAL_QUALITY)?,
            security_enabled: reader.bool(layout::SECURITY_ENABLED)?,
            auth_algorithm: AuthAlgorithm::from_raw(reader.u32(layout::DEFAULT_AUTH_ALGORITHM)?)?,
            cipher_algorithm: CipherAlgorithm::from_raw(reader.u32(layout::DEFAULT_CIPHER_ALGORITHM)?)?,
            flags: reader.u32(layout::FLAGS)?,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.flags & flags::CONNECTED != 0
    }

    pub fn has_profile(&self) -> bool {
        self.flags & flags::HAS_PROFILE != 0
    }
}

impl fmt::Display for WirelessNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = if self.profile_name.is_empty() {
            "<No Profile>"
        } else {
            &self.profile_name
        };
        writeln!(f, "Profile Name: {}", profile)?;
        writeln!(f, "SSID: {}", self.ssid)?;
        writeln!(f, "BSS Type: {}", self.bss_type)?;
        writeln!(f, "Number of BSSIDs: {}", self.number_of_bssids)?;
        writeln!(f, "Connectable: {}", self.connectable)?;
        writeln!(f, "Number of PHY types: {}", self.number_of_phy_types)?;
        writeln!(f, "Signal Quality: {}%", self.signal_quality)?;
        writeln!(f, "Security Enabled: {}", self.security_enabled)?;
        writeln!(f, "Authentication: {}", self.auth_algorithm)?;
        writeln!(f, "Cipher: {}", self.cipher_algorithm)?;
        write!(f, "Flags: {}", self.flags)
    }
}

/// Project a `WLAN_AVAILABLE_NETWORK_LIST`
pub fn parse_network_list(buffer: &[u8]) -> Result<Vec<WirelessNetwork>> {
    list_records("WLAN_AVAILABLE_NETWORK_LIST", buffer, layout::SIZE)?
        .into_iter()
        .map(WirelessNetwork::from_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WifiError;
    use wlanapi::mock::{network_list, NetworkRecord};

    fn secured() -> NetworkRecord {
        NetworkRecord {
            profile_name: "office".to_string(),
            ssid: b"office-5g".to_vec(),
            number_of_bssids: 3,
            phy_types: vec![8, 10],
            signal_quality: 87,
            security_enabled: true,
            auth_algorithm: 7,
            cipher_algorithm: 4,
            flags: flags::CONNECTED | flags::HAS_PROFILE,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_network() {
        let networks = parse_network_list(&network_list(&[secured(), NetworkRecord::default()])).unwrap();
        assert_eq!(networks.len(), 2);

        let office = &networks[0];
        assert_eq!(office.ssid.to_string(), "office-5g");
        assert_eq!(office.profile_name, "office");
        assert_eq!(office.bss_type, BssType::Infrastructure);
        assert_eq!(office.phy_types, vec![PhyType::Vht, PhyType::He]);
        assert_eq!(office.auth_algorithm, AuthAlgorithm::RsnaPsk);
        assert_eq!(office.cipher_algorithm, CipherAlgorithm::Ccmp);
        assert!(office.is_connected());
        assert!(office.has_profile());
        assert!(!networks[1].has_profile());
    }

    #[test]
    fn test_unknown_auth_algorithm() {
        let record = NetworkRecord {
            auth_algorithm: 0x42,
            ..Default::default()
        };
        assert!(matches!(
            parse_network_list(&network_list(&[record])),
            Err(WifiError::UnknownEnumValue { field: "auth algorithm", raw: 0x42 })
        ));
    }

    #[test]
    fn test_display_without_profile() {
        let network = WirelessNetwork::from_record(&NetworkRecord::default().encode()).unwrap();
        let text = network.to_string();
        assert!(text.starts_with("Profile Name: <No Profile>\n"));
        assert!(text.contains("Signal Quality: 0%\n"));
        assert!(text.ends_with("Flags: 0"));
    }
}
