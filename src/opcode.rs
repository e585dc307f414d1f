//! Interface property queries
//!
//! Opcodes are looked up by name, with or without the `wlan_intf_opcode_`
//! prefix. Results are decoded for the opcodes whose payload layout is
//! known and kept as raw bytes for the rest.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use wlanapi::layout::{connection_attributes as conn, radio_state, WLAN_MAX_NAME_LENGTH};
use wlanapi::OpcodeData;

use crate::dot11::{native_enum, AuthAlgorithm, BssType, CipherAlgorithm, MacAddress, PhyType, Ssid};
use crate::interface::InterfaceState;
use crate::record::RecordReader;
use crate::{Result, WifiError};

/// Prefix of the native opcode names
pub const OPCODE_PREFIX: &str = "wlan_intf_opcode_";

native_enum! {
    /// `WLAN_INTF_OPCODE`
    pub enum InterfaceOpcode ("interface opcode") {
        AutoconfStart = 0x0000_0000 => "wlan_intf_opcode_autoconf_start", "autoconf_start";
        AutoconfEnabled = 0x0000_0001 => "wlan_intf_opcode_autoconf_enabled", "autoconf_enabled";
        BackgroundScanEnabled = 0x0000_0002 => "wlan_intf_opcode_background_scan_enabled", "background_scan_enabled";
        MediaStreamingMode = 0x0000_0003 => "wlan_intf_opcode_media_streaming_mode", "media_streaming_mode";
        RadioState = 0x0000_0004 => "wlan_intf_opcode_radio_state", "radio_state";
        BssType = 0x0000_0005 => "wlan_intf_opcode_bss_type", "bss_type";
        InterfaceState = 0x0000_0006 => "wlan_intf_opcode_interface_state", "interface_state";
        CurrentConnection = 0x0000_0007 => "wlan_intf_opcode_current_connection", "current_connection";
        ChannelNumber = 0x0000_0008 => "wlan_intf_opcode_channel_number", "channel_number";
        SupportedInfrastructureAuthCipherPairs = 0x0000_0009
            => "wlan_intf_opcode_supported_infrastructure_auth_cipher_pairs", "supported_infrastructure_auth_cipher_pairs";
        SupportedAdhocAuthCipherPairs = 0x0000_000a
            => "wlan_intf_opcode_supported_adhoc_auth_cipher_pairs", "supported_adhoc_auth_cipher_pairs";
        SupportedCountryOrRegionStringList = 0x0000_000b
            => "wlan_intf_opcode_supported_country_or_region_string_list", "supported_country_or_region_string_list";
        CurrentOperationMode = 0x0000_000c => "wlan_intf_opcode_current_operation_mode", "current_operation_mode";
        SupportedSafeMode = 0x0000_000d => "wlan_intf_opcode_supported_safe_mode", "supported_safe_mode";
        CertifiedSafeMode = 0x0000_000e => "wlan_intf_opcode_certified_safe_mode", "certified_safe_mode";
        HostedNetworkCapable = 0x0000_000f => "wlan_intf_opcode_hosted_network_capable", "hosted_network_capable";
        ManagementFrameProtectionCapable = 0x0000_0010
            => "wlan_intf_opcode_management_frame_protection_capable", "management_frame_protection_capable";
        AutoconfEnd = 0x0fff_ffff => "wlan_intf_opcode_autoconf_end", "autoconf_end";
        MsmStart = 0x1000_0100 => "wlan_intf_opcode_msm_start", "msm_start";
        Statistics = 0x1000_0101 => "wlan_intf_opcode_statistics", "statistics";
        Rssi = 0x1000_0102 => "wlan_intf_opcode_rssi", "rssi";
        MsmEnd = 0x1fff_ffff => "wlan_intf_opcode_msm_end", "msm_end";
        SecurityStart = 0x2001_0000 => "wlan_intf_opcode_security_start", "security_start";
        SecurityEnd = 0x2fff_ffff => "wlan_intf_opcode_security_end", "security_end";
        IhvStart = 0x3000_0000 => "wlan_intf_opcode_ihv_start", "ihv_start";
        IhvEnd = 0x3fff_ffff => "wlan_intf_opcode_ihv_end", "ihv_end";
    }
}

impl InterfaceOpcode {
    /// Resolve `radio_state` or `wlan_intf_opcode_radio_state`
    pub fn from_name(name: &str) -> Result<Self> {
        let short = name.strip_prefix(OPCODE_PREFIX).unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|opcode| opcode.label() == short)
            .ok_or_else(|| WifiError::UnknownOpcode(name.to_string()))
    }
}

native_enum! {
    /// `WLAN_OPCODE_VALUE_TYPE`
    pub enum OpcodeValueType ("opcode value type") {
        QueryOnly = 0 => "wlan_opcode_value_type_query_only", "query_only";
        SetByGroupPolicy = 1 => "wlan_opcode_value_type_set_by_group_policy", "set_by_group_policy";
        SetByUser = 2 => "wlan_opcode_value_type_set_by_user", "set_by_user";
        Invalid = 3 => "wlan_opcode_value_type_invalid", "invalid";
    }
}

native_enum! {
    /// `DOT11_RADIO_STATE`
    pub enum RadioState ("radio state") {
        Unknown = 0 => "dot11_radio_state_unknown", "unknown";
        On = 1 => "dot11_radio_state_on", "on";
        Off = 2 => "dot11_radio_state_off", "off";
    }
}

/// `DOT11_OPERATION_MODE_*` bits
pub mod operation_mode {
    pub const UNKNOWN: u32 = 0x0000_0000;
    pub const STATION: u32 = 0x0000_0001;
    pub const AP: u32 = 0x0000_0002;
    pub const EXTENSIBLE_STATION: u32 = 0x0000_0004;
    pub const EXTENSIBLE_AP: u32 = 0x0000_0008;
    pub const WFD_DEVICE: u32 = 0x0000_0010;
    pub const WFD_GROUP_OWNER: u32 = 0x0000_0020;
    pub const WFD_CLIENT: u32 = 0x0000_0040;
    pub const NETWORK_MONITOR: u32 = 0x8000_0000;
}

/// Radio switches of one PHY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhyRadioState {
    pub phy_index: u32,
    pub software: RadioState,
    pub hardware: RadioState,
}

/// `WLAN_CONNECTION_ATTRIBUTES`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionAttributes {
    pub state: InterfaceState,
    /// Raw `WLAN_CONNECTION_MODE`
    pub connection_mode: u32,
    pub profile_name: String,
    pub ssid: Ssid,
    pub bss_type: BssType,
    pub bssid: MacAddress,
    pub phy_type: PhyType,
    pub phy_index: u32,
    pub signal_quality: u32,
    /// kbps
    pub rx_rate: u32,
    /// kbps
    pub tx_rate: u32,
    pub security_enabled: bool,
    pub onex_enabled: bool,
    pub auth_algorithm: AuthAlgorithm,
    pub cipher_algorithm: CipherAlgorithm,
}

impl ConnectionAttributes {
    pub fn from_record(record: &[u8]) -> Result<Self> {
        let reader = RecordReader::new("WLAN_CONNECTION_ATTRIBUTES", record, conn::SIZE)?;
        Ok(Self {
            state: InterfaceState::from_raw(reader.u32(conn::STATE)?)?,
            connection_mode: reader.u32(conn::CONNECTION_MODE)?,
            profile_name: reader.wide_string(conn::PROFILE_NAME, WLAN_MAX_NAME_LENGTH)?,
            ssid: Ssid::truncated(reader.ssid(conn::SSID)?),
            bss_type: BssType::from_raw(reader.u32(conn::BSS_TYPE)?)?,
            bssid: MacAddress(reader.array(conn::BSSID)?),
            phy_type: PhyType::from_raw(reader.u32(conn::PHY_TYPE)?)?,
            phy_index: reader.u32(conn::PHY_INDEX)?,
            signal_quality: reader.u32(conn::SIGNAL_QUALITY)?,
            rx_rate: reader.u32(conn::RX_RATE)?,
            tx_rate: reader.u32(conn::TX_RATE)?,
            security_enabled: reader.bool(conn::SECURITY_ENABLED)?,
            onex_enabled: reader.bool(conn::ONEX_ENABLED)?,
            auth_algorithm: AuthAlgorithm::from_raw(reader.u32(conn::AUTH_ALGORITHM)?)?,
            cipher_algorithm: CipherAlgorithm::from_raw(reader.u32(conn::CIPHER_ALGORITHM)?)?,
        })
    }
}

/// Decoded query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InterfaceProperty {
    Bool(bool),
    Channel(u32),
    /// dBm
    Rssi(i32),
    BssType(BssType),
    InterfaceState(InterfaceState),
    /// `DOT11_OPERATION_MODE_*` bits
    OperationMode(u32),
    RadioState(Vec<PhyRadioState>),
    CurrentConnection(Box<ConnectionAttributes>),
    Raw(Bytes),
}

impl InterfaceProperty {
    /// Decode `data` according to the payload type of `opcode`
    pub fn decode(opcode: InterfaceOpcode, data: &[u8]) -> Result<Self> {
        use InterfaceOpcode as Op;

        let reader = |size| RecordReader::new(opcode.as_str(), data, size);
        let property = match opcode {
            Op::AutoconfEnabled
            | Op::BackgroundScanEnabled
            | Op::MediaStreamingMode
            | Op::SupportedSafeMode
            | Op::CertifiedSafeMode
            | Op::HostedNetworkCapable
            | Op::ManagementFrameProtectionCapable => Self::Bool(reader(4)?.bool(0)?),
            Op::ChannelNumber => Self::Channel(reader(4)?.u32(0)?),
            Op::Rssi => Self::Rssi(reader(4)?.i32(0)?),
            Op::BssType => Self::BssType(BssType::from_raw(reader(4)?.u32(0)?)?),
            Op::InterfaceState => Self::InterfaceState(InterfaceState::from_raw(reader(4)?.u32(0)?)?),
            Op::CurrentOperationMode => Self::OperationMode(reader(4)?.u32(0)?),
            Op::RadioState => Self::RadioState(decode_radio_state(reader(4)?)?),
            Op::CurrentConnection => Self::CurrentConnection(Box::new(ConnectionAttributes::from_record(data)?)),
            _ => Self::Raw(Bytes::copy_from_slice(data)),
        };
        Ok(property)
    }
}

fn decode_radio_state(reader: RecordReader<'_>) -> Result<Vec<PhyRadioState>> {
    use radio_state::phy;

    let count = (reader.u32(radio_state::NUMBER_OF_PHYS)? as usize).min(radio_state::MAX_PHYS);
    (0..count)
        .map(|i| -> Result<PhyRadioState> {
            let base = radio_state::PHY_RADIO_STATES + i * phy::SIZE;
            Ok(PhyRadioState {
                phy_index: reader.u32(base + phy::PHY_INDEX)?,
                software: RadioState::from_raw(reader.u32(base + phy::SOFTWARE_RADIO_STATE)?)?,
                hardware: RadioState::from_raw(reader.u32(base + phy::HARDWARE_RADIO_STATE)?)?,
            })
        })
        .collect()
}

impl fmt::Display for InterfaceProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Channel(channel) => write!(f, "{}", channel),
            Self::Rssi(rssi) => write!(f, "{} dBm", rssi),
            Self::BssType(bss_type) => write!(f, "{}", bss_type),
            Self::InterfaceState(state) => write!(f, "{}", state),
            Self::OperationMode(mode) => write!(f, "{:#010x}", mode),
            Self::RadioState(phys) => {
                for (i, phy) in phys.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "PHY {}: software {}, hardware {}", phy.phy_index, phy.software, phy.hardware)?;
                }
                Ok(())
            }
            Self::CurrentConnection(attributes) => {
                writeln!(f, "State: {}", attributes.state)?;
                writeln!(f, "Profile Name: {}", attributes.profile_name)?;
                writeln!(f, "SSID: {}", attributes.ssid)?;
                writeln!(f, "BSSID: {}", attributes.bssid)?;
                writeln!(f, "Signal Quality: {}%", attributes.signal_quality)?;
                writeln!(f, "Authentication: {}", attributes.auth_algorithm)?;
                write!(f, "Cipher: {}", attributes.cipher_algorithm)
            }
            Self::Raw(data) => {
                for byte in data.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// Result of one interface query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceQuery {
    pub opcode: InterfaceOpcode,
    pub value_type: OpcodeValueType,
    pub property: InterfaceProperty,
}

impl InterfaceQuery {
    pub fn from_data(opcode: InterfaceOpcode, data: &OpcodeData) -> Result<Self> {
        Ok(Self {
            opcode,
            value_type: OpcodeValueType::from_raw(data.value_type)?,
            property: InterfaceProperty::decode(opcode, &data.data)?,
        })
    }
}

impl fmt::Display for InterfaceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.opcode.label(), self.value_type, self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wlanapi::mock::radio_state_buffer;

    #[test]
    fn test_opcode_names() {
        assert_eq!(InterfaceOpcode::from_name("radio_state").unwrap(), InterfaceOpcode::RadioState);
        assert_eq!(
            InterfaceOpcode::from_name("wlan_intf_opcode_channel_number").unwrap(),
            InterfaceOpcode::ChannelNumber
        );
        assert_eq!(InterfaceOpcode::Rssi.raw(), 0x1000_0102);
        assert!(matches!(
            InterfaceOpcode::from_name("warp_drive"),
            Err(WifiError::UnknownOpcode(name)) if name == "warp_drive"
        ));
    }

    #[test]
    fn test_scalar_properties() {
        assert_eq!(
            InterfaceProperty::decode(InterfaceOpcode::ChannelNumber, &11u32.to_le_bytes()).unwrap(),
            InterfaceProperty::Channel(11)
        );
        assert_eq!(
            InterfaceProperty::decode(InterfaceOpcode::Rssi, &(-67i32).to_le_bytes()).unwrap(),
            InterfaceProperty::Rssi(-67)
        );
        assert_eq!(
            InterfaceProperty::decode(InterfaceOpcode::AutoconfEnabled, &1u32.to_le_bytes()).unwrap(),
            InterfaceProperty::Bool(true)
        );
        assert_eq!(
            InterfaceProperty::decode(InterfaceOpcode::InterfaceState, &1u32.to_le_bytes()).unwrap(),
            InterfaceProperty::InterfaceState(InterfaceState::Connected)
        );
        assert!(InterfaceProperty::decode(InterfaceOpcode::ChannelNumber, &[1, 0]).is_err());
    }

    #[test]
    fn test_radio_state() {
        let data = radio_state_buffer(&[(0, 1, 1), (1, 2, 1)]);
        let property = InterfaceProperty::decode(InterfaceOpcode::RadioState, &data).unwrap();
        assert_eq!(
            property,
            InterfaceProperty::RadioState(vec![
                PhyRadioState { phy_index: 0, software: RadioState::On, hardware: RadioState::On },
                PhyRadioState { phy_index: 1, software: RadioState::Off, hardware: RadioState::On },
            ])
        );
        assert_eq!(
            property.to_string(),
            "PHY 0: software dot11_radio_state_on, hardware dot11_radio_state_on\n\
             PHY 1: software dot11_radio_state_off, hardware dot11_radio_state_on"
        );
    }

    #[test]
    fn test_current_connection() {
        let mut data = vec![0u8; conn::SIZE];
        data[conn::STATE] = 1;
        data[conn::PROFILE_NAME] = b'h';
        data[conn::SSID] = 1;
        data[conn::SSID + 4] = b'h';
        data[conn::BSS_TYPE] = 1;
        data[conn::BSSID..conn::BSSID + 6].copy_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        data[conn::PHY_TYPE] = 10;
        data[conn::SIGNAL_QUALITY] = 70;
        data[conn::AUTH_ALGORITHM] = 9;
        data[conn::CIPHER_ALGORITHM] = 4;

        match InterfaceProperty::decode(InterfaceOpcode::CurrentConnection, &data).unwrap() {
            InterfaceProperty::CurrentConnection(attributes) => {
                assert_eq!(attributes.profile_name, "h");
                assert_eq!(attributes.ssid.to_string(), "h");
                assert_eq!(attributes.bssid.to_string(), "00:11:22:33:44:55");
                assert_eq!(attributes.phy_type, PhyType::He);
                assert_eq!(attributes.auth_algorithm, AuthAlgorithm::Wpa3Sae);
            }
            other => panic!("unexpected property {:?}", other),
        }
    }

    #[test]
    fn test_raw_fallback() {
        let data = OpcodeData {
            data: vec![0xde, 0xad],
            value_type: 0,
        };
        let query = InterfaceQuery::from_data(InterfaceOpcode::Statistics, &data).unwrap();
        assert_eq!(query.value_type, OpcodeValueType::QueryOnly);
        assert_eq!(query.property.to_string(), "dead");
    }
}
