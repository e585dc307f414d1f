//! Wireless interface descriptors

use std::fmt;

use serde::Serialize;
use uuid::Uuid;
use wlanapi::layout::{interface_info, WLAN_MAX_NAME_LENGTH};

use crate::dot11::native_enum;
use crate::record::{list_records, RecordReader};
use crate::Result;

native_enum! {
    /// `WLAN_INTERFACE_STATE`
    pub enum InterfaceState ("interface state") {
        NotReady = 0 => "wlan_interface_state_not_ready", "not-ready";
        Connected = 1 => "wlan_interface_state_connected", "connected";
        AdHocNetworkFormed = 2 => "wlan_interface_state_ad_hoc_network_formed", "ad-hoc-network-formed";
        Disconnecting = 3 => "wlan_interface_state_disconnecting", "disconnecting";
        Disconnected = 4 => "wlan_interface_state_disconnected", "disconnected";
        Associating = 5 => "wlan_interface_state_associating", "associating";
        Discovering = 6 => "wlan_interface_state_discovering", "discovering";
        Authenticating = 7 => "wlan_interface_state_authenticating", "authenticating";
    }
}

/// One wireless adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WirelessInterface {
    pub guid: Uuid,
    pub description: String,
    pub state: InterfaceState,
}

impl WirelessInterface {
    /// Project a `WLAN_INTERFACE_INFO` record
    pub fn from_record(record: &[u8]) -> Result<Self> {
        let reader = RecordReader::new("WLAN_INTERFACE_INFO", record, interface_info::SIZE)?;
        let guid = Uuid::from_bytes_le(reader.array(interface_info::GUID)?);
        let description = reader.wide_string(interface_info::DESCRIPTION, WLAN_MAX_NAME_LENGTH)?;
        let state = InterfaceState::from_raw(reader.u32(interface_info::STATE)?)?;

        Ok(Self {
            guid,
            description,
            state,
        })
    }

    /// GUID in registry form, `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`
    pub fn guid_string(&self) -> String {
        format!("{{{}}}", self.guid.hyphenated().to_string().to_uppercase())
    }
}

impl fmt::Display for WirelessInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "GUID: {}", self.guid_string())?;
        write!(f, "State: {}", self.state)
    }
}

/// Project a `WLAN_INTERFACE_INFO_LIST`
pub fn parse_interface_list(buffer: &[u8]) -> Result<Vec<WirelessInterface>> {
    list_records("WLAN_INTERFACE_INFO_LIST", buffer, interface_info::SIZE)?
        .into_iter()
        .map(WirelessInterface::from_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WifiError;
    use wlanapi::mock::{interface_list, InterfaceRecord};

    fn record(state: u32) -> InterfaceRecord {
        InterfaceRecord {
            guid: Uuid::parse_str("3f0f1b8e-5d6a-4c2b-9a7e-0123456789ab").unwrap(),
            description: "Intel(R) Wi-Fi 6 AX201 160MHz".to_string(),
            state,
        }
    }

    #[test]
    fn test_parse_interface() {
        let interfaces = parse_interface_list(&interface_list(&[record(1)])).unwrap();
        assert_eq!(interfaces.len(), 1);
        let iface = &interfaces[0];
        assert_eq!(iface.description, "Intel(R) Wi-Fi 6 AX201 160MHz");
        assert_eq!(iface.state, InterfaceState::Connected);
        assert_eq!(iface.guid_string(), "{3F0F1B8E-5D6A-4C2B-9A7E-0123456789AB}");
    }

    #[test]
    fn test_unknown_state() {
        let err = parse_interface_list(&interface_list(&[record(42)])).unwrap_err();
        assert!(matches!(
            err,
            WifiError::UnknownEnumValue { field: "interface state", raw: 42 }
        ));
    }

    #[test]
    fn test_display() {
        let iface = WirelessInterface::from_record(&record(4).encode()).unwrap();
        assert_eq!(
            iface.to_string(),
            "Description: Intel(R) Wi-Fi 6 AX201 160MHz\n\
             GUID: {3F0F1B8E-5D6A-4C2B-9A7E-0123456789AB}\n\
             State: wlan_interface_state_disconnected"
        );
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_interface_list(&interface_list(&[])).unwrap().is_empty());
        assert!(parse_interface_list(&[0u8; 4]).is_err());
    }
}
