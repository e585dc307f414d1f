//! Fixed layouts of the records returned by the Native Wifi API
//!
//! Offsets are byte offsets from the start of each record, all values are
//! little-endian. The layouts contain no pointers, so they are identical for
//! 32-bit and 64-bit processes.

/// Maximum SSID length in octets
pub const DOT11_SSID_MAX_LENGTH: usize = 32;

/// Characters in `WLAN_MAX_NAME_LENGTH` wide-string arrays
pub const WLAN_MAX_NAME_LENGTH: usize = 256;

/// `DOT11_SSID`
pub mod dot11_ssid {
    pub const LENGTH: usize = 0;
    pub const SSID: usize = 4;
    pub const SIZE: usize = 36;
}

/// Header shared by the interface, network and profile lists
pub mod list_header {
    pub const NUMBER_OF_ITEMS: usize = 0;
    pub const INDEX: usize = 4;
    pub const SIZE: usize = 8;
}

/// `WLAN_INTERFACE_INFO`
pub mod interface_info {
    pub const GUID: usize = 0;
    pub const DESCRIPTION: usize = 16;
    pub const STATE: usize = 528;
    pub const SIZE: usize = 532;
}

/// `WLAN_AVAILABLE_NETWORK`
pub mod available_network {
    pub const PROFILE_NAME: usize = 0;
    pub const SSID: usize = 512;
    pub const BSS_TYPE: usize = 548;
    pub const NUMBER_OF_BSSIDS: usize = 552;
    pub const CONNECTABLE: usize = 556;
    pub const NOT_CONNECTABLE_REASON: usize = 560;
    pub const NUMBER_OF_PHY_TYPES: usize = 564;
    pub const PHY_TYPES: usize = 568;
    pub const MAX_PHY_TYPES: usize = 8;
    pub const MORE_PHY_TYPES: usize = 600;
    pub const SIGNAL_QUALITY: usize = 604;
    pub const SECURITY_ENABLED: usize = 608;
    pub const DEFAULT_AUTH_ALGORITHM: usize = 612;
    pub const DEFAULT_CIPHER_ALGORITHM: usize = 616;
    pub const FLAGS: usize = 620;
    pub const RESERVED: usize = 624;
    pub const SIZE: usize = 628;
}

/// `WLAN_PROFILE_INFO`
pub mod profile_info {
    pub const PROFILE_NAME: usize = 0;
    pub const FLAGS: usize = 512;
    pub const SIZE: usize = 516;
}

/// `WLAN_BSS_LIST` header. Entries start at `ENTRIES`, IE data follows the
/// entry array and is addressed relative to each entry.
pub mod bss_list {
    pub const TOTAL_SIZE: usize = 0;
    pub const NUMBER_OF_ITEMS: usize = 4;
    pub const ENTRIES: usize = 8;
}

/// `WLAN_BSS_ENTRY`
pub mod bss_entry {
    pub const SSID: usize = 0;
    pub const PHY_ID: usize = 36;
    pub const BSSID: usize = 40;
    pub const BSS_TYPE: usize = 48;
    pub const PHY_TYPE: usize = 52;
    pub const RSSI: usize = 56;
    pub const LINK_QUALITY: usize = 60;
    pub const IN_REG_DOMAIN: usize = 64;
    pub const BEACON_PERIOD: usize = 66;
    pub const TIMESTAMP: usize = 72;
    pub const HOST_TIMESTAMP: usize = 80;
    pub const CAPABILITY_INFORMATION: usize = 88;
    pub const CH_CENTER_FREQUENCY: usize = 92;
    pub const RATE_SET_LENGTH: usize = 96;
    pub const RATE_SET: usize = 100;
    pub const MAX_RATES: usize = 126;
    pub const IE_OFFSET: usize = 352;
    pub const IE_SIZE: usize = 356;
    pub const SIZE: usize = 360;
}

/// `WLAN_RADIO_STATE`
pub mod radio_state {
    pub const NUMBER_OF_PHYS: usize = 0;
    pub const PHY_RADIO_STATES: usize = 4;
    pub const MAX_PHYS: usize = 64;

    /// `WLAN_PHY_RADIO_STATE`
    pub mod phy {
        pub const PHY_INDEX: usize = 0;
        pub const SOFTWARE_RADIO_STATE: usize = 4;
        pub const HARDWARE_RADIO_STATE: usize = 8;
        pub const SIZE: usize = 12;
    }
}

/// `WLAN_CONNECTION_ATTRIBUTES`, with its association and security parts
pub mod connection_attributes {
    pub const STATE: usize = 0;
    pub const CONNECTION_MODE: usize = 4;
    pub const PROFILE_NAME: usize = 8;
    pub const SSID: usize = 520;
    pub const BSS_TYPE: usize = 556;
    pub const BSSID: usize = 560;
    pub const PHY_TYPE: usize = 568;
    pub const PHY_INDEX: usize = 572;
    pub const SIGNAL_QUALITY: usize = 576;
    pub const RX_RATE: usize = 580;
    pub const TX_RATE: usize = 584;
    pub const SECURITY_ENABLED: usize = 588;
    pub const ONEX_ENABLED: usize = 592;
    pub const AUTH_ALGORITHM: usize = 596;
    pub const CIPHER_ALGORITHM: usize = 600;
    pub const SIZE: usize = 604;
}

/// Byte length of an interface, network or profile list holding `count`
/// records of `stride` bytes
pub fn list_size(count: usize, stride: usize) -> usize {
    list_header::SIZE + count * stride
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bss_entry_layout() {
        assert_eq!(bss_entry::RATE_SET + bss_entry::MAX_RATES * 2, bss_entry::IE_OFFSET);
        assert_eq!(bss_entry::SIZE % 8, 0);
        assert_eq!(dot11_ssid::SSID + DOT11_SSID_MAX_LENGTH, dot11_ssid::SIZE);
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(interface_info::DESCRIPTION + WLAN_MAX_NAME_LENGTH * 2, interface_info::STATE);
        assert_eq!(profile_info::FLAGS + 4, profile_info::SIZE);
        assert_eq!(
            available_network::PHY_TYPES + available_network::MAX_PHY_TYPES * 4,
            available_network::MORE_PHY_TYPES
        );
        assert_eq!(list_size(2, profile_info::SIZE), 8 + 1032);
        assert_eq!(
            connection_attributes::PROFILE_NAME + WLAN_MAX_NAME_LENGTH * 2,
            connection_attributes::SSID
        );
    }
}
