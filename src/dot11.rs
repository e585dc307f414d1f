//! 802.11 enumerations and identifiers
//!
//! Each native enumeration is a closed table: raw values without an entry
//! fail with [`WifiError::UnknownEnumValue`] instead of falling back to a
//! default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use wlanapi::layout::DOT11_SSID_MAX_LENGTH;

use crate::{Result, WifiError};

/// Declare a native enumeration with its raw value, native name and short
/// label for every variant
macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($field:literal) {
            $($variant:ident = $raw:literal => $native:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Resolve a raw native value
            pub fn from_raw(raw: u32) -> $crate::Result<Self> {
                match raw {
                    $($raw => Ok(Self::$variant),)+
                    _ => Err($crate::WifiError::UnknownEnumValue { field: $field, raw }),
                }
            }

            pub fn raw(self) -> u32 {
                match self {
                    $(Self::$variant => $raw,)+
                }
            }

            /// Native constant name
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $native,)+
                }
            }

            /// Short lowercase label
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::WifiError;

            fn from_str(s: &str) -> $crate::Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s) || v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| $crate::WifiError::InvalidParameter(format!("unknown {} '{}'", $field, s)))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use native_enum;

native_enum! {
    /// `DOT11_BSS_TYPE`
    pub enum BssType ("bss type") {
        Infrastructure = 1 => "dot11_BSS_type_infrastructure", "infrastructure";
        Independent = 2 => "dot11_BSS_type_independent", "independent";
        Any = 3 => "dot11_BSS_type_any", "any";
    }
}

native_enum! {
    /// `DOT11_PHY_TYPE`
    pub enum PhyType ("phy type") {
        Unknown = 0 => "dot11_phy_type_unknown", "unknown";
        Fhss = 1 => "dot11_phy_type_fhss", "fhss";
        Dsss = 2 => "dot11_phy_type_dsss", "dsss";
        IrBaseband = 3 => "dot11_phy_type_irbaseband", "irbaseband";
        Ofdm = 4 => "dot11_phy_type_ofdm", "ofdm";
        HrDsss = 5 => "dot11_phy_type_hrdsss", "hrdsss";
        Erp = 6 => "dot11_phy_type_erp", "erp";
        Ht = 7 => "dot11_phy_type_ht", "ht";
        Vht = 8 => "dot11_phy_type_vht", "vht";
        Dmg = 9 => "dot11_phy_type_dmg", "dmg";
        He = 10 => "dot11_phy_type_he", "he";
        Eht = 11 => "dot11_phy_type_eht", "eht";
        IhvStart = 0x8000_0000 => "dot11_phy_type_IHV_start", "ihv-start";
        IhvEnd = 0xffff_ffff => "dot11_phy_type_IHV_end", "ihv-end";
    }
}

native_enum! {
    /// `DOT11_AUTH_ALGORITHM`
    pub enum AuthAlgorithm ("auth algorithm") {
        Open = 1 => "DOT11_AUTH_ALGO_80211_OPEN", "open";
        SharedKey = 2 => "DOT11_AUTH_ALGO_80211_SHARED_KEY", "shared-key";
        Wpa = 3 => "DOT11_AUTH_ALGO_WPA", "wpa";
        WpaPsk = 4 => "DOT11_AUTH_ALGO_WPA_PSK", "wpa-psk";
        WpaNone = 5 => "DOT11_AUTH_ALGO_WPA_NONE", "wpa-none";
        Rsna = 6 => "DOT11_AUTH_ALGO_RSNA", "rsna";
        RsnaPsk = 7 => "DOT11_AUTH_ALGO_RSNA_PSK", "rsna-psk";
        Wpa3Enterprise192 = 8 => "DOT11_AUTH_ALGO_WPA3", "wpa3-ent-192";
        Wpa3Sae = 9 => "DOT11_AUTH_ALGO_WPA3_SAE", "wpa3-sae";
        Owe = 10 => "DOT11_AUTH_ALGO_OWE", "owe";
        Wpa3Enterprise = 11 => "DOT11_AUTH_ALGO_WPA3_ENT", "wpa3-ent";
        IhvStart = 0x8000_0000 => "DOT11_AUTH_ALGO_IHV_START", "ihv-start";
        IhvEnd = 0xffff_ffff => "DOT11_AUTH_ALGO_IHV_END", "ihv-end";
    }
}

native_enum! {
    /// `DOT11_CIPHER_ALGORITHM`
    pub enum CipherAlgorithm ("cipher algorithm") {
        None = 0x00 => "DOT11_CIPHER_ALGO_NONE", "none";
        Wep40 = 0x01 => "DOT11_CIPHER_ALGO_WEP40", "wep40";
        Tkip = 0x02 => "DOT11_CIPHER_ALGO_TKIP", "tkip";
        Ccmp = 0x04 => "DOT11_CIPHER_ALGO_CCMP", "ccmp";
        Wep104 = 0x05 => "DOT11_CIPHER_ALGO_WEP104", "wep104";
        Bip = 0x06 => "DOT11_CIPHER_ALGO_BIP", "bip";
        Gcmp = 0x08 => "DOT11_CIPHER_ALGO_GCMP", "gcmp";
        Gcmp256 = 0x09 => "DOT11_CIPHER_ALGO_GCMP_256", "gcmp-256";
        Ccmp256 = 0x0a => "DOT11_CIPHER_ALGO_CCMP_256", "ccmp-256";
        BipGmac128 = 0x0b => "DOT11_CIPHER_ALGO_BIP_GMAC_128", "bip-gmac-128";
        BipGmac256 = 0x0c => "DOT11_CIPHER_ALGO_BIP_GMAC_256", "bip-gmac-256";
        BipCmac256 = 0x0d => "DOT11_CIPHER_ALGO_BIP_CMAC_256", "bip-cmac-256";
        UseGroup = 0x100 => "DOT11_CIPHER_ALGO_WPA_USE_GROUP", "use-group";
        Wep = 0x101 => "DOT11_CIPHER_ALGO_WEP", "wep";
        IhvStart = 0x8000_0000 => "DOT11_CIPHER_ALGO_IHV_START", "ihv-start";
        IhvEnd = 0xffff_ffff => "DOT11_CIPHER_ALGO_IHV_END", "ihv-end";
    }
}

/// 48-bit IEEE 802 MAC address
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    /// Locally administered bit of the first octet
    pub fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl FromStr for MacAddress {
    type Err = WifiError;

    /// Accepts `:` or `-` separated hex octets
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || WifiError::InvalidParameter(format!("invalid MAC address '{}'", s));
        let parts: Vec<&str> = s.split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        Ok(Self(octets))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Network name, at most 32 arbitrary octets
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Ssid(Vec<u8>);

impl Ssid {
    pub fn new(octets: impl Into<Vec<u8>>) -> Result<Self> {
        let octets = octets.into();
        if octets.len() > DOT11_SSID_MAX_LENGTH {
            return Err(WifiError::InvalidParameter(format!(
                "SSID is {} octets, maximum is {}",
                octets.len(),
                DOT11_SSID_MAX_LENGTH
            )));
        }
        Ok(Self(octets))
    }

    /// Keep at most the first 32 octets
    pub fn truncated(octets: &[u8]) -> Self {
        Self(octets[..octets.len().min(DOT11_SSID_MAX_LENGTH)].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl FromStr for Ssid {
    type Err = WifiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.as_bytes())
    }
}

impl Serialize for Ssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ssid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Channel number for a centre frequency in kHz
pub fn channel_from_frequency(frequency_khz: u32) -> Option<u32> {
    let mhz = frequency_khz / 1000;
    match mhz {
        2484 => Some(14),
        2412..=2472 => Some((mhz - 2407) / 5),
        5955..=7115 => Some((mhz - 5950) / 5),
        5000..=5895 => Some((mhz - 5000) / 5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bssid_format() {
        let mac = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");
        assert_eq!(MacAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]).to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_mac_parse() {
        let mac: MacAddress = "aa-bb-cc-dd-ee-0f".parse().unwrap();
        assert_eq!(mac.0, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x0f]);
        assert!("aa:bb:cc".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:fff".parse::<MacAddress>().is_err());
        assert!("zz:bb:cc:dd:ee:ff".parse::<MacAddress>().is_err());
        assert!("+a:bb:cc:dd:ee:ff".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:-f".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_enum_lookup() {
        assert_eq!(BssType::from_raw(1).unwrap(), BssType::Infrastructure);
        assert_eq!(PhyType::from_raw(7).unwrap().to_string(), "dot11_phy_type_ht");
        assert_eq!(CipherAlgorithm::from_raw(0x100).unwrap(), CipherAlgorithm::UseGroup);
        assert_eq!(AuthAlgorithm::RsnaPsk.raw(), 7);
    }

    #[test]
    fn test_unknown_enum_value() {
        match BssType::from_raw(7) {
            Err(WifiError::UnknownEnumValue { field, raw }) => {
                assert_eq!(field, "bss type");
                assert_eq!(raw, 7);
            }
            other => panic!("expected UnknownEnumValue, got {:?}", other),
        }
        assert!(CipherAlgorithm::from_raw(3).is_err());
    }

    #[test]
    fn test_enum_parse() {
        assert_eq!("any".parse::<BssType>().unwrap(), BssType::Any);
        assert_eq!("DOT11_AUTH_ALGO_RSNA_PSK".parse::<AuthAlgorithm>().unwrap(), AuthAlgorithm::RsnaPsk);
        assert!("mesh".parse::<BssType>().is_err());
    }

    #[test]
    fn test_ssid() {
        assert!(Ssid::new(vec![b'a'; 33]).is_err());
        assert_eq!(Ssid::truncated(&[b'a'; 40]).len(), 32);
        assert_eq!(Ssid::new(&b"caf\xc3\xa9"[..]).unwrap().to_string(), "café");
        assert_eq!(serde_json::to_string(&Ssid::new(&b"lab"[..]).unwrap()).unwrap(), "\"lab\"");
    }

    #[test]
    fn test_channel_from_frequency() {
        assert_eq!(channel_from_frequency(2_412_000), Some(1));
        assert_eq!(channel_from_frequency(2_437_000), Some(6));
        assert_eq!(channel_from_frequency(2_484_000), Some(14));
        assert_eq!(channel_from_frequency(5_180_000), Some(36));
        assert_eq!(channel_from_frequency(5_955_000), Some(1));
        assert_eq!(channel_from_frequency(900_000), None);
    }
}
