//! BSS entry projection
//!
//! A `WLAN_BSS_LIST` holds a fixed-stride array of `WLAN_BSS_ENTRY` records
//! followed by the raw IE data of every entry. Each entry addresses its IE
//! region relative to its own base, so an entry is projected from the bytes
//! between its base and the end of the list.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use wlanapi::layout::{bss_entry as layout, bss_list};

use crate::dot11::{channel_from_frequency, BssType, MacAddress, PhyType, Ssid};
use crate::ie::{self, element_id, InformationElement, TruncationPolicy};
use crate::record::RecordReader;
use crate::{DecodeError, Result};

/// Seconds between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_OFFSET: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;

/// Capability Information bits
pub mod capability {
    pub const ESS: u16 = 0x0001;
    pub const IBSS: u16 = 0x0002;
    pub const PRIVACY: u16 = 0x0010;
    pub const SHORT_PREAMBLE: u16 = 0x0020;
    pub const SPECTRUM_MANAGEMENT: u16 = 0x0100;
    pub const SHORT_SLOT_TIME: u16 = 0x0400;
}

/// One entry of the supported rate set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rate {
    /// In 500 kbps units
    pub units: u16,
    /// Part of the basic rate set
    pub basic: bool,
}

impl Rate {
    const BASIC: u16 = 0x8000;

    pub fn from_raw(raw: u16) -> Self {
        Self {
            units: raw & !Self::BASIC,
            basic: raw & Self::BASIC != 0,
        }
    }

    pub fn mbps(&self) -> f64 {
        f64::from(self.units) * 0.5
    }
}

/// One BSS observed by the last scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WirelessNetworkBss {
    pub ssid: Ssid,
    pub phy_id: u32,
    pub bssid: MacAddress,
    pub bss_type: BssType,
    pub phy_type: PhyType,
    /// dBm
    pub rssi: i32,
    /// Percentage, 0 to 100
    pub link_quality: u32,
    pub in_reg_domain: bool,
    /// Time units of 1024 microseconds
    pub beacon_period: u16,
    /// TSF of the last beacon or probe response
    pub timestamp: u64,
    /// Host receive time, absent when the driver does not report it
    pub host_timestamp: Option<DateTime<Utc>>,
    pub capabilities: u16,
    pub center_frequency_khz: u32,
    pub rates: Vec<Rate>,
    /// In order of appearance in the frame
    pub information_elements: Vec<InformationElement>,
}

impl WirelessNetworkBss {
    /// Project one `WLAN_BSS_ENTRY`
    ///
    /// `record` starts at the entry and runs to the end of the enclosing list.
    pub fn from_record(record: &[u8], policy: TruncationPolicy) -> Result<Self> {
        let reader = RecordReader::new("WLAN_BSS_ENTRY", record, layout::SIZE)?;

        let rate_count = (reader.u32(layout::RATE_SET_LENGTH)? as usize / 2).min(layout::MAX_RATES);
        let rates = (0..rate_count)
            .map(|i| -> Result<Rate> { Ok(Rate::from_raw(reader.u16(layout::RATE_SET + i * 2)?)) })
            .collect::<Result<Vec<_>>>()?;

        let ie_offset = reader.u32(layout::IE_OFFSET)? as usize;
        let ie_size = reader.u32(layout::IE_SIZE)? as usize;
        let raw_elements = reader.region(ie_offset, ie_size)?;
        let information_elements = ie::decode_with(raw_elements, policy)?;

        Ok(Self {
            ssid: Ssid::truncated(reader.ssid(layout::SSID)?),
            phy_id: reader.u32(layout::PHY_ID)?,
            bssid: MacAddress(reader.array(layout::BSSID)?),
            bss_type: BssType::from_raw(reader.u32(layout::BSS_TYPE)?)?,
            phy_type: PhyType::from_raw(reader.u32(layout::PHY_TYPE)?)?,
            rssi: reader.i32(layout::RSSI)?,
            link_quality: reader.u32(layout::LINK_QUALITY)?,
            in_reg_domain: reader.u8(layout::IN_REG_DOMAIN)? != 0,
            beacon_period: reader.u16(layout::BEACON_PERIOD)?,
            timestamp: reader.u64(layout::TIMESTAMP)?,
            host_timestamp: filetime_to_utc(reader.u64(layout::HOST_TIMESTAMP)?),
            capabilities: reader.u16(layout::CAPABILITY_INFORMATION)?,
            center_frequency_khz: reader.u32(layout::CH_CENTER_FREQUENCY)?,
            rates,
            information_elements,
        })
    }

    /// Channel number derived from the centre frequency
    pub fn channel(&self) -> Option<u32> {
        channel_from_frequency(self.center_frequency_khz)
    }

    pub fn has_capability(&self, bit: u16) -> bool {
        self.capabilities & bit != 0
    }

    pub fn is_ess(&self) -> bool {
        self.has_capability(capability::ESS)
    }

    pub fn is_ibss(&self) -> bool {
        self.has_capability(capability::IBSS)
    }

    pub fn privacy(&self) -> bool {
        self.has_capability(capability::PRIVACY)
    }

    pub fn short_preamble(&self) -> bool {
        self.has_capability(capability::SHORT_PREAMBLE)
    }

    pub fn short_slot_time(&self) -> bool {
        self.has_capability(capability::SHORT_SLOT_TIME)
    }

    pub fn spectrum_management(&self) -> bool {
        self.has_capability(capability::SPECTRUM_MANAGEMENT)
    }

    /// First element with the given id
    pub fn element(&self, id: u8) -> Option<&InformationElement> {
        self.information_elements.iter().find(|e| e.element_id() == id)
    }

    /// Vendor specific elements
    pub fn vendor_elements(&self) -> impl Iterator<Item = &InformationElement> {
        self.information_elements.iter().filter(|e| e.is_vendor_specific())
    }

    /// Whether the BSS advertises an RSN element
    pub fn has_rsn(&self) -> bool {
        self.element(element_id::RSN).is_some()
    }
}

impl fmt::Display for WirelessNetworkBss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BSSID: {}", self.bssid)?;
        writeln!(f, "SSID: {}", self.ssid)?;
        writeln!(f, "Link Quality: {}%", self.link_quality)?;
        writeln!(f, "BSS Type: {}", self.bss_type)?;
        writeln!(f, "PHY Type: {}", self.phy_type)?;
        writeln!(f, "Capabilities: {}", self.capabilities)?;
        writeln!(f)?;
        writeln!(f, "Information Elements:")?;
        for element in &self.information_elements {
            for line in element.to_string().lines() {
                writeln!(f, " + {}", line)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Convert a FILETIME tick count, zero meaning unset
pub fn filetime_to_utc(ticks: u64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let secs = (ticks / FILETIME_TICKS_PER_SECOND) as i64 - FILETIME_UNIX_OFFSET;
    let nanos = ((ticks % FILETIME_TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Project a whole `WLAN_BSS_LIST`
pub fn parse_bss_list(buffer: &[u8], policy: TruncationPolicy) -> Result<Vec<WirelessNetworkBss>> {
    let header = RecordReader::new("WLAN_BSS_LIST", buffer, bss_list::ENTRIES)?;
    let total_size = header.u32(bss_list::TOTAL_SIZE)? as usize;
    let count = header.u32(bss_list::NUMBER_OF_ITEMS)? as usize;

    if total_size < bss_list::ENTRIES || total_size > buffer.len() {
        return Err(DecodeError::RecordTooShort {
            record: "WLAN_BSS_LIST",
            needed: total_size.max(bss_list::ENTRIES),
            actual: buffer.len(),
        }
        .into());
    }
    let list = &buffer[..total_size];

    let mut entries = Vec::with_capacity(count.min(total_size / layout::SIZE));
    for index in 0..count {
        let base = bss_list::ENTRIES + index * layout::SIZE;
        let record = list.get(base..).ok_or(DecodeError::RecordTooShort {
            record: "WLAN_BSS_ENTRY",
            needed: layout::SIZE,
            actual: 0,
        })?;
        entries.push(WirelessNetworkBss::from_record(record, policy)?);
    }

    log::debug!("Projected {} BSS entries from {} bytes", entries.len(), total_size);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WifiError;
    use wlanapi::mock::{bss_list as encode_bss_list, BssRecord};

    fn access_point() -> BssRecord {
        BssRecord {
            ssid: b"lab".to_vec(),
            bssid: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            rssi: -48,
            link_quality: 92,
            capabilities: capability::ESS | capability::PRIVACY | capability::SHORT_SLOT_TIME,
            center_frequency_khz: 5_180_000,
            host_timestamp: 133_000_000_000_000_000,
            rates: vec![0x800c, 0x0012, 0x8018],
            ies: ie::encode(&[
                InformationElement::new(element_id::SSID, &b"lab"[..]),
                InformationElement::new(element_id::RSN, vec![0x01, 0x00]),
                InformationElement::new(element_id::VENDOR_SPECIFIC, vec![0x00, 0x50, 0xf2, 0x02]),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_project_entry() {
        let bss = parse_bss_list(&encode_bss_list(&[access_point()]), TruncationPolicy::Reject).unwrap();
        assert_eq!(bss.len(), 1);

        let ap = &bss[0];
        assert_eq!(ap.ssid.to_string(), "lab");
        assert_eq!(ap.bssid.to_string(), "00:11:22:33:44:55");
        assert_eq!(ap.bss_type, BssType::Infrastructure);
        assert_eq!(ap.phy_type, PhyType::Ht);
        assert_eq!(ap.rssi, -48);
        assert_eq!(ap.channel(), Some(36));
        assert!(ap.is_ess() && ap.privacy() && ap.short_slot_time());
        assert!(!ap.is_ibss());
        assert!(ap.has_rsn());
        assert_eq!(ap.vendor_elements().count(), 1);
        assert_eq!(
            ap.information_elements.iter().map(|e| e.element_id()).collect::<Vec<_>>(),
            vec![element_id::SSID, element_id::RSN, element_id::VENDOR_SPECIFIC]
        );
        assert_eq!(ap.rates[0], Rate { units: 12, basic: true });
        assert_eq!(ap.rates[1].mbps(), 9.0);
    }

    #[test]
    fn test_entries_share_ie_area() {
        let mut second = access_point();
        second.bssid = [0x02, 0, 0, 0, 0, 0x01];
        second.ies = ie::encode(&[InformationElement::new(element_id::SSID, &b"guest"[..])]);

        let bss = parse_bss_list(&encode_bss_list(&[access_point(), second]), TruncationPolicy::Reject).unwrap();
        assert_eq!(bss.len(), 2);
        assert_eq!(bss[0].information_elements.len(), 3);
        assert_eq!(bss[1].information_elements.len(), 1);
        assert_eq!(&bss[1].information_elements[0].body()[..], b"guest");
    }

    #[test]
    fn test_unknown_bss_type() {
        let record = BssRecord {
            bss_type: 9,
            ..Default::default()
        };
        assert!(matches!(
            parse_bss_list(&encode_bss_list(&[record]), TruncationPolicy::Reject),
            Err(WifiError::UnknownEnumValue { field: "bss type", raw: 9 })
        ));
    }

    #[test]
    fn test_ie_region_out_of_bounds() {
        let mut record = access_point().encode(layout::SIZE as u32);
        record[layout::IE_SIZE..layout::IE_SIZE + 4].copy_from_slice(&64u32.to_le_bytes());
        assert!(matches!(
            WirelessNetworkBss::from_record(&record, TruncationPolicy::Reject),
            Err(WifiError::Decode(DecodeError::RegionOutOfBounds { .. }))
        ));

        record[layout::IE_OFFSET..layout::IE_OFFSET + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(WirelessNetworkBss::from_record(&record, TruncationPolicy::Reject).is_err());
    }

    #[test]
    fn test_truncated_ie_policy() {
        let record = BssRecord {
            ies: vec![element_id::SSID, 0x01, b'x', element_id::RSN, 0x14, 0x01, 0x00],
            ..Default::default()
        };
        let buffer = encode_bss_list(&[record]);
        assert!(matches!(
            parse_bss_list(&buffer, TruncationPolicy::Reject),
            Err(WifiError::Decode(DecodeError::TruncatedElement { offset: 3, .. }))
        ));

        let bss = parse_bss_list(&buffer, TruncationPolicy::Clamp).unwrap();
        assert_eq!(bss[0].information_elements.len(), 2);
        assert_eq!(bss[0].information_elements[1].length(), 2);
    }

    #[test]
    fn test_short_buffers() {
        assert!(parse_bss_list(&[0u8; 4], TruncationPolicy::Reject).is_err());

        let mut buffer = encode_bss_list(&[access_point()]);
        buffer.truncate(100);
        assert!(matches!(
            parse_bss_list(&buffer, TruncationPolicy::Reject),
            Err(WifiError::Decode(DecodeError::RecordTooShort { record: "WLAN_BSS_LIST", .. }))
        ));
    }

    #[test]
    fn test_filetime() {
        assert_eq!(filetime_to_utc(0), None);
        let epoch = filetime_to_utc(116_444_736_000_000_000).unwrap();
        assert_eq!(epoch.timestamp(), 0);
        let later = filetime_to_utc(133_000_000_000_000_000).unwrap();
        assert_eq!(later.timestamp(), 1_655_526_400);
    }

    #[test]
    fn test_display() {
        let bss = WirelessNetworkBss::from_record(&encode_bss_list(&[access_point()])[8..], TruncationPolicy::Reject)
            .unwrap();
        let text = bss.to_string();
        assert!(text.starts_with("BSSID: 00:11:22:33:44:55\nSSID: lab\nLink Quality: 92%\n"));
        assert!(text.contains(" + Element ID: 48\n + Length: 2\n"));
    }
}
