//! Stored profile descriptors

use std::fmt;

use serde::Serialize;
use wlanapi::layout::{profile_info, WLAN_MAX_NAME_LENGTH};
use wlanapi::ProfileDocument;

use crate::record::{list_records, RecordReader};
use crate::Result;

/// `WLAN_PROFILE_*` flags
pub mod flags {
    pub const GROUP_POLICY: u32 = 0x1;
    pub const USER: u32 = 0x2;
    pub const GET_PLAINTEXT_KEY: u32 = 0x4;
}

/// `WLAN_*_ACCESS` rights granted on a profile
pub mod access {
    pub const READ: u32 = 0x0002_0001;
    pub const EXECUTE: u32 = 0x0002_0021;
    pub const WRITE: u32 = 0x0007_0023;
}

/// Name and flags of a stored profile, before its document is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfo {
    pub name: String,
    pub flags: u32,
}

impl ProfileInfo {
    /// Project a `WLAN_PROFILE_INFO` record
    pub fn from_record(record: &[u8]) -> Result<Self> {
        let reader = RecordReader::new("WLAN_PROFILE_INFO", record, profile_info::SIZE)?;
        Ok(Self {
            name: reader.wide_string(profile_info::PROFILE_NAME, WLAN_MAX_NAME_LENGTH)?,
            flags: reader.u32(profile_info::FLAGS)?,
        })
    }
}

/// Project a `WLAN_PROFILE_INFO_LIST`
pub fn parse_profile_list(buffer: &[u8]) -> Result<Vec<ProfileInfo>> {
    list_records("WLAN_PROFILE_INFO_LIST", buffer, profile_info::SIZE)?
        .into_iter()
        .map(ProfileInfo::from_record)
        .collect()
}

/// A stored profile with its XML document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WirelessProfile {
    pub name: String,
    pub flags: u32,
    /// Profile document, treated as opaque text
    pub xml: String,
    pub document_flags: u32,
    pub granted_access: u32,
}

impl WirelessProfile {
    pub fn new(name: impl Into<String>, flags: u32, document: ProfileDocument) -> Self {
        Self {
            name: name.into(),
            flags,
            xml: document.xml,
            document_flags: document.flags,
            granted_access: document.granted_access,
        }
    }

    pub fn is_group_policy(&self) -> bool {
        self.flags & flags::GROUP_POLICY != 0
    }

    /// Per-user rather than all-user profile
    pub fn is_per_user(&self) -> bool {
        self.flags & flags::USER != 0
    }

    pub fn can_write(&self) -> bool {
        self.granted_access & access::WRITE == access::WRITE
    }
}

impl fmt::Display for WirelessProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Profile Name: {}", self.name)?;
        writeln!(f, "Flags: {}", self.flags)?;
        writeln!(f, "XML:")?;
        f.write_str(&self.xml)
    }
}
