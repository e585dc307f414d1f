//! # winwifi - typed access to the Windows Native Wifi API
//!
//! Interface enumeration, BSS scanning, available-network listing, stored
//! profiles, connect/disconnect and interface queries, built on top of the
//! raw result buffers returned by a [`wlanapi::WlanApi`] backend.
//!
//! ## Architecture
//!
//! - `ie`: Information Element decoding
//! - `record`: bounds-checked views over native records and lists
//! - `dot11`: 802.11 enumerations, MAC addresses and SSIDs
//! - `bss`: BSS entry projection
//! - `interface`, `network`, `profile`: fixed-layout record projection
//! - `connect`: connection parameters
//! - `opcode`: interface property queries
//! - `session`: the per-call session façade
//! - `config`: TOML configuration

pub mod bss;
pub mod config;
pub mod connect;
pub mod dot11;
pub mod ie;
pub mod interface;
pub mod network;
pub mod opcode;
pub mod profile;
pub mod record;
pub mod session;

pub use crate::{
    bss::WirelessNetworkBss,
    config::WifiConfig,
    connect::{ConnectionMode, ConnectionParameters},
    dot11::{AuthAlgorithm, BssType, CipherAlgorithm, MacAddress, PhyType, Ssid},
    ie::{InformationElement, TruncationPolicy},
    interface::{InterfaceState, WirelessInterface},
    network::WirelessNetwork,
    opcode::{InterfaceOpcode, InterfaceProperty, InterfaceQuery},
    profile::WirelessProfile,
    session::{BssFilter, WlanClient},
};

pub use wlanapi;
pub use wlanapi::{Operation, Win32Error};

use thiserror::Error;

/// Failures while walking raw native buffers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated element at offset {offset}: declares {declared} bytes, {available} available")]
    TruncatedElement {
        offset: usize,
        declared: u8,
        available: usize,
    },

    #[error("{record} record too short: need {needed} bytes, got {actual}")]
    RecordTooShort {
        record: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("Element {element_id} declares {declared} bytes but carries {actual}")]
    LengthMismatch {
        element_id: u8,
        declared: u8,
        actual: usize,
    },

    #[error("Region at offset {offset} with size {size} exceeds {len} byte record")]
    RegionOutOfBounds { offset: usize, size: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum WifiError {
    #[error("{operation} failed: {code}")]
    OperationFailed { operation: Operation, code: Win32Error },

    #[error("Unknown {field} value: {raw:#x}")]
    UnknownEnumValue { field: &'static str, raw: u32 },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid connection parameters: {0}")]
    InvalidConnection(String),

    #[error("Unknown interface opcode: {0}")]
    UnknownOpcode(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WifiError {
    /// Attribute a native status to the call that returned it
    pub fn native(operation: Operation, code: Win32Error) -> Self {
        Self::OperationFailed { operation, code }
    }
}

pub type Result<T> = std::result::Result<T, WifiError>;

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WifiError::native(Operation::Connect, Win32Error::INVALID_STATE);
        assert_eq!(err.to_string(), "WlanConnect failed: ERROR_INVALID_STATE (5023)");

        let err = WifiError::UnknownEnumValue { field: "bss type", raw: 9 };
        assert_eq!(err.to_string(), "Unknown bss type value: 0x9");
    }
}
