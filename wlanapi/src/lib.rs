//! # wlanapi - Native Wifi collaborator boundary
//!
//! Request/response access to the Windows Native Wifi API (`wlanapi.dll`).
//!
//! ## Layout
//!
//! - `api`: the [`WlanApi`] trait every backend implements
//! - `error`: native status codes and operation names
//! - `layout`: sizes and field offsets of the native records
//! - `native`: the `wlanapi.dll` backend
//! - `mock`: scripted in-memory backend and record builders
//!
//! Backends return owned copies of the native result buffers. Decoding those
//! buffers into value objects is left to the caller.

pub mod api;
pub mod error;
pub mod layout;
pub mod mock;
pub mod native;

pub use api::{BssQuery, ClientHandle, ConnectRequest, OpcodeData, ProfileDocument, WlanApi};
pub use error::{Operation, Win32Error};
pub use mock::MockWlan;
pub use native::NativeWlan;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client version for Windows XP SP2/SP3
pub const WLAN_CLIENT_VERSION_XP: u32 = 1;

/// Client version for Windows Vista and later
pub const WLAN_CLIENT_VERSION_2: u32 = 2;
