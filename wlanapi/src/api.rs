//! Request/response contract of the Native Wifi API
//!
//! Every list-returning call hands back an owned copy of the native buffer in
//! its native layout (see [`crate::layout`]). Backends release the memory the
//! API allocated before returning, so callers never hold native memory.

use uuid::Uuid;

use crate::error::Win32Error;

/// Opaque session token returned by `WlanOpenHandle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHandle(pub usize);

/// SSID / BSS type filter for `WlanGetNetworkBssList`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssQuery {
    /// Raw SSID octets, at most 32
    pub ssid: Vec<u8>,
    /// Raw `DOT11_BSS_TYPE`
    pub bss_type: u32,
    /// Only return BSS entries with security enabled
    pub security_enabled: bool,
}

/// Flattened `WLAN_CONNECTION_PARAMETERS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Raw `WLAN_CONNECTION_MODE`
    pub mode: u32,
    /// Profile name or profile XML, depending on `mode`
    pub profile: Option<String>,
    /// Raw SSID octets
    pub ssid: Option<Vec<u8>>,
    /// Desired BSSIDs, in preference order
    pub desired_bssids: Vec<[u8; 6]>,
    /// Raw `DOT11_BSS_TYPE`
    pub bss_type: u32,
    /// `WLAN_CONNECTION_*` flag bits
    pub flags: u32,
}

/// Profile document returned by `WlanGetProfile`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    pub xml: String,
    /// `WLAN_PROFILE_*` flags
    pub flags: u32,
    /// `WLAN_READ_ACCESS` / `WLAN_EXECUTE_ACCESS` / `WLAN_WRITE_ACCESS` mask
    pub granted_access: u32,
}

/// Result of `WlanQueryInterface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeData {
    pub data: Vec<u8>,
    /// Raw `WLAN_OPCODE_VALUE_TYPE`
    pub value_type: u32,
}

/// The Native Wifi API as seen by the projection layer
///
/// Implementations must be usable from several threads at once; each caller
/// opens and closes its own handle.
pub trait WlanApi: Send + Sync {
    /// Open a client session, returning the handle and negotiated version
    fn open_handle(&self, client_version: u32) -> Result<(ClientHandle, u32), Win32Error>;

    /// Close a client session
    fn close_handle(&self, handle: ClientHandle) -> Result<(), Win32Error>;

    /// `WLAN_INTERFACE_INFO_LIST`
    fn enum_interfaces(&self, handle: ClientHandle) -> Result<Vec<u8>, Win32Error>;

    /// `WLAN_AVAILABLE_NETWORK_LIST`
    fn get_available_network_list(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        flags: u32,
    ) -> Result<Vec<u8>, Win32Error>;

    /// `WLAN_BSS_LIST`, truncated to its `dwTotalSize`
    fn get_network_bss_list(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        query: Option<&BssQuery>,
    ) -> Result<Vec<u8>, Win32Error>;

    /// `WLAN_PROFILE_INFO_LIST`
    fn get_profile_list(&self, handle: ClientHandle, interface: &Uuid) -> Result<Vec<u8>, Win32Error>;

    /// Profile XML for one stored profile
    fn get_profile(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        name: &str,
    ) -> Result<ProfileDocument, Win32Error>;

    /// Start a connection attempt
    fn connect(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        request: &ConnectRequest,
    ) -> Result<(), Win32Error>;

    /// Disconnect the interface from its current network
    fn disconnect(&self, handle: ClientHandle, interface: &Uuid) -> Result<(), Win32Error>;

    /// Query an interface property by raw `WLAN_INTF_OPCODE`
    fn query_interface(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        opcode: u32,
    ) -> Result<OpcodeData, Win32Error>;

    /// Request a scan, optionally directed at one SSID
    fn scan(&self, handle: ClientHandle, interface: &Uuid, ssid: Option<&[u8]>) -> Result<(), Win32Error>;
}
