//! Session façade
//!
//! Every operation opens its own client handle, performs its native calls
//! and closes the handle again before returning, on success and on error.
//! No state is kept between operations.

use log::{debug, warn};
use uuid::Uuid;
use wlanapi::{BssQuery, ClientHandle, NativeWlan, Operation, WlanApi, WLAN_CLIENT_VERSION_2};

use crate::bss::{parse_bss_list, WirelessNetworkBss};
use crate::connect::{ConnectionMode, ConnectionParameters};
use crate::dot11::{BssType, Ssid};
use crate::ie::TruncationPolicy;
use crate::interface::{parse_interface_list, WirelessInterface};
use crate::network::{parse_network_list, WirelessNetwork};
use crate::opcode::{InterfaceOpcode, InterfaceQuery};
use crate::profile::{parse_profile_list, WirelessProfile};
use crate::{Result, WifiError};

/// Restrict a BSS list to one SSID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssFilter {
    pub ssid: Ssid,
    pub bss_type: BssType,
    pub security_enabled: bool,
}

impl BssFilter {
    pub fn new(ssid: Ssid) -> Self {
        Self {
            ssid,
            bss_type: BssType::Any,
            security_enabled: false,
        }
    }

    fn to_query(&self) -> BssQuery {
        BssQuery {
            ssid: self.ssid.as_bytes().to_vec(),
            bss_type: self.bss_type.raw(),
            security_enabled: self.security_enabled,
        }
    }
}

/// Per-client settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Requested `WlanOpenHandle` client version
    pub client_version: u32,
    /// Handling of truncated information elements
    pub truncation: TruncationPolicy,
    /// `WLAN_AVAILABLE_NETWORK_INCLUDE_*` flags
    pub available_network_flags: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            client_version: WLAN_CLIENT_VERSION_2,
            truncation: TruncationPolicy::Reject,
            available_network_flags: 0,
        }
    }
}

/// Open client handle, closed on drop
struct Session<'a, A: WlanApi> {
    api: &'a A,
    handle: ClientHandle,
}

impl<'a, A: WlanApi> Session<'a, A> {
    fn open(api: &'a A, client_version: u32) -> Result<Self> {
        let (handle, negotiated) = api
            .open_handle(client_version)
            .map_err(|code| WifiError::native(Operation::OpenHandle, code))?;
        debug!("Opened client handle {:?} (version {})", handle, negotiated);
        Ok(Self { api, handle })
    }

    /// Run one native call, attributing a failure to `operation`
    fn call<T>(
        &self,
        operation: Operation,
        f: impl FnOnce(&A, ClientHandle) -> std::result::Result<T, wlanapi::Win32Error>,
    ) -> Result<T> {
        f(self.api, self.handle).map_err(|code| {
            debug!("{} failed: {}", operation, code);
            WifiError::native(operation, code)
        })
    }
}

impl<A: WlanApi> Drop for Session<'_, A> {
    fn drop(&mut self) {
        match self.api.close_handle(self.handle) {
            Ok(()) => debug!("Closed client handle {:?}", self.handle),
            Err(code) => warn!("Failed to close client handle {:?}: {}", self.handle, code),
        }
    }
}

/// Typed access to the Native Wifi API
#[derive(Debug, Clone, Default)]
pub struct WlanClient<A: WlanApi = NativeWlan> {
    api: A,
    options: ClientOptions,
}

impl WlanClient<NativeWlan> {
    /// Client backed by the system API
    pub fn native() -> Self {
        Self::new(NativeWlan::new())
    }
}

impl<A: WlanApi> WlanClient<A> {
    pub fn new(api: A) -> Self {
        Self::with_options(api, ClientOptions::default())
    }

    pub fn with_options(api: A, options: ClientOptions) -> Self {
        Self { api, options }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn session(&self) -> Result<Session<'_, A>> {
        Session::open(&self.api, self.options.client_version)
    }

    /// Enumerate wireless interfaces
    pub fn interfaces(&self) -> Result<Vec<WirelessInterface>> {
        let session = self.session()?;
        let buffer = session.call(Operation::EnumInterfaces, |api, h| api.enum_interfaces(h))?;
        parse_interface_list(&buffer)
    }

    /// BSS entries from the last scan on `interface`
    pub fn bss_list(&self, interface: &Uuid) -> Result<Vec<WirelessNetworkBss>> {
        self.bss_list_with(interface, None)
    }

    /// BSS entries for one SSID
    pub fn bss_list_filtered(&self, interface: &Uuid, filter: &BssFilter) -> Result<Vec<WirelessNetworkBss>> {
        self.bss_list_with(interface, Some(filter.to_query()))
    }

    fn bss_list_with(&self, interface: &Uuid, query: Option<BssQuery>) -> Result<Vec<WirelessNetworkBss>> {
        let session = self.session()?;
        let buffer = session.call(Operation::GetNetworkBssList, |api, h| {
            api.get_network_bss_list(h, interface, query.as_ref())
        })?;
        parse_bss_list(&buffer, self.options.truncation)
    }

    /// Networks visible to the autoconfiguration service
    pub fn available_networks(&self, interface: &Uuid) -> Result<Vec<WirelessNetwork>> {
        let session = self.session()?;
        let flags = self.options.available_network_flags;
        let buffer = session.call(Operation::GetAvailableNetworkList, |api, h| {
            api.get_available_network_list(h, interface, flags)
        })?;
        parse_network_list(&buffer)
    }

    /// Every stored profile with its document
    pub fn profiles(&self, interface: &Uuid) -> Result<Vec<WirelessProfile>> {
        let session = self.session()?;
        let buffer = session.call(Operation::GetProfileList, |api, h| api.get_profile_list(h, interface))?;

        let mut profiles = Vec::new();
        for info in parse_profile_list(&buffer)? {
            let document = session.call(Operation::GetProfile, |api, h| {
                api.get_profile(h, interface, &info.name)
            })?;
            profiles.push(WirelessProfile::new(info.name, info.flags, document));
        }
        Ok(profiles)
    }

    /// One stored profile by name
    pub fn profile(&self, interface: &Uuid, name: &str) -> Result<WirelessProfile> {
        let session = self.session()?;
        let document = session.call(Operation::GetProfile, |api, h| api.get_profile(h, interface, name))?;
        let flags = document.flags;
        Ok(WirelessProfile::new(name, flags, document))
    }

    /// Start a connection attempt
    ///
    /// Returns once the request is accepted, not when the association
    /// completes.
    pub fn connect(&self, interface: &Uuid, parameters: &ConnectionParameters) -> Result<()> {
        if !matches!(parameters.mode(), ConnectionMode::Profile(_)) {
            debug!("{} is only checked structurally before the request", parameters.mode());
        }
        let request = parameters.to_request();
        let session = self.session()?;
        session.call(Operation::Connect, |api, h| api.connect(h, interface, &request))
    }

    pub fn disconnect(&self, interface: &Uuid) -> Result<()> {
        let session = self.session()?;
        session.call(Operation::Disconnect, |api, h| api.disconnect(h, interface))
    }

    /// Query an interface property by opcode name
    pub fn query_interface(&self, interface: &Uuid, opcode: &str) -> Result<InterfaceQuery> {
        let opcode = InterfaceOpcode::from_name(opcode)?;
        let session = self.session()?;
        let data = session.call(Operation::QueryInterface, |api, h| {
            api.query_interface(h, interface, opcode.raw())
        })?;
        InterfaceQuery::from_data(opcode, &data)
    }

    /// Request a scan, optionally directed at one SSID
    ///
    /// Results show up in later BSS and network lists.
    pub fn scan(&self, interface: &Uuid, ssid: Option<&Ssid>) -> Result<()> {
        let session = self.session()?;
        session.call(Operation::Scan, |api, h| {
            api.scan(h, interface, ssid.map(Ssid::as_bytes))
        })
    }
}
