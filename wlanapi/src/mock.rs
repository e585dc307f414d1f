//! Scripted in-memory backend
//!
//! [`MockWlan`] serves pre-built native buffers, records every call and can
//! be told to fail any operation with a given status. The record builders
//! produce buffers in the exact native layouts of [`crate::layout`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use crate::api::{BssQuery, ClientHandle, ConnectRequest, OpcodeData, ProfileDocument, WlanApi};
use crate::error::{Operation, Win32Error};
use crate::layout::{
    available_network, bss_entry, bss_list as bss_list_layout, dot11_ssid, interface_info,
    list_header, profile_info, radio_state, DOT11_SSID_MAX_LENGTH, WLAN_MAX_NAME_LENGTH,
};

#[derive(Debug, Default)]
struct MockState {
    interfaces: Vec<u8>,
    bss_lists: HashMap<Uuid, Vec<u8>>,
    networks: HashMap<Uuid, Vec<u8>>,
    profile_lists: HashMap<Uuid, Vec<u8>>,
    profiles: HashMap<(Uuid, String), ProfileDocument>,
    opcodes: HashMap<(Uuid, u32), OpcodeData>,
    failures: HashMap<Operation, Win32Error>,
    calls: Vec<Operation>,
    connects: Vec<ConnectRequest>,
    bss_queries: Vec<Option<BssQuery>>,
    network_flags: Vec<u32>,
    open: HashSet<ClientHandle>,
}

/// In-memory Native Wifi backend
#[derive(Debug, Default)]
pub struct MockWlan {
    state: Mutex<MockState>,
    next_handle: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl MockWlan {
    /// Create a backend with no interfaces
    pub fn new() -> Self {
        let mock = Self::default();
        mock.state().interfaces = interface_list(&[]);
        mock
    }

    /// Serve this `WLAN_INTERFACE_INFO_LIST`
    pub fn with_interfaces(self, buffer: Vec<u8>) -> Self {
        self.state().interfaces = buffer;
        self
    }

    /// Serve this `WLAN_BSS_LIST` for `interface`
    pub fn with_bss_list(self, interface: Uuid, buffer: Vec<u8>) -> Self {
        self.state().bss_lists.insert(interface, buffer);
        self
    }

    /// Serve this `WLAN_AVAILABLE_NETWORK_LIST` for `interface`
    pub fn with_networks(self, interface: Uuid, buffer: Vec<u8>) -> Self {
        self.state().networks.insert(interface, buffer);
        self
    }

    /// Serve this `WLAN_PROFILE_INFO_LIST` for `interface`
    pub fn with_profile_list(self, interface: Uuid, buffer: Vec<u8>) -> Self {
        self.state().profile_lists.insert(interface, buffer);
        self
    }

    /// Serve this document for profile `name`
    pub fn with_profile(self, interface: Uuid, name: &str, document: ProfileDocument) -> Self {
        self.state().profiles.insert((interface, name.to_string()), document);
        self
    }

    /// Answer `WlanQueryInterface` for `opcode`
    pub fn with_opcode(self, interface: Uuid, opcode: u32, data: OpcodeData) -> Self {
        self.state().opcodes.insert((interface, opcode), data);
        self
    }

    /// Make every call of `operation` fail with `code`
    pub fn failing(self, operation: Operation, code: Win32Error) -> Self {
        self.state().failures.insert(operation, code);
        self
    }

    /// Number of handles opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of handles closed so far
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Handles currently open
    pub fn open_handles(&self) -> usize {
        self.state().open.len()
    }

    /// Every operation attempted, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    /// Connection requests received, in order
    pub fn connect_requests(&self) -> Vec<ConnectRequest> {
        self.state().connects.clone()
    }

    /// BSS list filters received, in order
    pub fn bss_queries(&self) -> Vec<Option<BssQuery>> {
        self.state().bss_queries.clone()
    }

    /// Flags passed to each available network request, in order
    pub fn available_network_flags(&self) -> Vec<u32> {
        self.state().network_flags.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record the call, then apply injected failures and handle validation
    fn enter(&self, operation: Operation, handle: ClientHandle) -> Result<std::sync::MutexGuard<'_, MockState>, Win32Error> {
        let mut state = self.state();
        state.calls.push(operation);
        if let Some(code) = state.failures.get(&operation) {
            return Err(*code);
        }
        if !state.open.contains(&handle) {
            return Err(Win32Error::INVALID_HANDLE);
        }
        Ok(state)
    }
}

impl WlanApi for MockWlan {
    fn open_handle(&self, client_version: u32) -> Result<(ClientHandle, u32), Win32Error> {
        let mut state = self.state();
        state.calls.push(Operation::OpenHandle);
        if let Some(code) = state.failures.get(&Operation::OpenHandle) {
            return Err(*code);
        }
        if client_version == 0 {
            return Err(Win32Error::INVALID_PARAMETER);
        }
        let handle = ClientHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        state.open.insert(handle);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok((handle, client_version.min(2)))
    }

    fn close_handle(&self, handle: ClientHandle) -> Result<(), Win32Error> {
        let mut state = self.state();
        state.calls.push(Operation::CloseHandle);
        if !state.open.remove(&handle) {
            return Err(Win32Error::INVALID_HANDLE);
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
        match state.failures.get(&Operation::CloseHandle) {
            Some(code) => Err(*code),
            None => Ok(()),
        }
    }

    fn enum_interfaces(&self, handle: ClientHandle) -> Result<Vec<u8>, Win32Error> {
        let state = self.enter(Operation::EnumInterfaces, handle)?;
        Ok(state.interfaces.clone())
    }

    fn get_available_network_list(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        flags: u32,
    ) -> Result<Vec<u8>, Win32Error> {
        let mut state = self.enter(Operation::GetAvailableNetworkList, handle)?;
        state.network_flags.push(flags);
        state.networks.get(interface).cloned().ok_or(Win32Error::NOT_FOUND)
    }

    fn get_network_bss_list(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        query: Option<&BssQuery>,
    ) -> Result<Vec<u8>, Win32Error> {
        let mut state = self.enter(Operation::GetNetworkBssList, handle)?;
        state.bss_queries.push(query.cloned());
        state.bss_lists.get(interface).cloned().ok_or(Win32Error::NOT_FOUND)
    }

    fn get_profile_list(&self, handle: ClientHandle, interface: &Uuid) -> Result<Vec<u8>, Win32Error> {
        let state = self.enter(Operation::GetProfileList, handle)?;
        state.profile_lists.get(interface).cloned().ok_or(Win32Error::NOT_FOUND)
    }

    fn get_profile(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        name: &str,
    ) -> Result<ProfileDocument, Win32Error> {
        let state = self.enter(Operation::GetProfile, handle)?;
        state
            .profiles
            .get(&(*interface, name.to_string()))
            .cloned()
            .ok_or(Win32Error::NOT_FOUND)
    }

    fn connect(
        &self,
        handle: ClientHandle,
        _interface: &Uuid,
        request: &ConnectRequest,
    ) -> Result<(), Win32Error> {
        let mut state = self.enter(Operation::Connect, handle)?;
        state.connects.push(request.clone());
        Ok(())
    }

    fn disconnect(&self, handle: ClientHandle, _interface: &Uuid) -> Result<(), Win32Error> {
        self.enter(Operation::Disconnect, handle).map(|_| ())
    }

    fn query_interface(
        &self,
        handle: ClientHandle,
        interface: &Uuid,
        opcode: u32,
    ) -> Result<OpcodeData, Win32Error> {
        let state = self.enter(Operation::QueryInterface, handle)?;
        state
            .opcodes
            .get(&(*interface, opcode))
            .cloned()
            .ok_or(Win32Error::NOT_SUPPORTED)
    }

    fn scan(&self, handle: ClientHandle, _interface: &Uuid, ssid: Option<&[u8]>) -> Result<(), Win32Error> {
        if ssid.map_or(false, |s| s.len() > DOT11_SSID_MAX_LENGTH) {
            return Err(Win32Error::INVALID_PARAMETER);
        }
        self.enter(Operation::Scan, handle).map(|_| ())
    }
}

// Record builders

fn put(record: &mut [u8], offset: usize, bytes: &[u8]) {
    record[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn put_wide(record: &mut [u8], offset: usize, text: &str) {
    for (i, unit) in text.encode_utf16().take(WLAN_MAX_NAME_LENGTH - 1).enumerate() {
        put(record, offset + i * 2, &unit.to_le_bytes());
    }
}

fn put_ssid(record: &mut [u8], offset: usize, ssid: &[u8]) {
    let len = ssid.len().min(DOT11_SSID_MAX_LENGTH);
    put(record, offset + dot11_ssid::LENGTH, &(len as u32).to_le_bytes());
    put(record, offset + dot11_ssid::SSID, &ssid[..len]);
}

fn list(records: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    debug_assert_eq!(out.len(), list_header::SIZE);
    for record in records {
        out.extend_from_slice(&record);
    }
    out
}

/// `WLAN_INTERFACE_INFO` contents
#[derive(Debug, Clone)]
pub struct InterfaceRecord {
    pub guid: Uuid,
    pub description: String,
    pub state: u32,
}

impl InterfaceRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut record = vec![0u8; interface_info::SIZE];
        put(&mut record, interface_info::GUID, &self.guid.to_bytes_le());
        put_wide(&mut record, interface_info::DESCRIPTION, &self.description);
        put(&mut record, interface_info::STATE, &self.state.to_le_bytes());
        record
    }
}

/// Build a `WLAN_INTERFACE_INFO_LIST`
pub fn interface_list(records: &[InterfaceRecord]) -> Vec<u8> {
    list(records.iter().map(InterfaceRecord::encode).collect())
}

/// `WLAN_PROFILE_INFO` contents
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub name: String,
    pub flags: u32,
}

impl ProfileRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut record = vec![0u8; profile_info::SIZE];
        put_wide(&mut record, profile_info::PROFILE_NAME, &self.name);
        put(&mut record, profile_info::FLAGS, &self.flags.to_le_bytes());
        record
    }
}

/// Build a `WLAN_PROFILE_INFO_LIST`
pub fn profile_list(records: &[ProfileRecord]) -> Vec<u8> {
    list(records.iter().map(ProfileRecord::encode).collect())
}

/// `WLAN_AVAILABLE_NETWORK` contents
#[derive(Debug, Clone)]
pub struct NetworkRecord {
    pub profile_name: String,
    pub ssid: Vec<u8>,
    pub bss_type: u32,
    pub number_of_bssids: u32,
    pub connectable: bool,
    pub not_connectable_reason: u32,
    pub phy_types: Vec<u32>,
    pub more_phy_types: bool,
    pub signal_quality: u32,
    pub security_enabled: bool,
    pub auth_algorithm: u32,
    pub cipher_algorithm: u32,
    pub flags: u32,
}

impl Default for NetworkRecord {
    fn default() -> Self {
        Self {
            profile_name: String::new(),
            ssid: Vec::new(),
            bss_type: 1,
            number_of_bssids: 1,
            connectable: true,
            not_connectable_reason: 0,
            phy_types: vec![7],
            more_phy_types: false,
            signal_quality: 0,
            security_enabled: false,
            auth_algorithm: 1,
            cipher_algorithm: 0,
            flags: 0,
        }
    }
}

impl NetworkRecord {
    pub fn encode(&self) -> Vec<u8> {
        use available_network as n;

        let mut record = vec![0u8; n::SIZE];
        put_wide(&mut record, n::PROFILE_NAME, &self.profile_name);
        put_ssid(&mut record, n::SSID, &self.ssid);
        put(&mut record, n::BSS_TYPE, &self.bss_type.to_le_bytes());
        put(&mut record, n::NUMBER_OF_BSSIDS, &self.number_of_bssids.to_le_bytes());
        put(&mut record, n::CONNECTABLE, &(self.connectable as u32).to_le_bytes());
        put(&mut record, n::NOT_CONNECTABLE_REASON, &self.not_connectable_reason.to_le_bytes());
        let phy_count = self.phy_types.len().min(n::MAX_PHY_TYPES);
        put(&mut record, n::NUMBER_OF_PHY_TYPES, &(phy_count as u32).to_le_bytes());
        for (i, phy) in self.phy_types.iter().take(phy_count).enumerate() {
            put(&mut record, n::PHY_TYPES + i * 4, &phy.to_le_bytes());
        }
        put(&mut record, n::MORE_PHY_TYPES, &(self.more_phy_types as u32).to_le_bytes());
        put(&mut record, n::SIGNAL_QUALITY, &self.signal_quality.to_le_bytes());
        put(&mut record, n::SECURITY_ENABLED, &(self.security_enabled as u32).to_le_bytes());
        put(&mut record, n::DEFAULT_AUTH_ALGORITHM, &self.auth_algorithm.to_le_bytes());
        put(&mut record, n::DEFAULT_CIPHER_ALGORITHM, &self.cipher_algorithm.to_le_bytes());
        put(&mut record, n::FLAGS, &self.flags.to_le_bytes());
        record
    }
}

/// Build a `WLAN_AVAILABLE_NETWORK_LIST`
pub fn network_list(records: &[NetworkRecord]) -> Vec<u8> {
    list(records.iter().map(NetworkRecord::encode).collect())
}

/// `WLAN_BSS_ENTRY` contents, with its raw IE buffer
#[derive(Debug, Clone)]
pub struct BssRecord {
    pub ssid: Vec<u8>,
    pub phy_id: u32,
    pub bssid: [u8; 6],
    pub bss_type: u32,
    pub phy_type: u32,
    pub rssi: i32,
    pub link_quality: u32,
    pub in_reg_domain: bool,
    pub beacon_period: u16,
    pub timestamp: u64,
    pub host_timestamp: u64,
    pub capabilities: u16,
    pub center_frequency_khz: u32,
    /// Rates in 500 kbps units, high bit marks a basic rate
    pub rates: Vec<u16>,
    pub ies: Vec<u8>,
}

impl Default for BssRecord {
    fn default() -> Self {
        Self {
            ssid: Vec::new(),
            phy_id: 0,
            bssid: [0; 6],
            bss_type: 1,
            phy_type: 7,
            rssi: -60,
            link_quality: 80,
            in_reg_domain: true,
            beacon_period: 100,
            timestamp: 0,
            host_timestamp: 0,
            capabilities: 0x0001,
            center_frequency_khz: 2_437_000,
            rates: Vec::new(),
            ies: Vec::new(),
        }
    }
}

impl BssRecord {
    /// Encode the fixed part, pointing the IE region at `ie_offset`
    /// (relative to the entry base)
    pub fn encode(&self, ie_offset: u32) -> Vec<u8> {
        use bss_entry as b;

        let mut record = vec![0u8; b::SIZE];
        put_ssid(&mut record, b::SSID, &self.ssid);
        put(&mut record, b::PHY_ID, &self.phy_id.to_le_bytes());
        put(&mut record, b::BSSID, &self.bssid);
        put(&mut record, b::BSS_TYPE, &self.bss_type.to_le_bytes());
        put(&mut record, b::PHY_TYPE, &self.phy_type.to_le_bytes());
        put(&mut record, b::RSSI, &self.rssi.to_le_bytes());
        put(&mut record, b::LINK_QUALITY, &self.link_quality.to_le_bytes());
        record[b::IN_REG_DOMAIN] = self.in_reg_domain as u8;
        put(&mut record, b::BEACON_PERIOD, &self.beacon_period.to_le_bytes());
        put(&mut record, b::TIMESTAMP, &self.timestamp.to_le_bytes());
        put(&mut record, b::HOST_TIMESTAMP, &self.host_timestamp.to_le_bytes());
        put(&mut record, b::CAPABILITY_INFORMATION, &self.capabilities.to_le_bytes());
        put(&mut record, b::CH_CENTER_FREQUENCY, &self.center_frequency_khz.to_le_bytes());
        let rate_count = self.rates.len().min(b::MAX_RATES);
        put(&mut record, b::RATE_SET_LENGTH, &((rate_count * 2) as u32).to_le_bytes());
        for (i, rate) in self.rates.iter().take(rate_count).enumerate() {
            put(&mut record, b::RATE_SET + i * 2, &rate.to_le_bytes());
        }
        put(&mut record, b::IE_OFFSET, &ie_offset.to_le_bytes());
        put(&mut record, b::IE_SIZE, &(self.ies.len() as u32).to_le_bytes());
        record
    }
}

/// Build a `WLAN_BSS_LIST`: header, entry array, then every entry's IE
/// buffer in order
pub fn bss_list(records: &[BssRecord]) -> Vec<u8> {
    let entries_end = bss_list_layout::ENTRIES + records.len() * bss_entry::SIZE;
    let mut ie_data = Vec::new();
    let mut entries = Vec::with_capacity(records.len() * bss_entry::SIZE);

    for (i, record) in records.iter().enumerate() {
        let base = bss_list_layout::ENTRIES + i * bss_entry::SIZE;
        let ie_offset = entries_end + ie_data.len() - base;
        entries.extend_from_slice(&record.encode(ie_offset as u32));
        ie_data.extend_from_slice(&record.ies);
    }

    let total = entries_end + ie_data.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&entries);
    out.extend_from_slice(&ie_data);
    out
}

/// Build a `WLAN_RADIO_STATE` from `(phy index, software, hardware)` triples
pub fn radio_state_buffer(phys: &[(u32, u32, u32)]) -> Vec<u8> {
    use radio_state::phy;

    let count = phys.len().min(radio_state::MAX_PHYS);
    let mut out = vec![0u8; radio_state::PHY_RADIO_STATES + radio_state::MAX_PHYS * phy::SIZE];
    put(&mut out, radio_state::NUMBER_OF_PHYS, &(count as u32).to_le_bytes());
    for (i, (index, software, hardware)) in phys.iter().take(count).enumerate() {
        let base = radio_state::PHY_RADIO_STATES + i * phy::SIZE;
        put(&mut out, base + phy::PHY_INDEX, &index.to_le_bytes());
        put(&mut out, base + phy::SOFTWARE_RADIO_STATE, &software.to_le_bytes());
        put(&mut out, base + phy::HARDWARE_RADIO_STATE, &hardware.to_le_bytes());
    }
    out
}
