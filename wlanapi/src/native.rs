//! `wlanapi.dll` backend
//!
//! Every buffer the API allocates is wrapped in a guard that calls
//! `WlanFreeMemory` on drop, after its contents were copied out.

#[cfg(not(windows))]
use uuid::Uuid;

#[cfg(not(windows))]
use crate::api::{BssQuery, ClientHandle, ConnectRequest, OpcodeData, ProfileDocument, WlanApi};
#[cfg(not(windows))]
use crate::error::Win32Error;

/// Backend calling the system Native Wifi API
///
/// On targets other than Windows every call fails with
/// `ERROR_NOT_SUPPORTED`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeWlan;

impl NativeWlan {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod imp {
    use std::ffi::c_void;
    use std::ptr;

    use log::trace;
    use uuid::Uuid;
    use winapi::shared::guiddef::GUID;
    use winapi::shared::minwindef::DWORD;
    use winapi::shared::windot11::{DOT11_BSSID_LIST, PDOT11_BSSID_LIST};
    use winapi::shared::wlantypes::{DOT11_SSID, PDOT11_SSID};
    use winapi::um::wlanapi::{
        WlanCloseHandle, WlanConnect, WlanDisconnect, WlanEnumInterfaces, WlanFreeMemory,
        WlanGetAvailableNetworkList, WlanGetNetworkBssList, WlanGetProfile, WlanGetProfileList,
        WlanOpenHandle, WlanQueryInterface, WlanScan, PWLAN_AVAILABLE_NETWORK_LIST,
        PWLAN_BSS_LIST, PWLAN_INTERFACE_INFO_LIST, PWLAN_PROFILE_INFO_LIST,
        WLAN_CONNECTION_PARAMETERS,
    };
    use winapi::um::winnt::{HANDLE, LPWSTR};

    use super::NativeWlan;
    use crate::api::{BssQuery, ClientHandle, ConnectRequest, OpcodeData, ProfileDocument, WlanApi};
    use crate::error::Win32Error;
    use crate::layout::{
        available_network, interface_info, list_header, list_size, profile_info,
        DOT11_SSID_MAX_LENGTH,
    };

    const NDIS_OBJECT_TYPE_DEFAULT: u8 = 0x80;
    const DOT11_BSSID_LIST_REVISION_1: u8 = 1;

    /// Buffer allocated by the API, released with `WlanFreeMemory`
    struct WlanMemory(*mut c_void);

    impl WlanMemory {
        /// Copy `len` bytes out of the buffer
        ///
        /// # Safety
        /// The buffer must hold at least `len` readable bytes.
        unsafe fn copy(&self, len: usize) -> Vec<u8> {
            std::slice::from_raw_parts(self.0 as *const u8, len).to_vec()
        }

        /// Read a little-endian `u32` at `offset`
        ///
        /// # Safety
        /// The buffer must hold at least `offset + 4` readable bytes.
        unsafe fn read_u32(&self, offset: usize) -> u32 {
            ptr::read_unaligned((self.0 as *const u8).add(offset) as *const u32)
        }
    }

    impl Drop for WlanMemory {
        fn drop(&mut self) {
            if !self.0.is_null() {
                unsafe { WlanFreeMemory(self.0) };
            }
        }
    }

    fn handle(handle: ClientHandle) -> HANDLE {
        handle.0 as HANDLE
    }

    fn guid(id: &Uuid) -> GUID {
        let (data1, data2, data3, data4) = id.as_fields();
        GUID {
            Data1: data1,
            Data2: data2,
            Data3: data3,
            Data4: *data4,
        }
    }

    fn wide(text: &str) -> Vec<u16> {
        text.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn dot11_ssid(ssid: &[u8]) -> Result<DOT11_SSID, Win32Error> {
        if ssid.len() > DOT11_SSID_MAX_LENGTH {
            return Err(Win32Error::INVALID_PARAMETER);
        }
        let mut native = DOT11_SSID {
            uSSIDLength: ssid.len() as u32,
            ucSSID: [0; DOT11_SSID_MAX_LENGTH],
        };
        native.ucSSID[..ssid.len()].copy_from_slice(ssid);
        Ok(native)
    }

    /// `DOT11_BSSID_LIST` in a 4-byte aligned buffer
    fn bssid_list(bssids: &[[u8; 6]]) -> Vec<u32> {
        // Header.Size is the padded struct size
        let size = (12 + bssids.len() * 6 + 3) / 4 * 4;
        let mut bytes = Vec::with_capacity(size);
        bytes.push(NDIS_OBJECT_TYPE_DEFAULT);
        bytes.push(DOT11_BSSID_LIST_REVISION_1);
        bytes.extend_from_slice(&(size as u16).to_le_bytes());
        bytes.extend_from_slice(&(bssids.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(bssids.len() as u32).to_le_bytes());
        for bssid in bssids {
            bytes.extend_from_slice(bssid);
        }
        bytes.resize(size, 0);
        bytes
            .chunks_exact(4)
            .map(|word| u32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
            .collect()
    }

    /// Copy a NUL-terminated wide string
    ///
    /// # Safety
    /// `text` must be null or point to a NUL-terminated UTF-16 string.
    unsafe fn wide_to_string(text: LPWSTR) -> String {
        if text.is_null() {
            return String::new();
        }
        let mut len = 0;
        while *text.add(len) != 0 {
            len += 1;
        }
        String::from_utf16_lossy(std::slice::from_raw_parts(text, len))
    }

    /// Copy an interface, network or profile list using its item count
    ///
    /// # Safety
    /// `memory` must point to a list of `stride`-byte records as returned by
    /// the API.
    unsafe fn copy_list(memory: &WlanMemory, stride: usize) -> Vec<u8> {
        let count = memory.read_u32(list_header::NUMBER_OF_ITEMS) as usize;
        memory.copy(list_size(count, stride))
    }

    impl WlanApi for NativeWlan {
        fn open_handle(&self, client_version: u32) -> Result<(ClientHandle, u32), Win32Error> {
            let mut negotiated: DWORD = 0;
            let mut raw: HANDLE = ptr::null_mut();
            let status = unsafe {
                WlanOpenHandle(client_version, ptr::null_mut(), &mut negotiated, &mut raw)
            };
            Win32Error::check(status)?;
            trace!("WlanOpenHandle negotiated version {}", negotiated);
            Ok((ClientHandle(raw as usize), negotiated))
        }

        fn close_handle(&self, client: ClientHandle) -> Result<(), Win32Error> {
            Win32Error::check(unsafe { WlanCloseHandle(handle(client), ptr::null_mut()) })
        }

        fn enum_interfaces(&self, client: ClientHandle) -> Result<Vec<u8>, Win32Error> {
            let mut list: PWLAN_INTERFACE_INFO_LIST = ptr::null_mut();
            let status = unsafe { WlanEnumInterfaces(handle(client), ptr::null_mut(), &mut list) };
            let memory = WlanMemory(list as *mut c_void);
            Win32Error::check(status)?;
            Ok(unsafe { copy_list(&memory, interface_info::SIZE) })
        }

        fn get_available_network_list(
            &self,
            client: ClientHandle,
            interface: &Uuid,
            flags: u32,
        ) -> Result<Vec<u8>, Win32Error> {
            let interface = guid(interface);
            let mut list: PWLAN_AVAILABLE_NETWORK_LIST = ptr::null_mut();
            let status = unsafe {
                WlanGetAvailableNetworkList(
                    handle(client),
                    &interface,
                    flags,
                    ptr::null_mut(),
                    &mut list,
                )
            };
            let memory = WlanMemory(list as *mut c_void);
            Win32Error::check(status)?;
            Ok(unsafe { copy_list(&memory, available_network::SIZE) })
        }

        fn get_network_bss_list(
            &self,
            client: ClientHandle,
            interface: &Uuid,
            query: Option<&BssQuery>,
        ) -> Result<Vec<u8>, Win32Error> {
            let interface = guid(interface);
            let ssid = query.map(|q| dot11_ssid(&q.ssid)).transpose()?;
            let ssid_ptr: PDOT11_SSID = match &ssid {
                Some(ssid) => ssid as *const DOT11_SSID as PDOT11_SSID,
                None => ptr::null_mut(),
            };
            // Both filters are ignored by the API when no SSID is given
            let (bss_type, security) = query.map_or((3, 0), |q| (q.bss_type, q.security_enabled as i32));

            let mut list: PWLAN_BSS_LIST = ptr::null_mut();
            let status = unsafe {
                WlanGetNetworkBssList(
                    handle(client),
                    &interface,
                    ssid_ptr,
                    bss_type,
                    security,
                    ptr::null_mut(),
                    &mut list,
                )
            };
            let memory = WlanMemory(list as *mut c_void);
            Win32Error::check(status)?;
            let total = unsafe { memory.read_u32(0) } as usize;
            Ok(unsafe { memory.copy(total) })
        }

        fn get_profile_list(&self, client: ClientHandle, interface: &Uuid) -> Result<Vec<u8>, Win32Error> {
            let interface = guid(interface);
            let mut list: PWLAN_PROFILE_INFO_LIST = ptr::null_mut();
            let status = unsafe {
                WlanGetProfileList(handle(client), &interface, ptr::null_mut(), &mut list)
            };
            let memory = WlanMemory(list as *mut c_void);
            Win32Error::check(status)?;
            Ok(unsafe { copy_list(&memory, profile_info::SIZE) })
        }

        fn get_profile(
            &self,
            client: ClientHandle,
            interface: &Uuid,
            name: &str,
        ) -> Result<ProfileDocument, Win32Error> {
            let interface = guid(interface);
            let name = wide(name);
            let mut xml: LPWSTR = ptr::null_mut();
            // Input flags stay zero so keys are never returned in plain text
            let mut flags: DWORD = 0;
            let mut granted_access: DWORD = 0;
            let status = unsafe {
                WlanGetProfile(
                    handle(client),
                    &interface,
                    name.as_ptr(),
                    ptr::null_mut(),
                    &mut xml,
                    &mut flags,
                    &mut granted_access,
                )
            };
            let memory = WlanMemory(xml as *mut c_void);
            Win32Error::check(status)?;
            let xml = unsafe { wide_to_string(memory.0 as LPWSTR) };
            Ok(ProfileDocument {
                xml,
                flags,
                granted_access,
            })
        }

        fn connect(
            &self,
            client: ClientHandle,
            interface: &Uuid,
            request: &ConnectRequest,
        ) -> Result<(), Win32Error> {
            let interface = guid(interface);
            let profile = request.profile.as_deref().map(wide);
            let ssid = request.ssid.as_deref().map(dot11_ssid).transpose()?;
            let bssids = (!request.desired_bssids.is_empty()).then(|| bssid_list(&request.desired_bssids));

            let parameters = WLAN_CONNECTION_PARAMETERS {
                wlanConnectionMode: request.mode,
                strProfile: profile.as_ref().map_or(ptr::null(), |p| p.as_ptr()),
                pDot11Ssid: ssid
                    .as_ref()
                    .map_or(ptr::null_mut(), |s| s as *const DOT11_SSID as PDOT11_SSID),
                pDesiredBssidList: bssids
                    .as_ref()
                    .map_or(ptr::null_mut(), |b| b.as_ptr() as *const DOT11_BSSID_LIST as PDOT11_BSSID_LIST),
                dot11BssType: request.bss_type,
                dwFlags: request.flags,
            };
            Win32Error::check(unsafe {
                WlanConnect(handle(client), &interface, &parameters, ptr::null_mut())
            })
        }

        fn disconnect(&self, client: ClientHandle, interface: &Uuid) -> Result<(), Win32Error> {
            let interface = guid(interface);
            Win32Error::check(unsafe { WlanDisconnect(handle(client), &interface, ptr::null_mut()) })
        }

        fn query_interface(
            &self,
            client: ClientHandle,
            interface: &Uuid,
            opcode: u32,
        ) -> Result<OpcodeData, Win32Error> {
            let interface = guid(interface);
            let mut size: DWORD = 0;
            let mut data: *mut c_void = ptr::null_mut();
            let mut value_type = 0;
            let status = unsafe {
                WlanQueryInterface(
                    handle(client),
                    &interface,
                    opcode,
                    ptr::null_mut(),
                    &mut size,
                    &mut data,
                    &mut value_type,
                )
            };
            let memory = WlanMemory(data);
            Win32Error::check(status)?;
            Ok(OpcodeData {
                data: unsafe { memory.copy(size as usize) },
                value_type,
            })
        }

        fn scan(&self, client: ClientHandle, interface: &Uuid, ssid: Option<&[u8]>) -> Result<(), Win32Error> {
            let interface = guid(interface);
            let ssid = ssid.map(dot11_ssid).transpose()?;
            let ssid_ptr = ssid.as_ref().map_or(ptr::null(), |s| s as *const DOT11_SSID);
            Win32Error::check(unsafe {
                WlanScan(handle(client), &interface, ssid_ptr, ptr::null(), ptr::null_mut())
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_bssid_list_header() {
            let words = bssid_list(&[[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]]);
            let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_ne_bytes()).collect();
            assert_eq!(bytes[0], NDIS_OBJECT_TYPE_DEFAULT);
            assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 20);
            assert_eq!(bytes.len(), 20);
            assert_eq!(&bytes[12..18], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

            let words = bssid_list(&[[0x02; 6], [0x04; 6]]);
            let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_ne_bytes()).collect();
            assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 24);
            assert_eq!(bytes.len(), 24);
        }

        #[test]
        fn test_guid_fields() {
            let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0011_2233_4455_6677);
            let native = guid(&id);
            assert_eq!(native.Data1, 0x0123_4567);
            assert_eq!(native.Data4, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
        }
    }
}

#[cfg(not(windows))]
impl WlanApi for NativeWlan {
    fn open_handle(&self, _client_version: u32) -> Result<(ClientHandle, u32), Win32Error> {
        log::debug!("Native Wifi is only available on Windows");
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn close_handle(&self, _handle: ClientHandle) -> Result<(), Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn enum_interfaces(&self, _handle: ClientHandle) -> Result<Vec<u8>, Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn get_available_network_list(
        &self,
        _handle: ClientHandle,
        _interface: &Uuid,
        _flags: u32,
    ) -> Result<Vec<u8>, Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn get_network_bss_list(
        &self,
        _handle: ClientHandle,
        _interface: &Uuid,
        _query: Option<&BssQuery>,
    ) -> Result<Vec<u8>, Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn get_profile_list(&self, _handle: ClientHandle, _interface: &Uuid) -> Result<Vec<u8>, Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn get_profile(
        &self,
        _handle: ClientHandle,
        _interface: &Uuid,
        _name: &str,
    ) -> Result<ProfileDocument, Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn connect(
        &self,
        _handle: ClientHandle,
        _interface: &Uuid,
        _request: &ConnectRequest,
    ) -> Result<(), Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn disconnect(&self, _handle: ClientHandle, _interface: &Uuid) -> Result<(), Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn query_interface(
        &self,
        _handle: ClientHandle,
        _interface: &Uuid,
        _opcode: u32,
    ) -> Result<OpcodeData, Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }

    fn scan(&self, _handle: ClientHandle, _interface: &Uuid, _ssid: Option<&[u8]>) -> Result<(), Win32Error> {
        Err(Win32Error::NOT_SUPPORTED)
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform() {
        assert_eq!(NativeWlan::new().open_handle(2), Err(Win32Error::NOT_SUPPORTED));
    }
}
