//! Native status codes and operation names

use std::fmt;

/// Win32 status code returned by a Native Wifi call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Win32Error(pub u32);

impl Win32Error {
    pub const SUCCESS: Self = Self(0);
    pub const ACCESS_DENIED: Self = Self(5);
    pub const INVALID_HANDLE: Self = Self(6);
    pub const NOT_ENOUGH_MEMORY: Self = Self(8);
    pub const NOT_SUPPORTED: Self = Self(50);
    pub const INVALID_PARAMETER: Self = Self(87);
    pub const SERVICE_NOT_ACTIVE: Self = Self(1062);
    pub const INVALID_STATE: Self = Self(5023);
    pub const NOT_FOUND: Self = Self(1168);
    pub const BAD_PROFILE: Self = Self(1206);
    pub const REMOTE_SESSION_LIMIT_EXCEEDED: Self = Self(1220);

    /// Raw status value
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Symbolic name for well-known codes
    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "ERROR_SUCCESS",
            5 => "ERROR_ACCESS_DENIED",
            6 => "ERROR_INVALID_HANDLE",
            8 => "ERROR_NOT_ENOUGH_MEMORY",
            50 => "ERROR_NOT_SUPPORTED",
            87 => "ERROR_INVALID_PARAMETER",
            1062 => "ERROR_SERVICE_NOT_ACTIVE",
            1168 => "ERROR_NOT_FOUND",
            1206 => "ERROR_BAD_PROFILE",
            1220 => "ERROR_REMOTE_SESSION_LIMIT_EXCEEDED",
            5023 => "ERROR_INVALID_STATE",
            _ => "native error",
        }
    }

    /// Map a raw return value to `Ok` or `Err`
    pub fn check(code: u32) -> Result<(), Self> {
        if code == 0 {
            Ok(())
        } else {
            Err(Self(code))
        }
    }
}

impl fmt::Display for Win32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

impl std::error::Error for Win32Error {}

/// Native call that a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    OpenHandle,
    CloseHandle,
    EnumInterfaces,
    GetAvailableNetworkList,
    GetNetworkBssList,
    GetProfileList,
    GetProfile,
    Connect,
    Disconnect,
    QueryInterface,
    Scan,
}

impl Operation {
    /// Name of the wlanapi.dll entry point
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::OpenHandle => "WlanOpenHandle",
            Self::CloseHandle => "WlanCloseHandle",
            Self::EnumInterfaces => "WlanEnumInterfaces",
            Self::GetAvailableNetworkList => "WlanGetAvailableNetworkList",
            Self::GetNetworkBssList => "WlanGetNetworkBssList",
            Self::GetProfileList => "WlanGetProfileList",
            Self::GetProfile => "WlanGetProfile",
            Self::Connect => "WlanConnect",
            Self::Disconnect => "WlanDisconnect",
            Self::QueryInterface => "WlanQueryInterface",
            Self::Scan => "WlanScan",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.native_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        assert!(Win32Error::check(0).is_ok());
        assert_eq!(Win32Error::check(87), Err(Win32Error::INVALID_PARAMETER));
    }

    #[test]
    fn test_display() {
        assert_eq!(Win32Error(1062).to_string(), "ERROR_SERVICE_NOT_ACTIVE (1062)");
        assert_eq!(Win32Error(0xdead).to_string(), "native error (57005)");
        assert_eq!(Operation::GetNetworkBssList.to_string(), "WlanGetNetworkBssList");
    }
}
