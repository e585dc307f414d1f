//! Bounds-checked views over native records
//!
//! Native results are fixed-stride arrays of fixed-layout records. Every
//! field read goes through [`RecordReader`], which checks the field against
//! the record length instead of trusting offsets found in the data.

use wlanapi::layout::{dot11_ssid, list_header, DOT11_SSID_MAX_LENGTH};

use crate::DecodeError;

/// Read-only view over one native record
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'a> {
    record: &'static str,
    data: &'a [u8],
}

impl<'a> RecordReader<'a> {
    /// Wrap `data`, which must hold at least `size` bytes
    pub fn new(record: &'static str, data: &'a [u8], size: usize) -> Result<Self, DecodeError> {
        if data.len() < size {
            return Err(DecodeError::RecordTooShort {
                record,
                needed: size,
                actual: data.len(),
            });
        }
        Ok(Self { record, data })
    }

    pub fn name(&self) -> &'static str {
        self.record
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `[offset, offset + size)`, checking for overflow and bounds
    pub fn region(&self, offset: usize, size: usize) -> Result<&'a [u8], DecodeError> {
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::RegionOutOfBounds {
                offset,
                size,
                len: self.data.len(),
            })?;
        Ok(&self.data[offset..end])
    }

    pub fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.region(offset, N)?);
        Ok(out)
    }

    pub fn u8(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(offset)?[0])
    }

    pub fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array(offset)?))
    }

    pub fn u32(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(offset)?))
    }

    pub fn i32(&self, offset: usize) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.array(offset)?))
    }

    pub fn u64(&self, offset: usize) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array(offset)?))
    }

    /// 32-bit `BOOL`
    pub fn bool(&self, offset: usize) -> Result<bool, DecodeError> {
        Ok(self.u32(offset)? != 0)
    }

    /// NUL-terminated UTF-16 string in a fixed array of `max_chars` units
    pub fn wide_string(&self, offset: usize, max_chars: usize) -> Result<String, DecodeError> {
        let raw = self.region(offset, max_chars * 2)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .take_while(|unit| *unit != 0)
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }

    /// Octets of the `DOT11_SSID` at `offset`, length capped at 32
    pub fn ssid(&self, offset: usize) -> Result<&'a [u8], DecodeError> {
        let len = (self.u32(offset + dot11_ssid::LENGTH)? as usize).min(DOT11_SSID_MAX_LENGTH);
        self.region(offset + dot11_ssid::SSID, len)
    }
}

/// Split an interface, network or profile list into its records
pub fn list_records<'a>(
    record: &'static str,
    buffer: &'a [u8],
    stride: usize,
) -> Result<Vec<&'a [u8]>, DecodeError> {
    let header = RecordReader::new(record, buffer, list_header::SIZE)?;
    let count = header.u32(list_header::NUMBER_OF_ITEMS)? as usize;
    let entries = header.region(list_header::SIZE, count.saturating_mul(stride))?;
    Ok(entries.chunks_exact(stride).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short() {
        let err = RecordReader::new("WLAN_PROFILE_INFO", &[0u8; 10], 516).unwrap_err();
        assert_eq!(
            err,
            DecodeError::RecordTooShort {
                record: "WLAN_PROFILE_INFO",
                needed: 516,
                actual: 10,
            }
        );
    }

    #[test]
    fn test_region_bounds() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let reader = RecordReader::new("test", &data, 8).unwrap();
        assert_eq!(reader.region(4, 4).unwrap(), &[5, 6, 7, 8]);
        assert_eq!(reader.u32(0).unwrap(), 0x0403_0201);
        assert!(matches!(
            reader.region(6, 4),
            Err(DecodeError::RegionOutOfBounds { offset: 6, size: 4, len: 8 })
        ));
        assert!(reader.region(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_wide_string() {
        let mut data = vec![0u8; 16];
        for (i, unit) in "Wi-Fi".encode_utf16().enumerate() {
            data[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let reader = RecordReader::new("test", &data, 16).unwrap();
        assert_eq!(reader.wide_string(0, 8).unwrap(), "Wi-Fi");
    }

    #[test]
    fn test_ssid_length_capped() {
        let mut data = vec![b'x'; 36];
        data[0..4].copy_from_slice(&200u32.to_le_bytes());
        let reader = RecordReader::new("DOT11_SSID", &data, 36).unwrap();
        assert_eq!(reader.ssid(0).unwrap().len(), 32);
    }

    #[test]
    fn test_list_records() {
        let mut buffer = vec![0u8; 8];
        buffer[0] = 2;
        buffer.extend_from_slice(&[1, 1, 1, 2, 2, 2]);
        let records = list_records("list", &buffer, 3).unwrap();
        assert_eq!(records, vec![&[1u8, 1, 1][..], &[2u8, 2, 2][..]]);

        buffer[0] = 3;
        assert!(list_records("list", &buffer, 3).is_err());
    }
}
