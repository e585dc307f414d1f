//! 802.11 Information Element decoding
//!
//! An IE buffer is a flat concatenation of `(id: u8, length: u8, body)`
//! tuples ending at the end of the buffer. Drivers may pad the buffer, so
//! anything shorter than three bytes at the tail is dropped.

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Deserializer, Serialize};

use crate::DecodeError;

/// Smallest span the decoder will start an element in
pub const MIN_ELEMENT_SPAN: usize = 3;

/// Well-known element identifiers
pub mod element_id {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const DS_PARAMETER_SET: u8 = 3;
    pub const TIM: u8 = 5;
    pub const COUNTRY: u8 = 7;
    pub const BSS_LOAD: u8 = 11;
    pub const HT_CAPABILITIES: u8 = 45;
    pub const RSN: u8 = 48;
    pub const EXTENDED_SUPPORTED_RATES: u8 = 50;
    pub const HT_OPERATION: u8 = 61;
    pub const VHT_CAPABILITIES: u8 = 191;
    pub const VHT_OPERATION: u8 = 192;
    pub const VENDOR_SPECIFIC: u8 = 221;
    pub const EXTENSION: u8 = 255;
}

/// What to do when an element declares more body bytes than remain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Fail with [`DecodeError::TruncatedElement`]
    #[default]
    Reject,
    /// Keep the available bytes as the final element and stop
    Clamp,
}

/// One `(id, length, body)` element
///
/// `length` always equals the body length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InformationElement {
    element_id: u8,
    length: u8,
    body: Bytes,
}

/// Unchecked serialized form
#[derive(Deserialize)]
struct RawElement {
    element_id: u8,
    length: u8,
    body: Bytes,
}

impl<'de> Deserialize<'de> for InformationElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawElement::deserialize(deserializer)?;
        Self::from_parts(raw.element_id, raw.length, raw.body).map_err(serde::de::Error::custom)
    }
}

impl InformationElement {
    /// Create an element from a declared length and its body
    pub fn from_parts(element_id: u8, length: u8, body: Bytes) -> Result<Self, DecodeError> {
        if body.len() != length as usize {
            return Err(DecodeError::LengthMismatch {
                element_id,
                declared: length,
                actual: body.len(),
            });
        }
        Ok(Self {
            element_id,
            length,
            body,
        })
    }

    /// Create an element, truncating `body` to 255 bytes
    pub fn new(element_id: u8, body: impl Into<Bytes>) -> Self {
        let mut body: Bytes = body.into();
        body.truncate(u8::MAX as usize);
        Self {
            element_id,
            length: body.len() as u8,
            body,
        }
    }

    pub fn element_id(&self) -> u8 {
        self.element_id
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_vendor_specific(&self) -> bool {
        self.element_id == element_id::VENDOR_SPECIFIC
    }

    /// OUI of a vendor specific element
    pub fn vendor_oui(&self) -> Option<[u8; 3]> {
        if !self.is_vendor_specific() || self.body.len() < 3 {
            return None;
        }
        Some([self.body[0], self.body[1], self.body[2]])
    }

    /// Bytes this element occupies when encoded
    pub fn size(&self) -> usize {
        2 + self.body.len()
    }

    /// Append the encoded element to `buf`
    pub fn serialize(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.element_id);
        buf.put_u8(self.length);
        buf.put_slice(&self.body);
    }
}

impl fmt::Display for InformationElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Element ID: {}", self.element_id)?;
        writeln!(f, "Length: {}", self.length)?;
        write!(f, "Body: {}", self.body.escape_ascii())
    }
}

/// Decode `buffer`, rejecting truncated elements
pub fn decode(buffer: &[u8]) -> Result<Vec<InformationElement>, DecodeError> {
    decode_with(buffer, TruncationPolicy::Reject)
}

/// Decode `buffer` into elements in order of appearance
pub fn decode_with(
    buffer: &[u8],
    policy: TruncationPolicy,
) -> Result<Vec<InformationElement>, DecodeError> {
    let mut elements = Vec::new();
    let mut buf = Bytes::copy_from_slice(buffer);

    while buf.remaining() >= MIN_ELEMENT_SPAN {
        let offset = buffer.len() - buf.remaining();
        let element_id = buf.get_u8();
        let declared = buf.get_u8();

        if buf.remaining() < declared as usize {
            let available = buf.remaining();
            match policy {
                TruncationPolicy::Reject => {
                    return Err(DecodeError::TruncatedElement {
                        offset,
                        declared,
                        available,
                    });
                }
                TruncationPolicy::Clamp => {
                    log::warn!(
                        "Clamping element {} at offset {}: declares {} bytes, {} available",
                        element_id,
                        offset,
                        declared,
                        available
                    );
                    // available < declared <= 255
                    elements.push(InformationElement {
                        element_id,
                        length: available as u8,
                        body: buf.split_to(available),
                    });
                    break;
                }
            }
        }

        let body = buf.split_to(declared as usize);
        elements.push(InformationElement {
            element_id,
            length: declared,
            body,
        });
    }

    if buf.has_remaining() {
        log::trace!("Discarding {} trailing IE bytes", buf.remaining());
    }

    Ok(elements)
}

/// Encode elements into a flat buffer
pub fn encode(elements: &[InformationElement]) -> Vec<u8> {
    let mut out = Vec::with_capacity(elements.iter().map(InformationElement::size).sum());
    for element in elements {
        element.serialize(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_short_buffer() {
        assert!(decode(&[0x01, 0x02]).unwrap().is_empty());
    }

    #[test]
    fn test_exact_single_element() {
        let elements = decode(&[0x00, 0x03, 0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].element_id, 0);
        assert_eq!(elements[0].length, 3);
        assert_eq!(&elements[0].body[..], &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_trailing_padding() {
        let elements = decode(&[0x00, 0x01, 0x7A, 0x05, 0x00]).unwrap();
        assert_eq!(elements, vec![InformationElement::new(0, vec![0x7A])]);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let elements = vec![
            InformationElement::new(element_id::SSID, &b"home"[..]),
            InformationElement::new(element_id::SUPPORTED_RATES, vec![0x82, 0x84, 0x8b, 0x96]),
            InformationElement::new(element_id::DS_PARAMETER_SET, vec![6]),
            InformationElement::new(element_id::VENDOR_SPECIFIC, vec![0x00, 0x50, 0xf2, 0x02]),
        ];
        let buffer = encode(&elements);
        let decoded = decode(&buffer).unwrap();
        assert_eq!(decoded, elements);
        assert_eq!(decode(&buffer).unwrap(), decoded);
    }

    #[test]
    fn test_trailing_empty_element_discarded() {
        // The final (id, 0) element spans two bytes, below the decoder's floor
        let elements = vec![
            InformationElement::new(element_id::SSID, &b"ab"[..]),
            InformationElement::new(element_id::TIM, Bytes::new()),
        ];
        let buffer = encode(&elements);
        assert_eq!(buffer, vec![0x00, 0x02, b'a', b'b', 0x05, 0x00]);
        assert_eq!(decode(&buffer).unwrap(), elements[..1].to_vec());
    }

    #[test]
    fn test_deserialize_checks_length() {
        let element: InformationElement =
            serde_json::from_str(r#"{"element_id":3,"length":1,"body":[6]}"#).unwrap();
        assert_eq!(element, InformationElement::new(element_id::DS_PARAMETER_SET, vec![6]));

        let mismatched = serde_json::from_str::<InformationElement>(r#"{"element_id":0,"length":9,"body":[1]}"#);
        assert!(mismatched.is_err());
    }

    #[test]
    fn test_from_parts() {
        let element = InformationElement::from_parts(element_id::SSID, 2, Bytes::from_static(b"ok")).unwrap();
        assert_eq!(element.length(), 2);
        assert_eq!(&element.body()[..], b"ok");
        assert_eq!(
            InformationElement::from_parts(element_id::SSID, 9, Bytes::from_static(b"x")),
            Err(DecodeError::LengthMismatch {
                element_id: element_id::SSID,
                declared: 9,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_zero_length_element() {
        // An empty SSID element followed by a one-byte element
        let decoded = decode(&[0x00, 0x00, 0x03, 0x01, 0x0b]).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded[0].body.is_empty());
        assert_eq!(decoded[1].element_id, element_id::DS_PARAMETER_SET);
    }

    #[test]
    fn test_truncated_rejected() {
        let buffer = [0x00, 0x01, 0x7A, 0x30, 0x10, 0x01, 0x00];
        assert_eq!(
            decode(&buffer),
            Err(DecodeError::TruncatedElement {
                offset: 3,
                declared: 0x10,
                available: 2,
            })
        );
    }

    #[test]
    fn test_truncated_clamped() {
        let buffer = [0x00, 0x01, 0x7A, 0x30, 0x10, 0x01, 0x00];
        let decoded = decode_with(&buffer, TruncationPolicy::Clamp).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].element_id, element_id::RSN);
        assert_eq!(decoded[1].length, 2);
        assert_eq!(decoded[1].body.len(), decoded[1].length as usize);
    }

    #[test]
    fn test_vendor_oui() {
        let wps = InformationElement::new(element_id::VENDOR_SPECIFIC, vec![0x00, 0x50, 0xf2, 0x04]);
        assert_eq!(wps.vendor_oui(), Some([0x00, 0x50, 0xf2]));
        assert_eq!(InformationElement::new(element_id::SSID, vec![1, 2, 3]).vendor_oui(), None);
    }

    #[test]
    fn test_display() {
        let element = InformationElement::new(element_id::SSID, &b"lab"[..]);
        assert_eq!(element.to_string(), "Element ID: 0\nLength: 3\nBody: lab");
    }

    mod properties {
        use super::*;
        use proptest::{collection::vec, prelude::*};

        fn element() -> impl Strategy<Value = InformationElement> {
            (any::<u8>(), vec(any::<u8>(), 0..=255)).prop_map(|(id, body)| InformationElement::new(id, body))
        }

        /// Sequences whose last element has a body, so none falls under the
        /// three byte floor
        fn sequence() -> impl Strategy<Value = Vec<InformationElement>> {
            (vec(element(), 0..8), any::<u8>(), vec(any::<u8>(), 1..=255)).prop_map(|(mut elements, id, body)| {
                elements.push(InformationElement::new(id, body));
                elements
            })
        }

        proptest! {
            #[test]
            fn test_round_trip_any_sequence(elements in sequence()) {
                let buffer = encode(&elements);
                let decoded = decode(&buffer).unwrap();
                prop_assert_eq!(&decoded, &elements);
                prop_assert_eq!(encode(&decoded), buffer);
            }

            #[test]
            fn test_reencode_drops_only_trailing_empty_element(buffer in vec(any::<u8>(), 0..512)) {
                let decoded = decode_with(&buffer, TruncationPolicy::Clamp).unwrap();
                prop_assert!(decoded.iter().all(|e| e.body().len() == e.length() as usize));
                prop_assert_eq!(decode_with(&buffer, TruncationPolicy::Clamp).unwrap(), decoded.clone());

                let mut expected = decoded.clone();
                if expected.last().map_or(false, |e| e.length() == 0) {
                    expected.pop();
                }
                prop_assert_eq!(decode(&encode(&decoded)).unwrap(), expected);
            }
        }
    }
}
