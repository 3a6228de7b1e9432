use bytes::Buf;

use crate::error::{Amf0Error, Result};
use crate::value::Amf0Value;

/// AMF0 type markers.
mod marker {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIECLIP: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
    pub const XML_DOCUMENT: u8 = 0x0F;
    pub const TYPED_OBJECT: u8 = 0x10;
}

/// Decode every value in `payload`.
///
/// Stops at the first malformed value and returns whatever decoded
/// cleanly before it; the failure is logged, never propagated. Control
/// payloads only feed diagnostics, so a bad one must not kill the run.
pub fn decode_all(payload: &[u8]) -> Vec<Amf0Value> {
    let mut decoder = Decoder::new(payload);
    let mut values = Vec::new();

    while decoder.has_remaining() {
        let offset = decoder.offset();
        match decoder.decode_item() {
            Ok(Item::Value(value)) => values.push(value),
            Ok(Item::ObjectEnd) => {
                let err = Amf0Error::UnexpectedObjectEnd { offset };
                tracing::warn!(error = %err, decoded = values.len(), "AMF0 decode stopped early");
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, decoded = values.len(), "AMF0 decode stopped early");
                break;
            }
        }
    }

    values
}

/// One decoded unit inside an object body: a value, or the end marker
/// terminating the body. The end marker never escapes this module.
enum Item {
    Value(Amf0Value),
    ObjectEnd,
}

/// Cursor over one payload plus the reference table scoped to it.
struct Decoder<'a> {
    buf: &'a [u8],
    len: usize,
    table: Vec<Amf0Value>,
}

impl<'a> Decoder<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            buf: payload,
            len: payload.len(),
            table: Vec::new(),
        }
    }

    fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn offset(&self) -> usize {
        self.len - self.buf.remaining()
    }

    fn need(&self, bytes: usize) -> Result<()> {
        if self.buf.remaining() < bytes {
            return Err(Amf0Error::UnexpectedEof {
                offset: self.offset(),
            });
        }
        Ok(())
    }

    fn take_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn take_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    fn take_i16(&mut self) -> Result<i16> {
        self.need(2)?;
        Ok(self.buf.get_i16())
    }

    fn take_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    fn take_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    /// Read `len` bytes as UTF-8, substituting malformed sequences.
    fn take_string(&mut self, len: usize) -> Result<String> {
        self.need(len)?;
        let raw = self.buf.copy_to_bytes(len);
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    fn short_string(&mut self) -> Result<String> {
        let len = self.take_u16()? as usize;
        self.take_string(len)
    }

    fn long_string(&mut self) -> Result<String> {
        let len = self.take_u32()? as usize;
        self.take_string(len)
    }

    /// Read `(key, value)` pairs until the end marker closes the body.
    fn object_entries(&mut self) -> Result<Vec<(String, Amf0Value)>> {
        let mut entries = Vec::new();
        loop {
            let key = self.short_string()?;
            match self.decode_item()? {
                Item::Value(value) => entries.push((key, value)),
                Item::ObjectEnd => return Ok(entries),
            }
        }
    }

    /// Completed composites join the reference table in decode order.
    fn remember(&mut self, value: Amf0Value) -> Amf0Value {
        self.table.push(value.clone());
        value
    }

    fn decode_item(&mut self) -> Result<Item> {
        let marker_offset = self.offset();
        let marker = self.take_u8()?;

        let value = match marker {
            marker::NUMBER => Amf0Value::Number(self.take_f64()?),
            marker::BOOLEAN => Amf0Value::Boolean(self.take_u8()? != 0),
            marker::STRING => Amf0Value::String(self.short_string()?),
            marker::OBJECT => {
                let entries = self.object_entries()?;
                self.remember(Amf0Value::Object(entries))
            }
            marker::MOVIECLIP => Amf0Value::MovieClip(self.short_string()?),
            marker::NULL => Amf0Value::Null,
            marker::UNDEFINED => Amf0Value::Undefined,
            marker::REFERENCE => {
                let index = self.take_u16()?;
                self.table
                    .get(index as usize)
                    .cloned()
                    .ok_or(Amf0Error::ReferenceOutOfRange {
                        index,
                        len: self.table.len(),
                    })?
            }
            marker::ECMA_ARRAY => {
                // The leading 32-bit entry count is advisory; the body is
                // still terminated by the end marker.
                self.need(4)?;
                self.buf.advance(4);
                let entries = self.object_entries()?;
                self.remember(Amf0Value::EcmaArray(entries))
            }
            marker::OBJECT_END => return Ok(Item::ObjectEnd),
            marker::STRICT_ARRAY => {
                let count = self.take_u32()?;
                let mut values = Vec::new();
                for _ in 0..count {
                    match self.decode_item()? {
                        Item::Value(value) => values.push(value),
                        Item::ObjectEnd => {
                            return Err(Amf0Error::UnexpectedObjectEnd {
                                offset: self.offset(),
                            })
                        }
                    }
                }
                self.remember(Amf0Value::StrictArray(values))
            }
            marker::DATE => {
                let millis = self.take_f64()?;
                let timezone = self.take_i16()?;
                Amf0Value::Date { millis, timezone }
            }
            marker::LONG_STRING => Amf0Value::String(self.long_string()?),
            marker::XML_DOCUMENT => Amf0Value::XmlDocument(self.long_string()?),
            marker::TYPED_OBJECT => {
                let class_name = self.short_string()?;
                let entries = self.object_entries()?;
                self.remember(Amf0Value::TypedObject {
                    class_name,
                    entries,
                })
            }
            other => {
                return Err(Amf0Error::UnknownMarker {
                    marker: other,
                    offset: marker_offset,
                })
            }
        };

        Ok(Item::Value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_str(s: &str) -> Vec<u8> {
        let mut out = vec![];
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn number(n: f64) -> Vec<u8> {
        let mut out = vec![marker::NUMBER];
        out.extend_from_slice(&n.to_be_bytes());
        out
    }

    fn object_end() -> Vec<u8> {
        vec![0x00, 0x00, marker::OBJECT_END]
    }

    #[test]
    fn decodes_scalars() {
        let mut wire = number(42.5);
        wire.push(marker::BOOLEAN);
        wire.push(0x01);
        wire.push(marker::STRING);
        wire.extend_from_slice(&short_str("hello"));

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![
                Amf0Value::Number(42.5),
                Amf0Value::Boolean(true),
                Amf0Value::String("hello".to_string()),
            ]
        );
        assert_eq!(values[0].as_number(), Some(42.5));
        assert_eq!(values[1].as_number(), None);
        assert_eq!(values[2].as_str(), Some("hello"));
    }

    #[test]
    fn null_and_undefined_are_distinct() {
        let values = decode_all(&[marker::NULL, marker::UNDEFINED]);
        assert_eq!(values, vec![Amf0Value::Null, Amf0Value::Undefined]);
        assert_ne!(values[0], values[1]);
    }

    #[test]
    fn decodes_object() {
        let mut wire = vec![marker::OBJECT];
        wire.extend_from_slice(&short_str("width"));
        wire.extend_from_slice(&number(1280.0));
        wire.extend_from_slice(&short_str("codec"));
        wire.push(marker::STRING);
        wire.extend_from_slice(&short_str("avc1"));
        wire.extend_from_slice(&object_end());

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![Amf0Value::Object(vec![
                ("width".to_string(), Amf0Value::Number(1280.0)),
                ("codec".to_string(), Amf0Value::String("avc1".to_string())),
            ])]
        );
    }

    #[test]
    fn ecma_array_ignores_advisory_count() {
        let mut wire = vec![marker::ECMA_ARRAY, 0xFF, 0xFF, 0xFF, 0xFF];
        wire.extend_from_slice(&short_str("k"));
        wire.extend_from_slice(&number(1.0));
        wire.extend_from_slice(&object_end());

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![Amf0Value::EcmaArray(vec![(
                "k".to_string(),
                Amf0Value::Number(1.0)
            )])]
        );
    }

    #[test]
    fn typed_object_keeps_class_name() {
        let mut wire = vec![marker::TYPED_OBJECT];
        wire.extend_from_slice(&short_str("flash.Thing"));
        wire.extend_from_slice(&short_str("x"));
        wire.push(marker::NULL);
        wire.extend_from_slice(&object_end());

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![Amf0Value::TypedObject {
                class_name: "flash.Thing".to_string(),
                entries: vec![("x".to_string(), Amf0Value::Null)],
            }]
        );
    }

    #[test]
    fn strict_array_decodes_count_values() {
        let mut wire = vec![marker::STRICT_ARRAY, 0x00, 0x00, 0x00, 0x02];
        wire.extend_from_slice(&number(1.0));
        wire.extend_from_slice(&number(2.0));

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![Amf0Value::StrictArray(vec![
                Amf0Value::Number(1.0),
                Amf0Value::Number(2.0),
            ])]
        );
    }

    #[test]
    fn date_has_signed_timezone() {
        let mut wire = vec![marker::DATE];
        wire.extend_from_slice(&1234.0f64.to_be_bytes());
        wire.extend_from_slice(&(-300i16).to_be_bytes());

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![Amf0Value::Date {
                millis: 1234.0,
                timezone: -300,
            }]
        );
    }

    #[test]
    fn long_string_and_xml_document() {
        let mut wire = vec![marker::LONG_STRING, 0x00, 0x00, 0x00, 0x03];
        wire.extend_from_slice(b"abc");
        wire.push(marker::XML_DOCUMENT);
        wire.extend_from_slice(&3u32.to_be_bytes());
        wire.extend_from_slice(b"<x>");

        let values = decode_all(&wire);
        assert_eq!(
            values,
            vec![
                Amf0Value::String("abc".to_string()),
                Amf0Value::XmlDocument("<x>".to_string()),
            ]
        );
    }

    #[test]
    fn movieclip_is_tagged_distinctly() {
        let mut wire = vec![marker::MOVIECLIP];
        wire.extend_from_slice(&short_str("clip1"));

        let values = decode_all(&wire);
        assert_eq!(values, vec![Amf0Value::MovieClip("clip1".to_string())]);
        assert_ne!(values[0], Amf0Value::String("clip1".to_string()));
    }

    #[test]
    fn lossy_string_decoding_never_fails() {
        let mut wire = vec![marker::STRING, 0x00, 0x02, 0xFF, 0xFE];
        wire.extend_from_slice(&number(7.0));

        let values = decode_all(&wire);
        assert_eq!(values.len(), 2);
        assert!(matches!(values[0], Amf0Value::String(_)));
        assert_eq!(values[1], Amf0Value::Number(7.0));
    }

    #[test]
    fn reference_resolves_to_completed_object() {
        let mut wire = vec![marker::OBJECT];
        wire.extend_from_slice(&short_str("a"));
        wire.extend_from_slice(&number(1.0));
        wire.extend_from_slice(&object_end());
        wire.push(marker::REFERENCE);
        wire.extend_from_slice(&0u16.to_be_bytes());

        let values = decode_all(&wire);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], values[1]);
    }

    #[test]
    fn nested_reference_resolves_to_earlier_composite() {
        // Object A at table index 0, then object B whose "again" entry
        // references A.
        let mut wire = vec![marker::OBJECT];
        wire.extend_from_slice(&short_str("a"));
        wire.extend_from_slice(&number(1.0));
        wire.extend_from_slice(&object_end());
        wire.push(marker::OBJECT);
        wire.extend_from_slice(&short_str("again"));
        wire.push(marker::REFERENCE);
        wire.extend_from_slice(&0u16.to_be_bytes());
        wire.extend_from_slice(&object_end());

        let values = decode_all(&wire);
        assert_eq!(values.len(), 2);
        let Amf0Value::Object(entries) = &values[1] else {
            panic!("expected object, got {:?}", values[1]);
        };
        assert_eq!(entries[0].1, values[0]);
    }

    #[test]
    fn forward_reference_is_a_decode_error() {
        // A reference to index 0 before any composite completed.
        let mut wire = vec![marker::REFERENCE, 0x00, 0x00];
        wire.extend_from_slice(&number(1.0));

        let values = decode_all(&wire);
        assert!(values.is_empty());
    }

    #[test]
    fn truncated_string_keeps_earlier_values() {
        let mut wire = number(9.0);
        // Claims 100 bytes, provides 10.
        wire.push(marker::STRING);
        wire.extend_from_slice(&100u16.to_be_bytes());
        wire.extend_from_slice(&[0x61; 10]);

        let values = decode_all(&wire);
        assert_eq!(values, vec![Amf0Value::Number(9.0)]);
    }

    #[test]
    fn unknown_marker_stops_decoding() {
        let mut wire = number(3.0);
        wire.push(0x2A);

        let values = decode_all(&wire);
        assert_eq!(values, vec![Amf0Value::Number(3.0)]);
    }

    #[test]
    fn unknown_marker_error_names_offset() {
        let mut decoder = Decoder::new(&[0x2A]);
        let err = match decoder.decode_item() {
            Err(err) => err,
            Ok(_) => panic!("marker 0x2A should not decode"),
        };
        assert!(matches!(
            err,
            Amf0Error::UnknownMarker {
                marker: 0x2A,
                offset: 0
            }
        ));
    }

    #[test]
    fn top_level_object_end_stops_decoding() {
        let mut wire = number(1.0);
        wire.push(marker::OBJECT_END);
        wire.extend_from_slice(&number(2.0));

        let values = decode_all(&wire);
        assert_eq!(values, vec![Amf0Value::Number(1.0)]);
    }

    #[test]
    fn empty_payload_decodes_to_nothing() {
        assert!(decode_all(&[]).is_empty());
    }
}
