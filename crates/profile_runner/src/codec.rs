//! Plist Codec - Bytes <-> verschachtelte Map

use std::io::Cursor;

use plist::Value;

use crate::ProfileError;

/// Dekodiert und kodiert plist-Dokumente.
/// Ermöglicht Fakes in Tests.
pub trait PlistCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Value, ProfileError>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, ProfileError>;
}

/// Liest XML- und Binär-plists, schreibt XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlPlistCodec;

impl PlistCodec for XmlPlistCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, ProfileError> {
        Ok(Value::from_reader(Cursor::new(bytes))?)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, ProfileError> {
        let mut buf = Vec::new();
        value.to_writer_xml(&mut buf)?;
        Ok(buf)
    }
}
