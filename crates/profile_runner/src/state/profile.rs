//! Profile - gemeinsamer Datensatz für installierte und gewünschte Profile
//!
//! `profiles -P` liefert `Profile*`-Keys, Bundles benutzen `Payload*`-Keys.
//! Beide werden hier auf denselben [`Profile`] normalisiert.

use plist::{Dictionary, Value};

use crate::ProfileError;

/// Welche Key-Variante ein Dictionary benutzt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSchema {
    /// Sicht des Systems (`profiles -P`): `ProfileIdentifier`, `ProfileUUID`, ...
    Installed,
    /// Sicht des Bundles (`.mobileconfig`): `PayloadIdentifier`, `PayloadUUID`, ...
    Bundle,
}

impl ProfileSchema {
    fn prefix(self) -> &'static str {
        match self {
            Self::Installed => "Profile",
            Self::Bundle => "Payload",
        }
    }

    /// Vollständiger Key für ein Feld, z.B. `key("UUID")` -> `PayloadUUID`.
    pub fn key(self, field: &str) -> String {
        format!("{}{}", self.prefix(), field)
    }

    pub fn content_key(self) -> &'static str {
        match self {
            Self::Installed => "ProfileItems",
            Self::Bundle => "PayloadContent",
        }
    }

    fn missing(self, field: &str) -> ProfileError {
        match (self, field) {
            (Self::Bundle, "Identifier") => ProfileError::MissingIdentifier,
            (Self::Bundle, "UUID") => ProfileError::MissingUuid,
            (schema, field) => ProfileError::Inventory(format!(
                "installed profile record without {}",
                schema.key(field)
            )),
        }
    }
}

/// Ein Konfigurationsprofil.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Stabiler Name über alle Revisionen, nie leer
    pub identifier: String,
    /// Pro Revision neu vergeben
    pub uuid: String,
    pub display_name: String,
    pub removal_disallowed: bool,
    /// z.B. "Configuration"
    pub profile_type: String,
    /// Payload, unverändert durchgereicht
    pub content: Value,
}

impl Profile {
    pub fn from_installed(dict: &Dictionary) -> Result<Self, ProfileError> {
        Self::from_dictionary(dict, ProfileSchema::Installed)
    }

    pub fn from_bundle(dict: &Dictionary) -> Result<Self, ProfileError> {
        Self::from_dictionary(dict, ProfileSchema::Bundle)
    }

    pub fn from_dictionary(dict: &Dictionary, schema: ProfileSchema) -> Result<Self, ProfileError> {
        let required = |field: &str| -> Result<String, ProfileError> {
            string_field(dict, &schema.key(field)).ok_or_else(|| schema.missing(field))
        };

        Ok(Self {
            identifier: required("Identifier")?,
            uuid: required("UUID")?,
            display_name: string_field(dict, &schema.key("DisplayName")).unwrap_or_default(),
            removal_disallowed: dict
                .get(&schema.key("RemovalDisallowed"))
                .map(truthy)
                .unwrap_or(false),
            profile_type: string_field(dict, &schema.key("Type"))
                .unwrap_or_else(|| "Configuration".to_string()),
            content: dict
                .get(schema.content_key())
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        })
    }
}

/// Nicht-leerer String-Wert eines Keys.
pub(crate) fn string_field(dict: &Dictionary, key: &str) -> Option<String> {
    dict.get(key)
        .and_then(Value::as_string)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// `profiles -P` liefert "true"/"false" als String, Bundles echte Booleans
fn truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Integer(i) => i.as_signed() == Some(1),
        _ => false,
    }
}
