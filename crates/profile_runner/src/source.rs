//! Profile Source Resolver
//!
//! Macht aus einer [`ProfileDeclaration`] einen [`DesiredProfileRequest`]:
//! - `profile` als Inline-Tabelle -> Dokument aus der Tabelle
//! - `profile` als Pfad -> Bundle laden
//! - kein `profile`, aber `profile_name` endet auf `.mobileconfig` -> Bundle laden
//! - sonst: nur ein Name, kein Dokument

use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};
use profilectl_config::{ProfileDeclaration, ProfileSource, BUNDLE_EXTENSION};

use crate::codec::PlistCodec;
use crate::state::{DesiredProfileRequest, ProfileDocument};
use crate::ProfileError;

/// Normalisiert die Deklaration. `bundle_dir` ist die Basis für relative Bundle-Pfade.
pub fn resolve_request(
    declaration: &ProfileDeclaration,
    bundle_dir: &Path,
    codec: &dyn PlistCodec,
) -> Result<DesiredProfileRequest, ProfileError> {
    declaration.validate()?;

    let profile = match &declaration.profile {
        Some(ProfileSource::Inline(table)) => Some(ProfileDocument::inline(table_to_dictionary(table))),
        Some(ProfileSource::Bundle(path)) => Some(load_bundle(&bundle_dir.join(path), codec)?),
        None if declaration.profile_name.ends_with(BUNDLE_EXTENSION) => Some(load_bundle(
            &bundle_dir.join(&declaration.profile_name),
            codec,
        )?),
        None => None,
    };

    Ok(DesiredProfileRequest {
        profile_name: declaration.profile_name.clone(),
        profile,
        explicit_identifier: declaration.identifier.clone(),
        action: declaration.action,
    })
}

/// Liest eine `.mobileconfig` Datei.
pub fn load_bundle(path: &Path, codec: &dyn PlistCodec) -> Result<ProfileDocument, ProfileError> {
    if !path.to_string_lossy().ends_with(BUNDLE_EXTENSION) {
        return Err(ProfileError::Config(format!(
            "'{}' is not a valid profile",
            path.display()
        )));
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ProfileError::Config(format!(
                "bundle '{}' not found",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let payload = codec
        .decode(&bytes)
        .map_err(|e| ProfileError::Config(format!("bundle '{}' is not readable: {}", path.display(), e)))?
        .into_dictionary()
        .ok_or_else(|| {
            ProfileError::Config(format!("bundle '{}' is not a dictionary", path.display()))
        })?;

    tracing::debug!(path = %path.display(), "loaded profile bundle");
    Ok(ProfileDocument::bundle(payload, PathBuf::from(path)))
}

/// Wandelt eine TOML-Tabelle in ein plist-Dictionary.
pub fn table_to_dictionary(table: &toml::Table) -> Dictionary {
    let mut dict = Dictionary::new();
    for (key, value) in table {
        dict.insert(key.clone(), toml_to_plist(value));
    }
    dict
}

fn toml_to_plist(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::Real(*f),
        toml::Value::Boolean(b) => Value::Boolean(*b),
        // plist-Dates aus TOML sind selten, als String durchreichen
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_plist).collect()),
        toml::Value::Table(table) => Value::Dictionary(table_to_dictionary(table)),
    }
}
