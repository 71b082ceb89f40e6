//! Desired State - Was laut Deklaration installiert sein sollte
//!
//! Der DesiredProfileRequest wird einmal pro Lauf aus der Deklaration gebaut
//! (siehe [`crate::source`]) und danach nicht mehr verändert.

use std::path::PathBuf;

use plist::Dictionary;
use profilectl_config::ProfileAction;

use super::profile::{string_field, Profile, ProfileSchema};

/// Woher ein Profil-Dokument stammt.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOrigin {
    /// Inline in der Deklaration
    Inline,
    /// Aus einer `.mobileconfig` Datei
    Bundle(PathBuf),
}

/// Ein Profil im Bundle-Schema (`Payload*`), so wie es installiert werden soll.
///
/// Das Dictionary wird beim Install unverändert auf die Platte geschrieben,
/// auch Keys die [`Profile`] nicht kennt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDocument {
    pub payload: Dictionary,
    pub origin: ProfileOrigin,
}

impl ProfileDocument {
    pub fn inline(payload: Dictionary) -> Self {
        Self {
            payload,
            origin: ProfileOrigin::Inline,
        }
    }

    pub fn bundle(payload: Dictionary, path: PathBuf) -> Self {
        Self {
            payload,
            origin: ProfileOrigin::Bundle(path),
        }
    }

    /// `PayloadIdentifier`, falls vorhanden und nicht leer
    pub fn payload_identifier(&self) -> Option<String> {
        string_field(&self.payload, &ProfileSchema::Bundle.key("Identifier"))
    }

    /// `PayloadUUID`, falls vorhanden und nicht leer
    pub fn payload_uuid(&self) -> Option<String> {
        string_field(&self.payload, &ProfileSchema::Bundle.key("UUID"))
    }
}

/// Die normalisierte Absicht des Aufrufers.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredProfileRequest {
    /// Fallback-Identifier und Dateiname-Stamm für das Install-Bundle
    pub profile_name: String,
    /// Inline-Profil oder geladenes Bundle; `None` bei reinem Namen
    pub profile: Option<ProfileDocument>,
    /// Expliziter Identifier, schlägt alles andere
    pub explicit_identifier: Option<String>,
    pub action: ProfileAction,
}

impl DesiredProfileRequest {
    pub fn new(profile_name: impl Into<String>, action: ProfileAction) -> Self {
        Self {
            profile_name: profile_name.into(),
            profile: None,
            explicit_identifier: None,
            action,
        }
    }

    pub fn with_profile(mut self, profile: ProfileDocument) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.explicit_identifier = Some(identifier.into());
        self
    }
}

/// Ein validiertes Profil das installiert werden soll.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredProfile {
    pub profile: Profile,
    pub document: ProfileDocument,
    /// Dateiname-Stamm der Temp-Datei
    pub file_stem: String,
}
