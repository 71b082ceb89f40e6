//! Identifier Resolver
//!
//! Bestimmt den einen Identifier, mit dem gesucht und (bei remove) entfernt wird.
//! Reihenfolge:
//! 1. expliziter Identifier
//! 2. `PayloadIdentifier` des Profil-Dokuments
//! 3. `profile_name`
//!
//! Außerdem werden hier die Voraussetzungen der Aktion geprüft, bevor irgendein
//! Kommando läuft.

use profilectl_config::{ProfileAction, BUNDLE_EXTENSION};

use crate::state::{DesiredProfile, DesiredProfileRequest, Profile};
use crate::temp::sanitize_stem;
use crate::ProfileError;

/// Was mit dem Identifier passieren soll.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Install(DesiredProfile),
    Remove,
}

/// Ein Request mit aufgelöstem Identifier und geprüften Voraussetzungen.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub identifier: String,
    pub intent: Intent,
}

/// Reine Auflösung nach Priorität; leere Strings zählen als nicht gesetzt.
pub fn resolve_identifier(request: &DesiredProfileRequest) -> Result<String, ProfileError> {
    let explicit = request
        .explicit_identifier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    explicit
        .or_else(|| request.profile.as_ref().and_then(|doc| doc.payload_identifier()))
        .or_else(|| {
            let name = request.profile_name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .ok_or_else(|| ProfileError::Config("no identifier, profile or profile_name given".to_string()))
}

/// Löst den Identifier auf und prüft die Voraussetzungen der Aktion.
pub fn resolve(request: &DesiredProfileRequest) -> Result<ResolvedRequest, ProfileError> {
    let identifier = resolve_identifier(request)?;

    let intent = match request.action {
        ProfileAction::Install => {
            let document = request.profile.clone().ok_or_else(|| ProfileError::MissingProfile {
                profile_name: request.profile_name.clone(),
            })?;

            // Auch mit Override braucht das Profil seinen eigenen Identifier
            let profile = Profile::from_bundle(&document.payload)?;

            Intent::Install(DesiredProfile {
                profile,
                document,
                file_stem: sanitize_stem(&request.profile_name),
            })
        }
        ProfileAction::Remove => {
            // Ein Bundle-Dateiname ist nie ein Identifier, alles andere geht an `profiles -R`
            if is_bundle_name(&identifier) {
                return Err(ProfileError::InvalidIdentifier(identifier));
            }
            Intent::Remove
        }
    };

    Ok(ResolvedRequest { identifier, intent })
}

/// `screensaver.mobileconfig` statt `com.example.screensaver`.
pub fn is_bundle_name(candidate: &str) -> bool {
    candidate.ends_with(BUNDLE_EXTENSION)
}
