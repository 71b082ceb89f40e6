//! Decision - Ergebnis der reconcile() Funktion
//!
//! Eine Decision beschreibt was der Executor tun soll, die Rationale warum.

use crate::command::ProfilesCommand;
use crate::state::DesiredProfile;

/// Was getan werden muss, um vom Ist- zum Soll-Zustand zu gelangen.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nichts zu tun
    NoOp,
    /// Profil installieren (neu oder ersetzen)
    Install(DesiredProfile),
    /// Profil per Identifier entfernen
    Remove(String),
}

/// Warum die Decision so ausgefallen ist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rationale {
    /// Identifier und UUID stimmen mit einem installierten Profil überein
    AlreadyInstalled,
    /// Kein installiertes Profil mit diesem Identifier
    NotInstalled,
    /// Identifier installiert, aber in anderer Revision
    RevisionChanged {
        /// UUIDs der installierten Profile mit diesem Identifier
        installed_uuids: Vec<String>,
    },
    /// Remove wird immer ausgeführt
    RemoveRequested {
        /// War der Identifier im Inventory?
        was_installed: bool,
    },
}

/// Die Decision plus der betrachtete Identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceDecision {
    pub identifier: String,
    pub decision: Decision,
    pub rationale: Rationale,
}

impl ConvergenceDecision {
    /// Ändert die Decision etwas am System?
    pub fn is_change(&self) -> bool {
        !matches!(self.decision, Decision::NoOp)
    }

    /// Kommando zum Entfernen; Install braucht erst einen Pfad, siehe Executor.
    pub fn remove_command(&self) -> Option<ProfilesCommand> {
        match &self.decision {
            Decision::Remove(identifier) => Some(ProfilesCommand::Remove {
                identifier: identifier.clone(),
            }),
            _ => None,
        }
    }

    /// Kurze Beschreibung für Ausgabe und Logs.
    pub fn summary(&self) -> String {
        match (&self.decision, &self.rationale) {
            (Decision::NoOp, _) => format!("profile {} is up to date", self.identifier),
            (Decision::Install(desired), Rationale::RevisionChanged { installed_uuids }) => format!(
                "replace profile {} ({} -> {})",
                self.identifier,
                installed_uuids.join(", "),
                desired.profile.uuid
            ),
            (Decision::Install(desired), _) => format!(
                "install profile {} ({})",
                self.identifier, desired.profile.uuid
            ),
            (Decision::Remove(identifier), Rationale::RemoveRequested { was_installed: false }) => {
                format!("remove profile {} (not installed)", identifier)
            }
            (Decision::Remove(identifier), _) => format!("remove profile {}", identifier),
        }
    }
}
