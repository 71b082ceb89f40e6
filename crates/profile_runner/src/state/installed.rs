//! Installed State - Was `profiles -P` tatsächlich sagt
//!
//! Das InstalledProfileSet ist ein Snapshot: pro Abfrage wird ein neues gebaut,
//! danach wird es nicht mehr verändert.

use std::collections::BTreeMap;

use plist::Value;

use super::profile::Profile;
use crate::ProfileError;

/// Scope der systemweit installierten Profile.
pub const COMPUTER_LEVEL_SCOPE: &str = "_computerlevel";

/// Alle installierten Profile, gruppiert nach Scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledProfileSet {
    scopes: BTreeMap<String, Vec<Profile>>,
}

impl InstalledProfileSet {
    pub fn new(scopes: BTreeMap<String, Vec<Profile>>) -> Self {
        Self { scopes }
    }

    /// Baut den Snapshot aus der dekodierten Ausgabe von `profiles -P`.
    pub fn from_plist(root: &Value) -> Result<Self, ProfileError> {
        let root = root.as_dictionary().ok_or_else(|| {
            ProfileError::Inventory("expected a dictionary keyed by scope".to_string())
        })?;

        let mut scopes = BTreeMap::new();
        for (scope, records) in root.iter() {
            let records = records.as_array().ok_or_else(|| {
                ProfileError::Inventory(format!("scope '{}' is not an array", scope))
            })?;

            let profiles = records
                .iter()
                .map(|record| {
                    record
                        .as_dictionary()
                        .ok_or_else(|| {
                            ProfileError::Inventory(format!(
                                "scope '{}' contains a non-dictionary record",
                                scope
                            ))
                        })
                        .and_then(Profile::from_installed)
                })
                .collect::<Result<Vec<_>, _>>()?;

            scopes.insert(scope.clone(), profiles);
        }

        Ok(Self { scopes })
    }

    /// Alle Profile mit diesem Identifier, über alle Scopes.
    ///
    /// Normalerweise null oder eins; Duplikate unterscheiden sich nur per UUID.
    pub fn find_by_identifier(&self, identifier: &str) -> Vec<&Profile> {
        self.iter()
            .filter(|(_, p)| p.identifier == identifier)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn scope(&self, name: &str) -> &[Profile] {
        self.scopes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// (Scope, Profil) in Scope-Reihenfolge
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.scopes
            .iter()
            .flat_map(|(scope, profiles)| profiles.iter().map(move |p| (scope.as_str(), p)))
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
