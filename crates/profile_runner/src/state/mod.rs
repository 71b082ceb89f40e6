//! State Module - Datenstrukturen für die Reconciliation
//!
//! Dieses Modul enthält die Datenstrukturen für:
//! - **DesiredProfileRequest**: Was laut Deklaration installiert sein sollte
//! - **InstalledProfileSet**: Was `profiles -P` tatsächlich sagt
//! - **Profile**: Der gemeinsame Datensatz für beide Sichten

mod desired;
mod installed;
mod profile;

pub use desired::{DesiredProfile, DesiredProfileRequest, ProfileDocument, ProfileOrigin};
pub use installed::{InstalledProfileSet, COMPUTER_LEVEL_SCOPE};
pub use profile::{Profile, ProfileSchema};
