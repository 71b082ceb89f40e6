//! Reconcile Module - Pure Function für die Convergence-Entscheidung
//!
//! Dieses Modul enthält die reconcile() Funktion und die Decision-Typen.
//!
//! Die reconcile() Funktion ist eine **pure function**:
//! - Keine Side Effects
//! - Deterministisch
//! - Perfekt testbar ohne Mocks

mod decision;

pub use decision::{ConvergenceDecision, Decision, Rationale};

use crate::identifier::{Intent, ResolvedRequest};
use crate::state::InstalledProfileSet;

/// Berechnet die Decision basierend auf Ist/Soll-Zustand.
///
/// # Arguments
///
/// * `request` - Der aufgelöste Request (Identifier + Absicht)
/// * `installed` - Der Snapshot von `profiles -P`
///
/// # Example
///
/// ```ignore
/// let resolved = identifier::resolve(&request)?;
/// let installed = inventory::query_installed_profiles(&backend, &codec, &temp).await?;
///
/// let decision = reconcile(&resolved, &installed);
/// executor::execute_decision(&decision, &backend, &codec, &temp).await?;
/// ```
pub fn reconcile(request: &ResolvedRequest, installed: &InstalledProfileSet) -> ConvergenceDecision {
    let matches = installed.find_by_identifier(&request.identifier);

    let (decision, rationale) = match &request.intent {
        Intent::Install(desired) => {
            if matches.is_empty() {
                (Decision::Install(desired.clone()), Rationale::NotInstalled)
            } else if matches.iter().any(|p| p.uuid == desired.profile.uuid) {
                // Gleiche UUID = gleiche Revision, Inhalt wird nicht verglichen
                (Decision::NoOp, Rationale::AlreadyInstalled)
            } else {
                // `profiles -I` überschreibt per Identifier
                let installed_uuids = matches.iter().map(|p| p.uuid.clone()).collect();
                (
                    Decision::Install(desired.clone()),
                    Rationale::RevisionChanged { installed_uuids },
                )
            }
        }
        Intent::Remove => (
            Decision::Remove(request.identifier.clone()),
            Rationale::RemoveRequested {
                was_installed: !matches.is_empty(),
            },
        ),
    };

    ConvergenceDecision {
        identifier: request.identifier.clone(),
        decision,
        rationale,
    }
}
