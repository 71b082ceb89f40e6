//! ProfileProvider - Haupt-Controller für einen Convergence-Lauf
//!
//! Ein Lauf ist ein einziger Durchgang:
//! 1. Identifier auflösen und Voraussetzungen prüfen
//! 2. Hole aktuellen Zustand (`profiles -P`)
//! 3. Berechne Decision (reconcile)
//! 4. Führe Decision aus (oder beschreibe sie im Dry-Run)

use crate::codec::PlistCodec;
use crate::controller::executor::{execute_decision, plan_decision, ExecuteResult};
use crate::identifier;
use crate::inventory::query_installed_profiles;
use crate::reconcile::{reconcile, ConvergenceDecision};
use crate::state::DesiredProfileRequest;
use crate::temp::TempFiles;
use crate::{ProfileError, ProfilesBackend};

/// Ergebnis eines Laufs
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergeReport {
    pub decision: ConvergenceDecision,
    pub result: ExecuteResult,
}

impl ConvergeReport {
    /// Wurde das System verändert?
    pub fn changed(&self) -> bool {
        matches!(self.result, ExecuteResult::Executed(_))
    }
}

/// Bringt das System für genau eine Deklaration in den Soll-Zustand.
pub struct ProfileProvider<B: ProfilesBackend, C: PlistCodec> {
    backend: B,
    codec: C,
    temp: TempFiles,
    dry_run: bool,
}

impl<B: ProfilesBackend, C: PlistCodec> ProfileProvider<B, C> {
    pub fn new(backend: B, codec: C, temp: TempFiles) -> Self {
        Self {
            backend,
            codec,
            temp,
            dry_run: false,
        }
    }

    /// Im Dry-Run wird nur `profiles -P` ausgeführt.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fragt den Ist-Zustand ab und berechnet die Decision, ohne etwas zu ändern.
    pub async fn decide(&self, request: &DesiredProfileRequest) -> Result<ConvergenceDecision, ProfileError> {
        // Konfigurationsfehler vor jedem Kommando melden
        let resolved = identifier::resolve(request)?;
        tracing::debug!(identifier = %resolved.identifier, action = request.action.as_str(), "resolved identifier");

        let installed = query_installed_profiles(&self.backend, &self.codec, &self.temp).await?;

        Ok(reconcile(&resolved, &installed))
    }

    /// Führt einen kompletten Lauf aus.
    pub async fn converge(&self, request: &DesiredProfileRequest) -> Result<ConvergeReport, ProfileError> {
        let decision = self.decide(request).await?;

        tracing::info!(
            identifier = %decision.identifier,
            rationale = ?decision.rationale,
            dry_run = self.dry_run,
            "{}",
            decision.summary()
        );

        let result = if self.dry_run {
            plan_decision(&decision, &self.temp)
        } else {
            execute_decision(&decision, &self.backend, &self.codec, &self.temp).await?
        };

        Ok(ConvergeReport { decision, result })
    }
}
