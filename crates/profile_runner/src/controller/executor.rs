//! Action Executor - Führt Decisions aus
//!
//! Der Executor ist verantwortlich für die tatsächliche Ausführung der
//! vom Reconciler berechneten Decision. Genau ein Kommando pro Decision,
//! keine Retries.

use plist::Value;

use crate::codec::PlistCodec;
use crate::command::ProfilesCommand;
use crate::reconcile::{ConvergenceDecision, Decision};
use crate::state::DesiredProfile;
use crate::temp::TempFiles;
use crate::{ProfileError, ProfilesBackend};

/// Ergebnis einer Ausführung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResult {
    /// Nichts zu tun gewesen
    Unchanged,
    /// Kommando wurde erfolgreich ausgeführt
    Executed(ProfilesCommand),
    /// Dry-Run: dieses Kommando wäre ausgeführt worden
    WouldExecute(ProfilesCommand),
}

impl ExecuteResult {
    pub fn command(&self) -> Option<&ProfilesCommand> {
        match self {
            Self::Unchanged => None,
            Self::Executed(cmd) | Self::WouldExecute(cmd) => Some(cmd),
        }
    }
}

/// Führt eine Decision aus.
pub async fn execute_decision<B: ProfilesBackend + ?Sized, C: PlistCodec + ?Sized>(
    decision: &ConvergenceDecision,
    backend: &B,
    codec: &C,
    temp: &TempFiles,
) -> Result<ExecuteResult, ProfileError> {
    match &decision.decision {
        Decision::NoOp => Ok(ExecuteResult::Unchanged),
        Decision::Install(desired) => execute_install(desired, backend, codec, temp).await,
        Decision::Remove(identifier) => execute_remove(identifier, backend).await,
    }
}

/// Beschreibt was [`execute_decision`] tun würde, ohne etwas auszuführen.
///
/// Für Install steht dort statt eines echten Temp-Pfads `<stem>.mobileconfig`.
pub fn plan_decision(decision: &ConvergenceDecision, temp: &TempFiles) -> ExecuteResult {
    match &decision.decision {
        Decision::NoOp => ExecuteResult::Unchanged,
        Decision::Install(desired) => ExecuteResult::WouldExecute(ProfilesCommand::Install {
            bundle: temp
                .dir()
                .join(format!("{}{}", desired.file_stem, profilectl_config::BUNDLE_EXTENSION)),
        }),
        Decision::Remove(identifier) => ExecuteResult::WouldExecute(ProfilesCommand::Remove {
            identifier: identifier.clone(),
        }),
    }
}

// ============================================================================
// Decision Implementations
// ============================================================================

async fn execute_install<B: ProfilesBackend + ?Sized, C: PlistCodec + ?Sized>(
    desired: &DesiredProfile,
    backend: &B,
    codec: &C,
    temp: &TempFiles,
) -> Result<ExecuteResult, ProfileError> {
    let bytes = codec.encode(&Value::Dictionary(desired.document.payload.clone()))?;

    let artifact = temp.allocate(&desired.file_stem, profilectl_config::BUNDLE_EXTENSION)?;
    let path = artifact.path().to_path_buf();
    let command = ProfilesCommand::Install { bundle: path.clone() };

    let result = match tokio::fs::write(&path, &bytes).await {
        Ok(()) => run_checked(&command, backend).await,
        Err(e) => Err(ProfileError::Io(e)),
    };

    match (result, artifact.close()) {
        (Ok(()), Ok(())) => {
            tracing::info!(%command, identifier = %desired.profile.identifier, "installed profile");
            Ok(ExecuteResult::Executed(command))
        }
        (Ok(()), Err(cleanup)) => Err(ProfileError::Io(cleanup)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup)) => {
            tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove temp bundle");
            Err(err.with_cleanup_failure(&path, cleanup))
        }
    }
}

async fn execute_remove<B: ProfilesBackend + ?Sized>(
    identifier: &str,
    backend: &B,
) -> Result<ExecuteResult, ProfileError> {
    let command = ProfilesCommand::Remove {
        identifier: identifier.to_string(),
    };

    run_checked(&command, backend).await?;

    tracing::info!(%command, "removed profile");
    Ok(ExecuteResult::Executed(command))
}

async fn run_checked<B: ProfilesBackend + ?Sized>(
    command: &ProfilesCommand,
    backend: &B,
) -> Result<(), ProfileError> {
    tracing::debug!(%command, "executing");
    backend.run(command).await?.check(command)?;
    Ok(())
}
