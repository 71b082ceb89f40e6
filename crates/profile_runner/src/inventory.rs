//! Installed Profile Inventory
//!
//! `profiles -P -o <temp>` schreibt alle installierten Profile als plist.
//! Die Temp-Datei wird auf jedem Weg wieder gelöscht.

use crate::codec::PlistCodec;
use crate::command::ProfilesCommand;
use crate::state::InstalledProfileSet;
use crate::temp::TempFiles;
use crate::{ProfileError, ProfilesBackend};

/// Fragt einmal alle installierten Profile ab.
pub async fn query_installed_profiles<B: ProfilesBackend + ?Sized, C: PlistCodec + ?Sized>(
    backend: &B,
    codec: &C,
    temp: &TempFiles,
) -> Result<InstalledProfileSet, ProfileError> {
    let artifact = temp.allocate("allprofiles", ".plist")?;
    let command = ProfilesCommand::ListAll {
        output: artifact.path().to_path_buf(),
    };

    let result = read_listing(&command, backend, codec).await;

    let path = artifact.path().to_path_buf();
    match (result, artifact.close()) {
        (Ok(installed), Ok(())) => {
            tracing::debug!(count = installed.len(), "queried installed profiles");
            Ok(installed)
        }
        (Ok(_), Err(cleanup)) => Err(ProfileError::Io(cleanup)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup)) => {
            tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove temp file");
            Err(err.with_cleanup_failure(&path, cleanup))
        }
    }
}

async fn read_listing<B: ProfilesBackend + ?Sized, C: PlistCodec + ?Sized>(
    command: &ProfilesCommand,
    backend: &B,
    codec: &C,
) -> Result<InstalledProfileSet, ProfileError> {
    let output = backend
        .run(command)
        .await
        .map_err(|e| ProfileError::Inventory(format!("`{}` could not be run: {}", command, e)))?;

    if !output.is_success() {
        return Err(ProfileError::Inventory(format!(
            "`{}` failed ({}): {}",
            command,
            output.status_display(),
            output.stderr.trim()
        )));
    }

    let ProfilesCommand::ListAll { output: path } = command else {
        return Err(ProfileError::Inventory(format!("`{}` is not a listing command", command)));
    };

    let bytes = tokio::fs::read(path).await?;
    // Ohne installierte Profile bleibt die Datei leer
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(InstalledProfileSet::default());
    }

    let root = codec
        .decode(&bytes)
        .map_err(|e| ProfileError::Inventory(format!("output of `{}` is not readable: {}", command, e)))?;

    InstalledProfileSet::from_plist(&root)
}
