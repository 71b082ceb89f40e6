//! Temp-Dateien für `profiles -P -o` und `profiles -I -F`
//!
//! Jede Allokation legt die Datei exklusiv mit zufälligem Suffix an, damit sich
//! parallele Läufe auf demselben Host nicht in die Quere kommen.

use std::io;
use std::path::{Path, PathBuf};

use profilectl_config::Settings;
use tempfile::TempPath;

/// Allokiert eindeutige Temp-Pfade in einem Verzeichnis.
#[derive(Debug, Clone)]
pub struct TempFiles {
    dir: PathBuf,
}

impl TempFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Temp-Verzeichnis des Systems
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.temp_dir {
            Some(dir) => Self::new(dir.clone()),
            None => Self::system(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Legt `<stem>.XXXXXX<suffix>` an.
    pub fn allocate(&self, stem: &str, suffix: &str) -> io::Result<TempArtifact> {
        std::fs::create_dir_all(&self.dir)?;

        let path = tempfile::Builder::new()
            .prefix(&format!("{}.", sanitize_stem(stem)))
            .suffix(suffix)
            .tempfile_in(&self.dir)?
            .into_temp_path();

        tracing::debug!(path = %path.display(), "allocated temp file");
        Ok(TempArtifact { path })
    }
}

/// Eine Temp-Datei die spätestens beim Drop gelöscht wird.
///
/// [`TempArtifact::close`] löscht explizit und meldet Fehler.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Macht aus einem Profilnamen einen brauchbaren Dateinamen-Stamm.
pub fn sanitize_stem(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = base
        .strip_suffix(profilectl_config::BUNDLE_EXTENSION)
        .unwrap_or(&base);

    let stem: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.trim_matches('.').is_empty() {
        "profile".to_string()
    } else {
        stem
    }
}
