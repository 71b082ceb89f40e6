use std::path::{Path, PathBuf};
use std::process::Stdio;
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

pub mod codec;
pub mod command;
pub mod controller;
pub mod identifier;
pub mod inventory;
pub mod reconcile;
pub mod source;
pub mod state;
pub mod temp;

pub use codec::{PlistCodec, XmlPlistCodec};
pub use command::{CommandOutput, ProfilesCommand};
pub use controller::{ConvergeReport, ExecuteResult, ProfileProvider};
pub use profilectl_config::{ProfileAction, ProfileDeclaration, ProfileSource};
pub use reconcile::{reconcile, ConvergenceDecision, Decision, Rationale};
pub use state::{DesiredProfileRequest, InstalledProfileSet, Profile, ProfileDocument};
pub use temp::TempFiles;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config error: {0}")]
    ConfigFile(#[from] profilectl_config::ConfigError),

    #[error("No profile to install for '{profile_name}'")]
    MissingProfile { profile_name: String },

    #[error("The specified profile does not contain a PayloadIdentifier")]
    MissingIdentifier,

    #[error("The specified profile does not contain a PayloadUUID")]
    MissingUuid,

    #[error("'{0}' is a bundle file name, not a profile identifier")]
    InvalidIdentifier(String),

    #[error("Failed to list installed profiles: {0}")]
    Inventory(String),

    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),

    #[error("{primary} (cleanup of {} failed as well: {cleanup})", .path.display())]
    CleanupFailed {
        #[source]
        primary: Box<ProfileError>,
        path: PathBuf,
        cleanup: std::io::Error,
    },
}

/// Grobe Einteilung der Fehler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Deklaration unbrauchbar, kein Kommando wurde ausgeführt
    Configuration,
    /// `profiles -P` fehlgeschlagen oder Ausgabe nicht lesbar
    Inventory,
    /// Install/Remove-Kommando fehlgeschlagen
    Action,
    /// Temp-Dateien schreiben/löschen fehlgeschlagen
    Io,
}

impl ProfileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_)
            | Self::ConfigFile(_)
            | Self::MissingProfile { .. }
            | Self::MissingIdentifier
            | Self::MissingUuid
            | Self::InvalidIdentifier(_) => ErrorKind::Configuration,
            Self::Inventory(_) => ErrorKind::Inventory,
            Self::CommandFailed { .. } => ErrorKind::Action,
            Self::Io(_) | Self::Plist(_) => ErrorKind::Io,
            Self::CleanupFailed { primary, .. } => primary.kind(),
        }
    }

    /// Hängt einen Cleanup-Fehler an, ohne den ursprünglichen Fehler zu ersetzen.
    pub fn with_cleanup_failure(self, path: &Path, cleanup: std::io::Error) -> Self {
        Self::CleanupFailed {
            primary: Box::new(self),
            path: path.to_path_buf(),
            cleanup,
        }
    }
}

// ============================================================================
// ProfilesBackend Trait - abstrahiert die `profiles` CLI für Tests
// ============================================================================

/// Führt `profiles` Kommandos aus.
/// Ermöglicht Mocking für Tests.
#[async_trait]
pub trait ProfilesBackend: Send + Sync {
    /// Führt das Kommando aus und liefert Exit-Status und Ausgabe.
    ///
    /// Ein Exit-Status ungleich 0 ist hier kein Fehler, das entscheidet der Aufrufer.
    async fn run(&self, command: &ProfilesCommand) -> Result<CommandOutput, ProfileError>;
}

// ============================================================================
// RealProfiles - Echte `profiles` CLI Implementierung
// ============================================================================

/// Echte Implementierung über `/usr/bin/profiles`
pub struct RealProfiles {
    pub bin_path: PathBuf,
}

impl RealProfiles {
    pub fn new(bin_path: PathBuf) -> Self {
        Self { bin_path }
    }
}

#[async_trait]
impl ProfilesBackend for RealProfiles {
    async fn run(&self, command: &ProfilesCommand) -> Result<CommandOutput, ProfileError> {
        tracing::debug!(%command, bin = %self.bin_path.display(), "running profiles");

        let output = Command::new(&self.bin_path)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Konvergiert eine Deklaration gegen das echte System.
pub async fn converge_declaration(
    declaration: &ProfileDeclaration,
    settings: &profilectl_config::Settings,
    bundle_dir: &Path,
    dry_run: bool,
) -> Result<ConvergeReport, ProfileError> {
    let provider = ProfileProvider::new(
        RealProfiles::new(settings.profiles_bin.clone()),
        XmlPlistCodec,
        TempFiles::from_settings(settings),
    )
    .dry_run(dry_run);

    let request = source::resolve_request(declaration, bundle_dir, &XmlPlistCodec)?;
    provider.converge(&request).await
}

/// Fragt die installierten Profile vom echten System ab.
pub async fn list_installed_profiles(
    settings: &profilectl_config::Settings,
) -> Result<InstalledProfileSet, ProfileError> {
    let backend = RealProfiles::new(settings.profiles_bin.clone());
    let temp = TempFiles::from_settings(settings);
    inventory::query_installed_profiles(&backend, &XmlPlistCodec, &temp).await
}

// ============================================================================
// Test Utilities - exportiert für Integrationstests
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use plist::{Dictionary, Value};
    use std::sync::Mutex;

    /// Mock `profiles` Backend für Tests
    ///
    /// Beantwortet `-P -o <path>` mit dem konfigurierten Inventory und zeichnet
    /// alle Kommandos auf.
    #[derive(Default)]
    pub struct MockProfiles {
        installed: Mutex<Option<Value>>,
        raw_listing: Mutex<Option<Vec<u8>>>,
        calls: Mutex<Vec<ProfilesCommand>>,
        installed_bundles: Mutex<Vec<Vec<u8>>>,
        failing: Mutex<Vec<&'static str>>,
        vanishing: Mutex<Vec<&'static str>>,
    }

    impl MockProfiles {
        pub fn new() -> Self {
            Self::default()
        }

        /// Setzt das Inventory das `-P` zurückgibt
        pub fn with_installed(self, installed: Value) -> Self {
            *self.installed.lock().unwrap() = Some(installed);
            self
        }

        /// Setzt rohe Bytes als Ausgabe von `-P` (z.B. kaputtes XML)
        pub fn with_raw_listing(self, bytes: &[u8]) -> Self {
            *self.raw_listing.lock().unwrap() = Some(bytes.to_vec());
            self
        }

        /// Lässt Kommandos mit dem Flag fehlschlagen ("-P", "-I" oder "-R")
        pub fn fail_on(self, flag: &'static str) -> Self {
            self.failing.lock().unwrap().push(flag);
            self
        }

        /// Löscht die Datei des Kommandos mit dem Flag nach dem Lauf ("-P" oder "-I"),
        /// damit das Aufräumen der Temp-Datei fehlschlägt
        pub fn remove_file_on(self, flag: &'static str) -> Self {
            self.vanishing.lock().unwrap().push(flag);
            self
        }

        /// Alle ausgeführten Kommandos
        pub fn calls(&self) -> Vec<ProfilesCommand> {
            self.calls.lock().unwrap().clone()
        }

        /// Alle ausgeführten Kommandos als Shell-Strings
        pub fn rendered_calls(&self) -> Vec<String> {
            self.calls().iter().map(|c| c.to_string()).collect()
        }

        /// Inhalt der Bundles die zum Zeitpunkt von `-I` auf der Platte lagen
        pub fn installed_bundles(&self) -> Vec<Vec<u8>> {
            self.installed_bundles.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProfilesBackend for MockProfiles {
        async fn run(&self, command: &ProfilesCommand) -> Result<CommandOutput, ProfileError> {
            self.calls.lock().unwrap().push(command.clone());
            let output = self.respond(command)?;

            if self.vanishing.lock().unwrap().contains(&command.flag()) {
                match command {
                    ProfilesCommand::ListAll { output: path } | ProfilesCommand::Install { bundle: path } => {
                        std::fs::remove_file(path)?;
                    }
                    ProfilesCommand::Remove { .. } => {}
                }
            }

            Ok(output)
        }
    }

    impl MockProfiles {
        fn respond(&self, command: &ProfilesCommand) -> Result<CommandOutput, ProfileError> {
            if self.failing.lock().unwrap().contains(&command.flag()) {
                return Ok(CommandOutput {
                    status: Some(1),
                    stdout: String::new(),
                    stderr: format!("mock failure for {}", command.flag()),
                });
            }

            match command {
                ProfilesCommand::ListAll { output } => {
                    if let Some(raw) = self.raw_listing.lock().unwrap().as_ref() {
                        std::fs::write(output, raw)?;
                    } else {
                        let installed = self
                            .installed
                            .lock()
                            .unwrap()
                            .clone()
                            .unwrap_or_else(no_profiles);
                        installed.to_file_xml(output)?;
                    }
                }
                ProfilesCommand::Install { bundle } => {
                    let bytes = std::fs::read(bundle)?;
                    self.installed_bundles.lock().unwrap().push(bytes);
                }
                ProfilesCommand::Remove { .. } => {}
            }

            Ok(CommandOutput::success())
        }
    }

    /// Ein Eintrag wie ihn `profiles -P` liefert
    pub fn installed_record(identifier: &str, uuid: &str) -> Value {
        let mut item = Dictionary::new();
        item.insert("PayloadIdentifier".to_string(), Value::from("com.apple.screensaver"));
        item.insert("PayloadType".to_string(), Value::from("com.apple.ManagedClient.preferences"));
        item.insert("PayloadUUID".to_string(), Value::from("73fc30e0-1e57-0131-c32d-000c2944c110"));
        item.insert("PayloadVersion".to_string(), Value::from(1i64));

        let mut record = Dictionary::new();
        record.insert("ProfileDisplayName".to_string(), Value::from("ScreenSaver Settings"));
        record.insert("ProfileIdentifier".to_string(), Value::from(identifier));
        record.insert("ProfileInstallDate".to_string(), Value::from("2015-10-05 23:15:21 +0000"));
        record.insert("ProfileItems".to_string(), Value::Array(vec![Value::Dictionary(item)]));
        record.insert("ProfileOrganization".to_string(), Value::from("Facebook"));
        record.insert("ProfileRemovalDisallowed".to_string(), Value::from("false"));
        record.insert("ProfileType".to_string(), Value::from("Configuration"));
        record.insert("ProfileUUID".to_string(), Value::from(uuid));
        record.insert("ProfileVerificationState".to_string(), Value::from("unsigned"));
        record.insert("ProfileVersion".to_string(), Value::from(1i64));
        Value::Dictionary(record)
    }

    /// Inventory mit Einträgen im `_computerlevel` Scope
    pub fn computer_level(records: Vec<Value>) -> Value {
        let mut root = Dictionary::new();
        root.insert(
            state::COMPUTER_LEVEL_SCOPE.to_string(),
            Value::Array(records),
        );
        Value::Dictionary(root)
    }

    /// Das Inventory aus den Provider-Specs: screensaver + testprofile
    pub fn all_profiles() -> Value {
        computer_level(vec![
            installed_record("com.apple.screensaver", "1781fbec-3325-565f-9022-8aa28135c3cc"),
            installed_record("com.testprofile.screensaver", "1781fbec-3325-565f-9022-8aa28135c3cc"),
        ])
    }

    /// Leeres Inventory
    pub fn no_profiles() -> Value {
        computer_level(vec![])
    }

    /// Das Test-Bundle (Payload-Schema)
    pub fn screensaver_bundle(uuid: &str) -> Dictionary {
        let mut prefs = Dictionary::new();
        prefs.insert("idleTime".to_string(), Value::from(0i64));
        let mut forced = Dictionary::new();
        forced.insert("mcx_preference_settings".to_string(), Value::Dictionary(prefs));
        let mut domain = Dictionary::new();
        domain.insert("Forced".to_string(), Value::Array(vec![Value::Dictionary(forced)]));
        let mut settings = Dictionary::new();
        settings.insert("com.apple.screensaver".to_string(), Value::Dictionary(domain));

        let mut payload = Dictionary::new();
        payload.insert("PayloadType".to_string(), Value::from("com.apple.ManagedClient.preferences"));
        payload.insert("PayloadVersion".to_string(), Value::from(1i64));
        payload.insert("PayloadIdentifier".to_string(), Value::from("com.testprofile.screensaver"));
        payload.insert("PayloadUUID".to_string(), Value::from("73fc30e0-1e57-0131-c32d-000c2944c108"));
        payload.insert("PayloadEnabled".to_string(), Value::Boolean(true));
        payload.insert("PayloadDisplayName".to_string(), Value::from("com.apple.screensaver"));
        payload.insert("PayloadContent".to_string(), Value::Dictionary(settings));

        let mut bundle = Dictionary::new();
        bundle.insert("PayloadIdentifier".to_string(), Value::from("com.testprofile.screensaver"));
        bundle.insert("PayloadRemovalDisallowed".to_string(), Value::Boolean(false));
        bundle.insert("PayloadScope".to_string(), Value::from("System"));
        bundle.insert("PayloadType".to_string(), Value::from("Configuration"));
        bundle.insert("PayloadUUID".to_string(), Value::from(uuid));
        bundle.insert("PayloadOrganization".to_string(), Value::from("Chef"));
        bundle.insert("PayloadVersion".to_string(), Value::from(1i64));
        bundle.insert("PayloadDisplayName".to_string(), Value::from("Screensaver Settings"));
        bundle.insert("PayloadContent".to_string(), Value::Array(vec![Value::Dictionary(payload)]));
        bundle
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
