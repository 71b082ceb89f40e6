//! Kommandos für die `profiles` CLI
//!
//! Ein [`ProfilesCommand`] kennt seine argv-Form (für die Ausführung ohne Shell)
//! und seine Shell-Form mit quotierten Argumenten (für Logs und Reports).

use std::fmt;
use std::path::PathBuf;

use crate::ProfileError;

/// Name des Programms in der Shell-Form.
pub const PROFILES_PROGRAM: &str = "profiles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilesCommand {
    /// `profiles -P -o <path>`: alle installierten Profile als plist schreiben
    ListAll { output: PathBuf },
    /// `profiles -I -F <path>`: Bundle installieren
    Install { bundle: PathBuf },
    /// `profiles -R -p <identifier>`: Profil entfernen
    Remove { identifier: String },
}

impl ProfilesCommand {
    /// Das Aktions-Flag ("-P", "-I", "-R").
    pub fn flag(&self) -> &'static str {
        match self {
            Self::ListAll { .. } => "-P",
            Self::Install { .. } => "-I",
            Self::Remove { .. } => "-R",
        }
    }

    fn operand(&self) -> (&'static str, String) {
        match self {
            Self::ListAll { output } => ("-o", output.to_string_lossy().to_string()),
            Self::Install { bundle } => ("-F", bundle.to_string_lossy().to_string()),
            Self::Remove { identifier } => ("-p", identifier.clone()),
        }
    }

    /// Argumente für die Ausführung (ohne Programmname).
    pub fn args(&self) -> Vec<String> {
        let (option, value) = self.operand();
        vec![self.flag().to_string(), option.to_string(), value]
    }
}

impl fmt::Display for ProfilesCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (option, value) = self.operand();
        write!(
            f,
            "{} {} {} {}",
            PROFILES_PROGRAM,
            self.flag(),
            option,
            shell_quote(&value)
        )
    }
}

/// Quotiert einen Wert in einfache Anführungszeichen.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Ergebnis eines Kommandos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit-Code, `None` wenn der Prozess durch ein Signal beendet wurde
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_display(&self) -> String {
        match self.status {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Wandelt einen Exit-Status ungleich 0 in [`ProfileError::CommandFailed`].
    pub fn check(self, command: &ProfilesCommand) -> Result<Self, ProfileError> {
        if self.is_success() {
            return Ok(self);
        }

        Err(ProfileError::CommandFailed {
            command: command.to_string(),
            status: self.status_display(),
            stderr: self.stderr.trim().to_string(),
        })
    }
}
