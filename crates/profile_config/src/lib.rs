use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".profilectl.toml";

/// File extension of profile bundles.
pub const BUNDLE_EXTENSION: &str = ".mobileconfig";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid profile declaration: {0}")]
    Invalid(String),
}

/// What should happen with the declared profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileAction {
    /// Install the profile unless the same revision is already installed (default)
    #[default]
    Install,
    /// Remove the profile by identifier
    Remove,
}

impl ProfileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
        }
    }
}

/// Where the desired profile comes from.
///
/// `profile = "screensaver.mobileconfig"` names a bundle file,
/// a `[profile.profile]` table declares the profile inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSource {
    Bundle(PathBuf),
    Inline(toml::Table),
}

/// A single profile declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDeclaration {
    /// Name of the profile. Fallback identifier and file stem of the install bundle.
    pub profile_name: String,
    /// Inline profile or path to a bundle
    #[serde(default)]
    pub profile: Option<ProfileSource>,
    /// Explicit identifier override
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub action: ProfileAction,
}

impl ProfileDeclaration {
    pub fn new(profile_name: impl Into<String>, action: ProfileAction) -> Self {
        Self {
            profile_name: profile_name.into(),
            profile: None,
            identifier: None,
            action,
        }
    }

    pub fn with_profile(mut self, profile: ProfileSource) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Checks the declaration once at the boundary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile_name.trim().is_empty() {
            return Err(ConfigError::Invalid("profile_name must not be empty".to_string()));
        }

        if let Some(identifier) = &self.identifier {
            if identifier.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "identifier must not be empty when set".to_string(),
                ));
            }
        }

        match &self.profile {
            Some(ProfileSource::Bundle(path)) => {
                if !path.to_string_lossy().ends_with(BUNDLE_EXTENSION) {
                    return Err(ConfigError::Invalid(format!(
                        "'{}' is not a valid profile, expected a {} file",
                        path.display(),
                        BUNDLE_EXTENSION
                    )));
                }
            }
            Some(ProfileSource::Inline(table)) => {
                if table.is_empty() {
                    return Err(ConfigError::Invalid("inline profile must not be empty".to_string()));
                }
            }
            None => {}
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// trace|debug|info|warn|error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// text|json
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Path of the `profiles` binary
    #[serde(default = "default_profiles_bin")]
    pub profiles_bin: PathBuf,
    /// Directory for temporary plist/bundle files (system temp dir if unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Base directory for relative bundle paths (config file directory if unset)
    #[serde(default)]
    pub bundle_dir: Option<PathBuf>,
    #[serde(default)]
    pub log: LogSettings,
}

fn default_profiles_bin() -> PathBuf {
    PathBuf::from("/usr/bin/profiles")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profiles_bin: default_profiles_bin(),
            temp_dir: None,
            bundle_dir: None,
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub profile: Option<ProfileDeclaration>,
    /// Directory the config was loaded from
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if let Some(profile) = &config.profile {
            profile.validate()?;
        }
        Ok(config)
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Like [`Config::load`], but falls back to defaults if the file does not exist.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self {
                base_dir: path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
                ..Self::default()
            })
        }
    }

    /// Directory relative bundle paths are resolved against.
    pub fn bundle_dir(&self) -> PathBuf {
        match &self.settings.bundle_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bundle_declaration() {
        let config: Config = toml::from_str(
            r#"
[profile]
profile_name = "com.testprofile.screensaver"
profile = "screensaver.mobileconfig"
"#,
        )
        .unwrap();

        let profile = config.profile.unwrap();
        assert_eq!(profile.profile_name, "com.testprofile.screensaver");
        assert_eq!(profile.action, ProfileAction::Install);
        assert_eq!(
            profile.profile,
            Some(ProfileSource::Bundle(PathBuf::from("screensaver.mobileconfig")))
        );
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_parse_inline_declaration() {
        let config: Config = toml::from_str(
            r#"
[profile]
profile_name = "screensaver"

[profile.profile]
PayloadIdentifier = "com.testprofile.screensaver"
PayloadUUID = "1781fbec-3325-565f-9022-8aa28135c3cc"
PayloadVersion = 1
"#,
        )
        .unwrap();

        let profile = config.profile.unwrap();
        match profile.profile {
            Some(ProfileSource::Inline(table)) => {
                assert_eq!(
                    table.get("PayloadIdentifier").and_then(|v| v.as_str()),
                    Some("com.testprofile.screensaver")
                );
                assert_eq!(table.get("PayloadVersion").and_then(|v| v.as_integer()), Some(1));
            }
            other => panic!("expected inline profile, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_remove_with_identifier() {
        let config: Config = toml::from_str(
            r#"
[profile]
profile_name = "Screensaver"
identifier = "com.testprofile.screensaver"
action = "remove"
"#,
        )
        .unwrap();

        let profile = config.profile.unwrap();
        assert_eq!(profile.action, ProfileAction::Remove);
        assert_eq!(profile.identifier.as_deref(), Some("com.testprofile.screensaver"));
    }

    #[test]
    fn test_settings_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.settings.profiles_bin, PathBuf::from("/usr/bin/profiles"));
        assert_eq!(config.settings.temp_dir, None);
        assert_eq!(config.settings.log.level, "info");
        assert_eq!(config.settings.log.format, "text");
        assert!(config.profile.is_none());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
[profile]
profile_name = "x.y"
actoin = "remove"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let decl = ProfileDeclaration::new("  ", ProfileAction::Install);
        assert!(matches!(decl.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_identifier() {
        let decl = ProfileDeclaration::new("com.example.a", ProfileAction::Remove).with_identifier("");
        assert!(matches!(decl.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_non_bundle_path() {
        let decl = ProfileDeclaration::new("screensaver", ProfileAction::Install)
            .with_profile(ProfileSource::Bundle(PathBuf::from("screensaver.plist")));
        assert!(matches!(decl.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_resolves_bundle_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"
[settings]
bundle_dir = "bundles"

[profile]
profile_name = "screensaver.mobileconfig"
"#,
        )
        .unwrap();

        let config = Config::load_from_dir(temp_dir.path()).unwrap();

        assert_eq!(config.base_dir, temp_dir.path());
        assert_eq!(config.bundle_dir(), temp_dir.path().join("bundles"));
    }

    #[test]
    fn test_load_validates_declaration() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[profile]\nprofile_name = \"\"\n",
        )
        .unwrap();

        let result = Config::load_from_dir(temp_dir.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_optional_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_optional(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();

        assert!(config.profile.is_none());
        assert_eq!(config.bundle_dir(), temp_dir.path());
    }
}
