#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_PROFILES: &str = r#"#!/bin/sh
echo "$@" >> "$FAKE_PROFILES_LOG"
case "$1" in
  -P)
    if [ -n "$FAKE_PROFILES_FAIL_LIST" ]; then
      echo "listing broken" >&2
      exit 1
    fi
    cp "$FAKE_PROFILES_INVENTORY" "$3"
    ;;
  -I)
    test -f "$3" || exit 2
    ;;
  -R)
    ;;
esac
"#;

const EMPTY_INVENTORY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>_computerlevel</key>
	<array/>
</dict>
</plist>
"#;

const SCREENSAVER_INVENTORY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>_computerlevel</key>
	<array>
		<dict>
			<key>ProfileDisplayName</key>
			<string>ScreenSaver Settings</string>
			<key>ProfileIdentifier</key>
			<string>com.testprofile.screensaver</string>
			<key>ProfileRemovalDisallowed</key>
			<string>false</string>
			<key>ProfileType</key>
			<string>Configuration</string>
			<key>ProfileUUID</key>
			<string>1781fbec-3325-565f-9022-8aa28135c3cc</string>
		</dict>
	</array>
</dict>
</plist>
"#;

fn bundle(uuid: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>PayloadDisplayName</key>
	<string>Screensaver Settings</string>
	<key>PayloadIdentifier</key>
	<string>com.testprofile.screensaver</string>
	<key>PayloadRemovalDisallowed</key>
	<false/>
	<key>PayloadType</key>
	<string>Configuration</string>
	<key>PayloadUUID</key>
	<string>{}</string>
	<key>PayloadVersion</key>
	<integer>1</integer>
	<key>PayloadContent</key>
	<array/>
</dict>
</plist>
"#,
        uuid
    )
}

/// Workspace with a fake `profiles` binary that logs its arguments.
struct FakeHost {
    dir: TempDir,
    temp: TempDir,
}

impl FakeHost {
    fn new(inventory: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("profiles");
        fs::write(&bin, FAKE_PROFILES).unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(dir.path().join("inventory.plist"), inventory).unwrap();

        Self {
            dir,
            temp: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn log_path(&self) -> PathBuf {
        self.path().join("calls.log")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn profilectl(&self) -> Command {
        let mut cmd = Command::cargo_bin("profilectl").unwrap();
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env("FAKE_PROFILES_LOG", self.log_path())
            .env("FAKE_PROFILES_INVENTORY", self.path().join("inventory.plist"))
            .arg("--profiles-bin")
            .arg(self.path().join("profiles"))
            .arg("--temp-dir")
            .arg(self.temp.path());
        cmd
    }

    fn assert_temp_empty(&self) {
        assert!(fs::read_dir(self.temp.path()).unwrap().next().is_none());
    }
}

#[test]
fn test_help() {
    Command::cargo_bin("profilectl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Converge macOS configuration profiles"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("remove"));
}

#[test]
fn test_remove_dry_run_only_lists() {
    let host = FakeHost::new(EMPTY_INVENTORY);

    host.profilectl()
        .args(["remove", "com.testprofile.screensaver", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[dry-run] remove profile com.testprofile.screensaver (not installed)",
        ))
        .stdout(predicate::str::contains(
            "would run: profiles -R -p 'com.testprofile.screensaver'",
        ));

    let calls = host.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("-P -o "));
    host.assert_temp_empty();
}

#[test]
fn test_remove_with_identifier_override() {
    let host = FakeHost::new(SCREENSAVER_INVENTORY);

    host.profilectl()
        .args(["remove", "Profile Test", "--identifier", "com.testprofile.screensaver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ran: profiles -R -p 'com.testprofile.screensaver'"));

    assert_eq!(host.calls()[1], "-R -p com.testprofile.screensaver");
}

#[test]
fn test_remove_rejects_bundle_name_as_identifier() {
    let host = FakeHost::new(EMPTY_INVENTORY);

    host.profilectl()
        .args(["remove", "screensaver", "--identifier", "screensaver.mobileconfig"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is a bundle file name, not a profile identifier"));

    assert!(host.calls().is_empty());
}

#[test]
fn test_remove_reads_identifier_from_bundle() {
    let host = FakeHost::new(SCREENSAVER_INVENTORY);
    fs::write(
        host.path().join("screensaver.mobileconfig"),
        bundle("73fc30e0-1e57-0131-c32d-000c2944c108"),
    )
    .unwrap();

    host.profilectl()
        .args(["remove", "screensaver.mobileconfig"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ran: profiles -R -p 'com.testprofile.screensaver'"));
}

#[test]
fn test_install_same_revision_is_noop() {
    let host = FakeHost::new(SCREENSAVER_INVENTORY);
    fs::write(
        host.path().join("screensaver.mobileconfig"),
        bundle("1781fbec-3325-565f-9022-8aa28135c3cc"),
    )
    .unwrap();

    host.profilectl()
        .args(["install", "screensaver.mobileconfig"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "profile com.testprofile.screensaver is up to date",
        ));

    assert_eq!(host.calls().len(), 1);
    host.assert_temp_empty();
}

#[test]
fn test_install_new_revision_replaces() {
    let host = FakeHost::new(SCREENSAVER_INVENTORY);
    fs::write(
        host.path().join("screensaver.mobileconfig"),
        bundle("73fc30e0-1e57-0131-c32d-000c2944c108"),
    )
    .unwrap();

    host.profilectl()
        .args(["install", "screensaver", "--profile", "screensaver.mobileconfig"])
        .assert()
        .success()
        .stdout(predicate::str::contains("replace profile com.testprofile.screensaver"))
        .stdout(predicate::str::contains("ran: profiles -I -F '"));

    let calls = host.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].starts_with("-I -F "));
    assert!(calls[1].ends_with(".mobileconfig"));
    host.assert_temp_empty();
}

#[test]
fn test_install_missing_bundle_fails_before_any_command() {
    let host = FakeHost::new(EMPTY_INVENTORY);

    host.profilectl()
        .args(["install", "missing.mobileconfig"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert!(host.calls().is_empty());
}

#[test]
fn test_apply_from_config() {
    let host = FakeHost::new(SCREENSAVER_INVENTORY);
    fs::write(
        host.path().join(".profilectl.toml"),
        r#"
[profile]
profile_name = "com.testprofile.screensaver"
action = "remove"
"#,
    )
    .unwrap();

    host.profilectl()
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("remove profile com.testprofile.screensaver"));

    assert_eq!(host.calls().len(), 2);
}

#[test]
fn test_apply_without_declaration_fails() {
    let host = FakeHost::new(EMPTY_INVENTORY);

    host.profilectl()
        .arg("apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No [profile] declared"));
}

#[test]
fn test_list() {
    let host = FakeHost::new(SCREENSAVER_INVENTORY);

    host.profilectl()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("_computerlevel:"))
        .stdout(predicate::str::contains("com.testprofile.screensaver"))
        .stdout(predicate::str::contains("1781fbec-3325-565f-9022-8aa28135c3cc"));

    host.profilectl()
        .args(["list", "--identifier", "com.example.other"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No installed profiles found."));
}

#[test]
fn test_failing_listing_exits_non_zero() {
    let host = FakeHost::new(EMPTY_INVENTORY);

    host.profilectl()
        .env("FAKE_PROFILES_FAIL_LIST", "1")
        .args(["remove", "com.testprofile.screensaver"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to list installed profiles"))
        .stderr(predicate::str::contains("listing broken"));

    assert_eq!(host.calls().len(), 1);
    host.assert_temp_empty();
}

#[test]
fn test_logs_go_to_stderr() {
    let host = FakeHost::new(EMPTY_INVENTORY);

    host.profilectl()
        .args(["--log-level", "debug", "remove", "com.testprofile.screensaver", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("converge finished").not())
        .stderr(predicate::str::contains("loaded config"))
        .stderr(predicate::str::contains("converge finished"));

    host.profilectl()
        .args(["--log-level", "error", "remove", "com.testprofile.screensaver", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("converge finished").not());
}
