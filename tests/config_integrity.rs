use hookguard::core::config::{self, Config};
use hookguard::core::error::GuardianError;
use std::fs;
use tempfile::tempdir;

#[test]
fn reseal_then_load_round_trips() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);

    config::write_default(&path, false).expect("write default");
    let digest = config::reseal(&path).expect("reseal");
    assert!(digest.starts_with("sha256:"));

    let loaded = Config::load(&path).expect("sealed load");
    assert!(loaded.sealed());
    assert_eq!(loaded.integrity.as_ref().expect("integrity").hash, digest);

    // Resealing an unchanged document is idempotent.
    assert_eq!(config::reseal(&path).expect("reseal again"), digest);
    Config::load(&path).expect("still loads");
}

#[test]
fn any_edit_after_sealing_fails_closed() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);

    config::write_default(&path, false).expect("write default");
    config::reseal(&path).expect("reseal");

    let raw = fs::read_to_string(&path).expect("read");
    let tampered = raw.replacen("enabled = true", "enabled = false", 1);
    assert_ne!(raw, tampered, "test must actually change the document");
    fs::write(&path, tampered).expect("tamper");

    let err = Config::load(&path).expect_err("digest mismatch is fatal");
    assert!(matches!(err, GuardianError::Integrity(_)));
    assert!(
        err.to_string().contains("hookguard reseal"),
        "error must carry remediation instructions"
    );
}

#[test]
fn allow_programmatic_escape_hatch_skips_the_digest_check() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);

    config::write_default(&path, false).expect("write default");
    config::reseal(&path).expect("reseal");

    let raw = fs::read_to_string(&path).expect("read");
    let tampered = raw
        .replacen("enabled = true", "enabled = false", 1)
        .replace("allow_programmatic = false", "allow_programmatic = true");
    fs::write(&path, tampered).expect("tamper with escape flag");

    let loaded = Config::load(&path).expect("escape hatch active");
    assert!(!loaded.sealed());
}

#[test]
fn legacy_document_without_seal_loads_unconditionally() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);

    fs::write(
        &path,
        r#"version = "0.1"

[hooks.pre-commit]
enabled = true
validators = ["lint"]

[validators.lint]
command = ["cargo", "clippy"]
"#,
    )
    .expect("write legacy settings");

    let loaded = Config::load(&path).expect("legacy load");
    assert!(loaded.integrity.is_none());
    assert!(!loaded.sealed());
    assert_eq!(loaded.validators["lint"].timeout_secs, 120, "default applies");
    assert!(!loaded.validators["lint"].protected, "protected defaults off");
}

#[test]
fn malformed_settings_are_rejected_with_context() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);
    fs::write(&path, "version = [not toml").expect("write junk");

    let err = Config::load(&path).expect_err("malformed");
    assert!(err.to_string().contains(path.display().to_string().as_str()));
}

#[test]
fn configure_refuses_to_overwrite_without_force() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);

    config::write_default(&path, false).expect("first write");
    assert!(config::write_default(&path, false).is_err());
    config::write_default(&path, true).expect("forced overwrite");
}

#[test]
fn protected_validator_is_locked_while_sealed() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::SETTINGS_FILE);

    let mut config = Config::default();
    config.validators.get_mut("tests").expect("tests").protected = true;
    fs::write(&path, toml::to_string(&config).expect("serialize")).expect("write");
    config::reseal(&path).expect("reseal");

    let mut loaded = Config::load(&path).expect("load sealed");
    let err = loaded
        .set_validator_enabled("tests", false)
        .expect_err("protected flag is locked");
    assert!(err.to_string().contains("protected"));

    // Non-protected validators stay mutable.
    loaded.set_validator_enabled("fmt", false).expect("fmt is not protected");
}
