//! Settings document and configuration integrity seal.
//!
//! `.hookguard.toml` declares which validators run at each lifecycle
//! point. An optional `[integrity]` section binds the document to a
//! SHA-256 digest; while the seal is active, protected validators can
//! only be changed by editing the file and resealing by hand. A
//! document without the section loads unconditionally (legacy mode).

use crate::core::audit;
use crate::core::error::GuardianError;
use crate::core::paths::HookName;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = ".hookguard.toml";

/// Environment variable naming non-protected validators to skip,
/// comma-separated. Has no effect on protected validators and none on
/// the anti-bypass token check.
pub const SKIP_ENV: &str = "HOOKGUARD_SKIP";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub hooks: BTreeMap<String, StageConfig>,
    #[serde(default)]
    pub validators: BTreeMap<String, ValidatorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub validators: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Integrity {
    pub hash: String,
    #[serde(default)]
    pub allow_programmatic: bool,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        let mut hooks = BTreeMap::new();
        hooks.insert(
            HookName::PreCommit.as_str().to_string(),
            StageConfig {
                enabled: true,
                validators: vec!["fmt".to_string(), "lint".to_string()],
            },
        );
        hooks.insert(
            HookName::PrePush.as_str().to_string(),
            StageConfig {
                enabled: true,
                validators: vec!["tests".to_string()],
            },
        );

        let mut validators = BTreeMap::new();
        validators.insert(
            "fmt".to_string(),
            ValidatorConfig {
                enabled: true,
                command: vec!["cargo", "fmt", "--", "--check"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                timeout_secs: 120,
                protected: false,
            },
        );
        validators.insert(
            "lint".to_string(),
            ValidatorConfig {
                enabled: true,
                command: vec!["cargo", "clippy", "--all-targets", "--", "-D", "warnings"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                timeout_secs: 300,
                protected: false,
            },
        );
        validators.insert(
            "tests".to_string(),
            ValidatorConfig {
                enabled: true,
                command: vec!["cargo", "test"].into_iter().map(String::from).collect(),
                timeout_secs: 300,
                protected: false,
            },
        );

        Config {
            version: "0.1".to_string(),
            hooks,
            validators,
            integrity: None,
        }
    }
}

pub fn settings_path(repo_root: &Path) -> PathBuf {
    repo_root.join(SETTINGS_FILE)
}

/// Digest over the canonical serialization of a document with its
/// integrity section stripped. `BTreeMap` keys and struct field order
/// make the serialization stable.
pub fn compute_digest(config: &Config) -> Result<String, GuardianError> {
    let mut unsealed = config.clone();
    unsealed.integrity = None;
    let canonical = toml::to_string(&unsealed)
        .map_err(|e| GuardianError::Validation(format!("cannot serialize settings: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

impl Config {
    /// Load the settings document, verifying the integrity seal when
    /// one is present. A missing file yields the defaults; a digest
    /// mismatch is fatal unless `allow_programmatic` is set.
    pub fn load(path: &Path) -> Result<Config, GuardianError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = toml::from_str(&raw).map_err(|e| {
            GuardianError::Validation(format!("malformed settings in {}: {}", path.display(), e))
        })?;

        if let Some(integrity) = &config.integrity {
            if !integrity.allow_programmatic {
                let expected = compute_digest(&config)?;
                if expected != integrity.hash {
                    let repo_root = path.parent().unwrap_or(Path::new("."));
                    let _ = audit::record(
                        repo_root,
                        "integrity_mismatch",
                        "settings digest does not match seal",
                        Some(path),
                    );
                    return Err(GuardianError::Integrity(path.display().to_string()));
                }
            }
        }

        Ok(config)
    }

    /// Load the repository's settings from their conventional location.
    pub fn load_for_repo(repo_root: &Path) -> Result<Config, GuardianError> {
        Config::load(&settings_path(repo_root))
    }

    /// Whether the seal forbids programmatic changes to protected fields.
    pub fn sealed(&self) -> bool {
        self.integrity
            .as_ref()
            .is_some_and(|i| !i.allow_programmatic)
    }

    /// The only programmatic mutation path for a validator's enabled
    /// state. Refuses protected validators while the seal is active;
    /// those change only by manual edit plus reseal.
    pub fn set_validator_enabled(
        &mut self,
        name: &str,
        enabled: bool,
    ) -> Result<(), GuardianError> {
        let sealed = self.sealed();
        let validator = self.validators.get_mut(name).ok_or_else(|| {
            GuardianError::Validation(format!("unknown validator '{}'", name))
        })?;
        if validator.protected && sealed {
            return Err(GuardianError::Validation(format!(
                "validator '{}' is protected by the integrity seal; edit {} and run `hookguard reseal`",
                name, SETTINGS_FILE
            )));
        }
        validator.enabled = enabled;
        Ok(())
    }

    /// Validators to run for a stage: the stage must be enabled, each
    /// listed validator must exist and be enabled. Names listed but not
    /// declared are reported rather than silently dropped.
    pub fn stage_validators(
        &self,
        stage: HookName,
    ) -> Result<Vec<(String, ValidatorConfig)>, GuardianError> {
        let Some(stage_config) = self.hooks.get(stage.as_str()) else {
            return Ok(Vec::new());
        };
        if !stage_config.enabled {
            return Ok(Vec::new());
        }

        let mut selected = Vec::new();
        for name in &stage_config.validators {
            let validator = self.validators.get(name).ok_or_else(|| {
                GuardianError::Validation(format!(
                    "stage {} lists validator '{}' which is not declared",
                    stage, name
                ))
            })?;
            if validator.enabled {
                selected.push((name.clone(), validator.clone()));
            }
        }
        Ok(selected)
    }
}

/// Whether the skip variable names this validator. Callers must still
/// refuse the skip for protected validators.
pub fn skip_requested(name: &str) -> bool {
    match std::env::var(SKIP_ENV) {
        Ok(value) => value.split(',').any(|v| v.trim() == name),
        Err(_) => false,
    }
}

/// Recompute and rewrite the integrity digest. Intended to be invoked
/// by a human after a deliberate edit, never by the enforcement
/// pipeline. Preserves an existing `allow_programmatic` choice.
pub fn reseal(path: &Path) -> Result<String, GuardianError> {
    let raw = fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&raw).map_err(|e| {
        GuardianError::Validation(format!("malformed settings in {}: {}", path.display(), e))
    })?;

    let allow_programmatic = config
        .integrity
        .as_ref()
        .map(|i| i.allow_programmatic)
        .unwrap_or(false);
    let digest = compute_digest(&config)?;
    config.integrity = Some(Integrity {
        hash: digest.clone(),
        allow_programmatic,
    });

    let serialized = toml::to_string(&config)
        .map_err(|e| GuardianError::Validation(format!("cannot serialize settings: {}", e)))?;
    fs::write(path, serialized)?;
    Ok(digest)
}

/// Write the default settings document (unsealed). `force` overwrites.
pub fn write_default(path: &Path, force: bool) -> Result<(), GuardianError> {
    if path.exists() && !force {
        return Err(GuardianError::Validation(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    let serialized = toml::to_string(&Config::default())
        .map_err(|e| GuardianError::Validation(format!("cannot serialize settings: {}", e)))?;
    fs::write(path, serialized)?;
    Ok(())
}
