// config.rs — Gateway configuration.
//
// PacConfig is an immutable snapshot loaded once at startup and passed into
// the server explicitly — there is no global configuration state. Values
// come from a `config.json` file with environment-variable overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pac_plan::ResourceCategory;

use crate::error::GatewayError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the plan artifact the automation module writes.
pub const PLAN_FILENAME: &str = "policy-plan.json";

/// Configuration for the policy-as-code gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacConfig {
    /// Root folder holding the declarative definition documents.
    #[serde(default)]
    pub definitions_root: PathBuf,

    /// Environment selector naming the target deployment environment.
    #[serde(default)]
    pub pac_selector: String,

    /// Folder where the automation module writes plan artifacts.
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,

    /// Optional override path for the automation module; when unset the
    /// module is imported by its well-known name.
    #[serde(default)]
    pub module_path: Option<PathBuf>,
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("./Output")
}

impl Default for PacConfig {
    fn default() -> Self {
        Self {
            definitions_root: PathBuf::new(),
            pac_selector: String::new(),
            output_folder: default_output_folder(),
            module_path: None,
        }
    }
}

impl PacConfig {
    /// Load config from a JSON file (if present), then apply environment
    /// overrides. A missing file is not an error — validation reports the
    /// missing fields instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables override file values.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(value) = get("PAC_DEFINITIONS_ROOT") {
            self.definitions_root = PathBuf::from(value);
        }
        if let Some(value) = get("PAC_SELECTOR") {
            self.pac_selector = value;
        }
        if let Some(value) = get("PAC_OUTPUT_FOLDER") {
            self.output_folder = PathBuf::from(value);
        }
        if let Some(value) = get("PAC_MODULE_PATH") {
            self.module_path = Some(PathBuf::from(value));
        }
    }

    /// Check the config, returning *every* violation so the caller can fix
    /// them all in one round trip.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.definitions_root.as_os_str().is_empty() {
            errors.push("definitions_root is required".to_string());
        } else if !self.definitions_root.exists() {
            errors.push(format!(
                "definitions_root does not exist: {}",
                self.definitions_root.display()
            ));
        }
        if self.pac_selector.is_empty() {
            errors.push("pac_selector is required".to_string());
        }
        errors
    }

    /// Folder holding the definition documents for one resource category.
    pub fn category_dir(&self, category: ResourceCategory) -> PathBuf {
        self.definitions_root.join(category.key())
    }

    /// Path of the generated policy plan artifact.
    pub fn plan_file(&self) -> PathBuf {
        self.output_folder.join(PLAN_FILENAME)
    }
}
