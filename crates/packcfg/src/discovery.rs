//! File-based discovery of builder settings and configuration fragments.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::settings::{BuilderSettings, SETTINGS_FILE};
use crate::value::Value;

/// Field of `package.json` that may hold builder settings.
pub const PACKAGE_JSON_FIELD: &str = "packcfg";

/// Searches a project root for builder settings.
///
/// # Example
///
/// ```no_run
/// use packcfg::ConfigDiscovery;
///
/// let settings = ConfigDiscovery::new(".").load_or_default().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Search for settings in `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a settings source in the root directory
    ///
    /// Searches in this order:
    /// 1. `packcfg.toml`
    /// 2. `package.json` (`packcfg` field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(SETTINGS_FILE);
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        let parsed = fs::read_to_string(&pkg_path)
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())?;
        parsed
            .get(PACKAGE_JSON_FIELD)
            .is_some_and(|field| !field.is_null())
            .then_some(pkg_path)
    }

    /// Load settings from the discovered source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if neither source exists.
    pub fn load(&self) -> Result<BuilderSettings> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            return load_from_package_json(&path);
        }
        BuilderSettings::load_from(&path)
    }

    /// Like [`load`](Self::load), falling back to defaults plus environment.
    pub fn load_or_default(&self) -> Result<BuilderSettings> {
        match self.load() {
            Err(ConfigError::NotFound) => BuilderSettings::load(&self.root),
            other => other,
        }
    }
}

fn load_from_package_json(path: &Path) -> Result<BuilderSettings> {
    let content = fs::read_to_string(path)?;

    let mut parsed: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: "package.json".to_string(),
            hint: Some(format!("Invalid JSON: {e}")),
        })?;

    let field = parsed
        .get_mut(PACKAGE_JSON_FIELD)
        .map(serde_json::Value::take)
        .ok_or_else(|| ConfigError::InvalidValue {
            field: PACKAGE_JSON_FIELD.to_string(),
            hint: Some("Add a 'packcfg' field to your package.json".to_string()),
        })?;

    serde_json::from_value(field).map_err(|e| ConfigError::InvalidValue {
        field: PACKAGE_JSON_FIELD.to_string(),
        hint: Some(e.to_string()),
    })
}

/// Load a configuration fragment from a `.toml` or `.json` file.
pub fn load_fragment(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let json = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let toml_val: toml::Value =
                toml::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                    field: path.display().to_string(),
                    hint: Some(format!("Invalid TOML syntax: {e}")),
                })?;
            serde_json::to_value(toml_val).map_err(|e| ConfigError::InvalidValue {
                field: path.display().to_string(),
                hint: Some(format!("TOML to JSON conversion failed: {e}")),
            })?
        }
        Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: path.display().to_string(),
            hint: Some(format!("Invalid JSON: {e}")),
        })?,
        other => {
            return Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            ));
        }
    };

    Ok(Value::from(json))
}
