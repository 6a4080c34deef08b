//! Builder settings loaded from defaults, `packcfg.toml` and the environment.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::externals::DEFAULT_MODULE_KIND;
use crate::loader::DEFAULT_DEPENDENCY_DIR;

/// Settings file looked up in the project root.
pub const SETTINGS_FILE: &str = "packcfg.toml";

/// Prefix for environment overrides (`PACKCFG_DEPENDENCY_DIR`, ...).
pub const ENV_PREFIX: &str = "PACKCFG_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderSettings {
    /// Directory globs and output paths resolve against; process cwd if unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Directory excluded from loader rules.
    #[serde(default = "default_dependency_dir")]
    pub dependency_dir: String,

    /// Module kind used by `externals` when none is given.
    #[serde(default = "default_externals_kind")]
    pub externals_kind: String,

    /// Whether `dest_default` fingerprints output filenames.
    #[serde(default = "default_true")]
    pub content_hash: bool,

    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            cwd: None,
            dependency_dir: default_dependency_dir(),
            externals_kind: default_externals_kind(),
            content_hash: true,
            log_level: None,
        }
    }
}

impl BuilderSettings {
    /// Load settings for a project root.
    ///
    /// Priority: environment variables > `packcfg.toml` > defaults.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(SETTINGS_FILE);
        Self::figment(path.exists().then_some(path.as_path())).extract().map_err(Into::into)
    }

    /// Load settings from an explicit file, still honoring the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::figment(Some(path.as_ref())).extract().map_err(Into::into)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }
}

fn default_dependency_dir() -> String {
    DEFAULT_DEPENDENCY_DIR.into()
}

fn default_externals_kind() -> String {
    DEFAULT_MODULE_KIND.into()
}

fn default_true() -> bool {
    true
}
