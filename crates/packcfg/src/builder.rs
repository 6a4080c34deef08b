//! The configuration builder.
//!
//! Every method folds one small fragment into the held tree through
//! [`merge_values`], so chained calls compose left to right.
//!
//! # Examples
//!
//! ```no_run
//! use packcfg::{ConfigBuilder, Mode};
//!
//! # fn example() -> packcfg::Result<()> {
//! let config = ConfigBuilder::new()
//!     .mode(Mode::from_env())
//!     .loader([".js", ".jsx"], "babel-loader")?
//!     .extensions([".js", ".jsx"])
//!     .src(["src/*.js"])?
//!     .dest("build/public/js", false)?
//!     .vendor(["react", "react-dom"])
//!     .build();
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use path_clean::PathClean;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::dev_server::{ProxyFactory, RequestHook, SharedProxyFactory};
use crate::discovery::load_fragment;
use crate::entry::EntryMap;
use crate::error::Result;
use crate::externals::Externals;
use crate::loader::LoaderRule;
use crate::plugin::{ManifestPluginFactory, Plugin, SharedManifestFactory};
use crate::settings::BuilderSettings;
use crate::value::{Function, Map, Value, merge_values};

/// Fluent builder for a bundler configuration tree.
#[derive(Clone)]
pub struct ConfigBuilder {
    config: Value,
    settings: BuilderSettings,
    manifest: Option<SharedManifestFactory>,
    proxy: Option<SharedProxyFactory>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Builder with default settings and no optional capabilities.
    pub fn new() -> Self {
        Self::from_settings(BuilderSettings::default())
    }

    /// Builder whose working directory, dependency directory and externals kind
    /// come from `settings`.
    pub fn from_settings(settings: BuilderSettings) -> Self {
        Self {
            config: Value::object(),
            settings,
            manifest: None,
            proxy: None,
        }
    }

    /// Make a manifest plugin available; enables fingerprinted filenames in
    /// [`dest`](Self::dest).
    pub fn with_manifest(mut self, factory: impl ManifestPluginFactory + 'static) -> Self {
        let factory: SharedManifestFactory = Arc::new(factory);
        self.manifest = Some(factory);
        self
    }

    /// Make a reverse proxy available to [`dev_server`](Self::dev_server).
    pub fn with_proxy(mut self, factory: impl ProxyFactory + 'static) -> Self {
        let factory: SharedProxyFactory = Arc::new(factory);
        self.proxy = Some(factory);
        self
    }

    /// Resolve globs and output paths against `dir` instead of the process cwd.
    pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.cwd = Some(dir.into());
        self
    }

    /// Settings this builder was created with.
    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// The tree accumulated so far.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Deep-merge fragments into the tree.
    ///
    /// Objects merge key by key, arrays concatenate, anything else is
    /// replaced by the later value. Only object fragments apply at the root.
    pub fn merge<I, V>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for fragment in fragments {
            match fragment.into() {
                fragment @ Value::Object(_) => merge_values(&mut self.config, fragment),
                other => debug!("ignoring non-object root fragment: {}", other),
            }
        }
        self
    }

    fn merge_at(self, path: &[&str], leaf: impl Into<Value>) -> Self {
        self.merge([fragment(path, leaf.into())])
    }

    /// Merge a `.toml` or `.json` fragment file.
    pub fn merge_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let fragment = load_fragment(path.as_ref())?;
        debug!("merging fragment file {}", path.as_ref().display());
        Ok(self.merge([fragment]))
    }

    /// Module resolution aliases (`resolve.alias`).
    pub fn alias(self, aliases: impl Into<Value>) -> Self {
        self.merge_at(&["resolve", "alias"], aliases)
    }

    /// Resolvable file extensions (`resolve.extensions`).
    pub fn extensions<I, S>(self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Value = extensions
            .into_iter()
            .map(|ext| Value::String(ext.into()))
            .collect();
        self.merge_at(&["resolve", "extensions"], list)
    }

    /// Append a loader rule for files ending in any of `extensions`.
    pub fn loader<I, S>(self, extensions: I, loader: impl Into<Value>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rule = LoaderRule::for_extensions(extensions, loader)?;
        self.push_rule(rule)
    }

    /// [`loader`](Self::loader) with loader parameters (`query`).
    pub fn loader_with<I, S>(
        self,
        extensions: I,
        loader: impl Into<Value>,
        query: impl Into<Value>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rule = LoaderRule::for_extensions(extensions, loader)?.with_query(query);
        self.push_rule(rule)
    }

    fn push_rule(self, rule: LoaderRule) -> Result<Self> {
        let rule = rule.excluding(&self.settings.dependency_dir)?;
        debug!("adding loader rule {}", rule.test);
        Ok(self.merge_at(&["module", "rules"], vec![Value::from(rule)]))
    }

    /// Leave `modules` out of the bundle, using the configured module kind.
    pub fn externals<I, S>(self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = self.settings.externals_kind.clone();
        self.externals_as(modules, kind)
    }

    /// Leave `modules` out of the bundle as `kind` (`commonjs`, `amd`, ...).
    ///
    /// Entries are package names or absolute file paths written exactly as
    /// they are imported (usually without extension).
    pub fn externals_as<I, S>(self, modules: I, kind: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let externals = Externals::new(modules, kind);
        self.merge_at(&["externals"], Function::Externals(externals))
    }

    /// Entry points from glob patterns, relative to the working directory.
    ///
    /// Nothing is merged when no file matches.
    pub fn src<I, S>(self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cwd = self.cwd()?;
        let entries = EntryMap::from_globs(&cwd, patterns)?;
        if entries.is_empty() {
            debug!("no entry files matched in {}", cwd.display());
            return Ok(self);
        }

        debug!("resolved {} entry points", entries.len());
        Ok(self.merge_at(&["entry"], entries))
    }

    /// Output directory and filename template.
    ///
    /// With `use_content_hash` and a manifest plugin available, filenames
    /// carry a `[chunkhash]` and the manifest plugin is appended.
    pub fn dest(self, dir: impl AsRef<Path>, use_content_hash: bool) -> Result<Self> {
        let path = self.resolve_path(dir.as_ref())?;

        let manifest = match (&self.manifest, use_content_hash) {
            (Some(factory), true) => Some(factory.create()),
            (None, true) => {
                debug!("no manifest plugin available, output filenames not fingerprinted");
                None
            }
            _ => None,
        };

        let filename = if manifest.is_some() {
            "[chunkhash].[name].js"
        } else {
            "[name].js"
        };

        let this = match manifest {
            Some(plugin) => self.plugins([plugin]),
            None => self,
        };

        let output: Value = [("path", Value::from(path)), ("filename", Value::from(filename))]
            .into_iter()
            .collect();
        Ok(this.merge_at(&["output"], output))
    }

    /// [`dest`](Self::dest) with the `content_hash` setting.
    pub fn dest_default(self, dir: impl AsRef<Path>) -> Result<Self> {
        let use_content_hash = self.settings.content_hash;
        self.dest(dir, use_content_hash)
    }

    /// Source maps and path info; no-op when `enable` is false.
    pub fn development(self, enable: bool) -> Self {
        if !enable {
            return self;
        }
        self.merge_at(&["devtool"], "source-map")
            .merge_at(&["output", "pathinfo"], true)
    }

    /// Minification and the production build-mode constant; no-op when
    /// `enable` is false.
    pub fn production(self, enable: bool) -> Self {
        if !enable {
            return self;
        }
        self.plugins([
            Plugin::minify(),
            Plugin::define_node_env(Mode::Production.as_str()),
        ])
    }

    /// Apply [`development`](Self::development) and
    /// [`production`](Self::production) for `mode`.
    pub fn mode(self, mode: Mode) -> Self {
        self.development(mode == Mode::Development)
            .production(mode == Mode::Production)
    }

    /// Dev-server options with the error overlay on.
    ///
    /// A `proxy` key is removed from `options` and turned into the
    /// `devServer.after` request hook.
    pub fn dev_server(self, options: impl Into<Value>) -> Self {
        let mut options = match options.into() {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                debug!("ignoring non-object dev server options: {}", other);
                Map::new()
            }
        };
        let proxy_spec = options.shift_remove("proxy");
        let hook = RequestHook::for_spec(proxy_spec.as_ref(), self.proxy.as_ref());

        let mut dev_server = Map::new();
        dev_server.insert("overlay".into(), Value::Bool(true));
        dev_server.insert(
            "after".into(),
            Value::Function(Function::RequestHook(hook)),
        );
        dev_server.extend(options);

        self.merge_at(&["devServer"], dev_server)
    }

    /// Append plugin instances to `plugins`.
    pub fn plugins<I, P>(self, plugins: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Value>,
    {
        let list = Value::Array(plugins.into_iter().map(Into::into).collect());
        self.merge_at(&["plugins"], list)
    }

    /// Split `modules` into a shared `vendor` chunk.
    pub fn vendor<I, S>(self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let modules: Value = modules
            .into_iter()
            .map(|m| Value::String(m.into()))
            .collect();
        self.plugins([Plugin::commons_chunk(["vendor", "manifest"])])
            .merge_at(&["entry", "vendor"], modules)
    }

    /// Snapshot of the accumulated configuration.
    ///
    /// The builder stays usable; later calls do not affect returned snapshots.
    pub fn build(&self) -> Configuration {
        Configuration(self.config.clone())
    }

    /// Finish building without copying the tree.
    pub fn into_config(self) -> Configuration {
        Configuration(self.config)
    }

    fn cwd(&self) -> Result<PathBuf> {
        match &self.settings.cwd {
            Some(dir) if dir.is_absolute() => Ok(dir.clean()),
            Some(dir) => Ok(std::env::current_dir()?.join(dir).clean()),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.clean());
        }
        Ok(self.cwd()?.join(path).clean())
    }
}

impl fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("manifest", &self.manifest.is_some())
            .field("proxy", &self.proxy.is_some())
            .finish()
    }
}

/// Nest `leaf` under `path`, e.g. `["resolve", "alias"]` gives
/// `{resolve: {alias: leaf}}`.
fn fragment(path: &[&str], leaf: Value) -> Value {
    path.iter().rev().fold(leaf, |inner, key| {
        let mut map = Map::new();
        map.insert((*key).to_string(), inner);
        Value::Object(map)
    })
}

/// The finished configuration tree handed to the bundler.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration(Value);

impl Configuration {
    /// Borrow the tree.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the tree.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `externals` resolver, if one was configured.
    pub fn externals(&self) -> Option<&Externals> {
        match self.0.get("externals")?.as_function()? {
            Function::Externals(externals) => Some(externals),
            _ => None,
        }
    }

    /// The dev-server request hook, if `dev_server` was called.
    pub fn request_hook(&self) -> Option<&RequestHook> {
        match self.0.pointer("devServer/after")?.as_function()? {
            Function::RequestHook(hook) => Some(hook),
            _ => None,
        }
    }
}

impl Deref for Configuration {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl Serialize for Configuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Build mode, as read from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// The `NODE_ENV` spelling of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    /// `NODE_ENV`, defaulting to development when unset or unrecognized.
    pub fn from_env() -> Self {
        std::env::var("NODE_ENV")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!("Invalid mode: {}", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
