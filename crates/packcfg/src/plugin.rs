//! Plugin descriptors.
//!
//! The bundler owns the real plugin implementations; the tree only records
//! which plugin to instantiate and with which options.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// An opaque plugin instance as recorded in `plugins`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plugin {
    name: String,
    options: Box<Value>,
}

impl Plugin {
    /// Descriptor for plugin `name` constructed with `options`.
    pub fn new(name: impl Into<String>, options: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            options: Box::new(options.into()),
        }
    }

    /// Plugin that takes no options.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    /// Plugin constructor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options passed to the plugin constructor.
    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Minifier used for production builds.
    ///
    /// Comments are stripped and compressor warnings suppressed.
    pub fn minify() -> Self {
        let options: Value = [
            ("comments", Value::from(false)),
            (
                "compress",
                [("warnings", Value::from(false))].into_iter().collect(),
            ),
            ("minimize", Value::from(true)),
        ]
        .into_iter()
        .collect();
        Self::new("UglifyJsPlugin", options)
    }

    /// Compile-time constant definitions.
    ///
    /// Values are inserted verbatim into the output, so string constants
    /// must carry their own quotes.
    pub fn define<I, K, V>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new("DefinePlugin", definitions.into_iter().collect::<Value>())
    }

    /// Build-mode constant consumed by dead-code elimination downstream.
    pub fn define_node_env(mode: &str) -> Self {
        let literal = serde_json::Value::String(mode.to_string()).to_string();
        Self::define([("process.env.NODE_ENV", literal)])
    }

    /// Shared-chunk extraction into the given chunk names.
    pub fn commons_chunk<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Value = names.into_iter().map(|n| Value::String(n.into())).collect();
        Self::new(
            "CommonsChunkPlugin",
            [("names", names)].into_iter().collect::<Value>(),
        )
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Produces the manifest plugin used when output filenames are fingerprinted.
///
/// Injected at builder construction; a builder without one never emits
/// content-hashed filenames.
pub trait ManifestPluginFactory: Send + Sync {
    fn create(&self) -> Plugin;
}

impl<F> ManifestPluginFactory for F
where
    F: Fn() -> Plugin + Send + Sync,
{
    fn create(&self) -> Plugin {
        self()
    }
}

/// The stock manifest plugin, taking no options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestPlugin;

impl ManifestPluginFactory for ManifestPlugin {
    fn create(&self) -> Plugin {
        Plugin::named("ManifestPlugin")
    }
}

/// Manifest factory shared between builder clones.
pub type SharedManifestFactory = Arc<dyn ManifestPluginFactory>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minify_options_match_production_settings() {
        let plugin = Plugin::minify();
        assert_eq!(plugin.name(), "UglifyJsPlugin");
        assert_eq!(
            plugin.options().to_json(),
            json!({"comments": false, "compress": {"warnings": false}, "minimize": true})
        );
    }

    #[test]
    fn node_env_is_a_quoted_literal() {
        let plugin = Plugin::define_node_env("production");
        assert_eq!(
            plugin.options()["process.env.NODE_ENV"],
            Value::from("\"production\"")
        );
    }

    #[test]
    fn commons_chunk_records_names() {
        let plugin = Plugin::commons_chunk(["vendor", "manifest"]);
        assert_eq!(plugin.options().to_json(), json!({"names": ["vendor", "manifest"]}));
    }

    #[test]
    fn closures_are_manifest_factories() {
        let factory = || Plugin::named("AssetsManifest");
        assert_eq!(factory.create().name(), "AssetsManifest");
        assert_eq!(ManifestPlugin.create().name(), "ManifestPlugin");
    }
}
