//! Fluent builder for bundler configuration trees.
//!
//! [`ConfigBuilder`] accumulates entry points, output paths, loader rules,
//! plugins and dev-server options by deep-merging small fragments, then hands
//! the result to the bundler as a plain [`Value`] tree.

pub mod builder;
pub mod dev_server;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod externals;
pub mod loader;
pub mod plugin;
pub mod settings;
pub mod value;

#[cfg(feature = "logging")]
pub mod logging;

// Re-export main types
pub use builder::{ConfigBuilder, Configuration, Mode};
pub use dev_server::{ProxyError, ProxyFactory, Request, RequestHook, Response, ReverseProxy};
pub use entry::EntryMap;
pub use error::*;
pub use externals::Externals;
pub use loader::LoaderRule;
pub use plugin::{ManifestPlugin, ManifestPluginFactory, Plugin};
pub use settings::BuilderSettings;
pub use value::{Function, Map, Pattern, Value, merge_values};

pub use discovery::{ConfigDiscovery, load_fragment};

/// Start a new builder with default settings.
pub fn builder() -> ConfigBuilder {
    ConfigBuilder::new()
}
