//! Loader rules (`module.rules` entries).

use crate::error::Result;
use crate::value::{Map, Pattern, Value};

/// Dependency directory excluded from every loader rule by default.
pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";

/// One `module.rules` entry: files whose path matches `test` (and not
/// `exclude`) are run through `loader`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderRule {
    pub test: Pattern,
    pub loader: Value,
    pub exclude: Pattern,
    pub query: Option<Value>,
}

impl LoaderRule {
    /// Build a rule matching any of `extensions` at the end of a path.
    ///
    /// Each extension is matched literally, so `.js` never matches `xjs`.
    pub fn for_extensions<I, S>(extensions: I, loader: impl Into<Value>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives = extensions
            .into_iter()
            .map(|ext| regex::escape(ext.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            test: Pattern::new(&format!("({alternatives})$"))?,
            loader: loader.into(),
            exclude: dependency_dir_pattern(DEFAULT_DEPENDENCY_DIR)?,
            query: None,
        })
    }

    /// Attach loader parameters.
    pub fn with_query(mut self, query: impl Into<Value>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Exclude a different dependency directory.
    pub fn excluding(mut self, dependency_dir: &str) -> Result<Self> {
        self.exclude = dependency_dir_pattern(dependency_dir)?;
        Ok(self)
    }

    /// Whether the rule applies to `path`: `test` matches and `exclude` does not.
    pub fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.is_match(path)
    }
}

/// `/<dir>` anywhere in a path.
fn dependency_dir_pattern(dir: &str) -> Result<Pattern> {
    Ok(Pattern::new(&format!("/{}", regex::escape(dir)))?)
}

impl From<LoaderRule> for Value {
    fn from(rule: LoaderRule) -> Self {
        let mut map = Map::new();
        map.insert("test".into(), Value::Regex(rule.test));
        map.insert("loader".into(), rule.loader);
        map.insert("exclude".into(), Value::Regex(rule.exclude));
        if let Some(query) = rule.query {
            map.insert("query".into(), query);
        }
        Value::Object(map)
    }
}
