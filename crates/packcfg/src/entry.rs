//! Entry point discovery from glob patterns.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern as GlobPattern, glob_with};
use indexmap::IndexMap;
use path_clean::PathClean;
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::value::{Map, Value};

/// Named entry points resolved from a set of globs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMap {
    /// Directory the entry names are relative to; `None` when nothing matched.
    pub base: Option<PathBuf>,
    /// Module name to absolute file path, in sorted path order.
    pub entries: IndexMap<String, PathBuf>,
}

impl EntryMap {
    /// Expand `patterns` relative to `cwd` and name each match.
    pub fn from_globs<I, S>(cwd: &Path, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files = expand_globs(cwd, patterns)?;
        Ok(Self::from_files(&files))
    }

    /// Name already-resolved absolute files.
    pub fn from_files(files: &[PathBuf]) -> Self {
        let Some(base) = common_base(files) else {
            return Self::default();
        };

        let mut entries = IndexMap::with_capacity(files.len());
        for file in files {
            let name = entry_name(&base, file);
            if let Some(previous) = entries.insert(name.clone(), file.clone()) {
                warn!(
                    entry = %name,
                    replaced = %previous.display(),
                    with = %file.display(),
                    "entry name collision"
                );
            }
        }

        Self {
            base: Some(base),
            entries,
        }
    }

    /// Returns true when no file matched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of named entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<EntryMap> for Value {
    fn from(map: EntryMap) -> Self {
        Value::Object(
            map.entries
                .into_iter()
                .map(|(name, path)| (name, Value::from(path)))
                .collect::<Map>(),
        )
    }
}

/// Expand glob patterns into a sorted, de-duplicated list of absolute files.
///
/// Relative patterns are evaluated against `cwd`. Patterns prefixed with `!`
/// remove their matches from the result.
pub fn expand_globs<I, S>(cwd: &Path, patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut included = BTreeSet::new();
    let mut excluded = BTreeSet::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        match pattern.strip_prefix('!') {
            Some(negated) => excluded.extend(match_files(cwd, negated)?),
            None => included.extend(match_files(cwd, pattern)?),
        }
    }

    Ok(included
        .into_iter()
        .filter(|file| !excluded.contains(file))
        .collect())
}

/// Dotfiles only match when the pattern spells out the leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

fn match_files(cwd: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    // The working directory is literal text, never pattern syntax.
    let base = PathBuf::from(GlobPattern::escape(&cwd.to_string_lossy()));
    let full_pattern = base.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths = glob_with(&pattern_str, MATCH_OPTIONS).map_err(|source| {
        ConfigError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        }
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| ConfigError::Io(err.into_error()))?;
        if path.is_file() {
            files.push(path.clean());
        }
    }
    Ok(files)
}

/// A single file's own directory, or the deepest directory shared by all files.
pub fn common_base(files: &[PathBuf]) -> Option<PathBuf> {
    match files {
        [] => None,
        [only] => Some(only.parent().map(Path::to_path_buf).unwrap_or_default()),
        [first, rest @ ..] => {
            let mut prefix: Vec<Component<'_>> = parent_components(first);
            for file in rest {
                let shared = prefix
                    .iter()
                    .zip(parent_components(file))
                    .take_while(|(a, b)| **a == *b)
                    .count();
                prefix.truncate(shared);
            }
            Some(prefix.iter().collect())
        }
    }
}

fn parent_components(file: &Path) -> Vec<Component<'_>> {
    file.parent()
        .map(|dir| dir.components().collect())
        .unwrap_or_default()
}

/// Path of `file` relative to `base`, extension stripped, `/`-separated.
fn entry_name(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
