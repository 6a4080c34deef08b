//! The `externals` resolver.
//!
//! Modules listed here are left out of the bundle and loaded at runtime
//! instead. The list may hold bare package names (`react`, `@scope/pkg`) or
//! absolute file paths without extension, matching how the file is imported.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use path_clean::PathClean;
use regex::Regex;

/// Default module kind for externalized requests.
pub const DEFAULT_MODULE_KIND: &str = "commonjs";

/// Relative (`./`, `../`) or absolute (`/`) requests refer to files.
static FILE_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\.\.?|/)").expect("file request pattern is valid"));

/// Package name of a request, after any `loader!` prefixes.
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*!)?((?:@[^/]+/)?[^/]+)").expect("package name pattern is valid")
});

/// Classifies module requests as external.
#[derive(Debug, Clone, PartialEq)]
pub struct Externals {
    modules: Arc<[String]>,
    kind: String,
}

impl Externals {
    /// Resolver for `modules`, emitted as `kind`.
    pub fn new<I, S>(modules: I, kind: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
            kind: kind.into(),
        }
    }

    /// Module names and file paths treated as external.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Module kind prefixed to resolved requests.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Resolve `request`, issued from a module in `context`.
    ///
    /// Returns `Some("<kind> <request>")` when the request is external and
    /// `None` when normal resolution should proceed.
    pub fn resolve(&self, context: &Path, request: &str) -> Option<String> {
        let module = module_key(context, request)?;
        self.modules
            .iter()
            .any(|m| *m == module)
            .then(|| format!("{} {}", self.kind, request))
    }

    /// Whether [`resolve`](Self::resolve) would claim `request`.
    pub fn is_external(&self, context: &Path, request: &str) -> bool {
        self.resolve(context, request).is_some()
    }
}

/// The key a request is looked up by: an absolute path for file requests,
/// the package name otherwise.
///
/// For `@scope/name` requests the file test runs against the segment after
/// the scope, so `@scope/../x` is treated as a file request.
fn module_key(context: &Path, request: &str) -> Option<String> {
    let candidate = if request.starts_with('@') {
        request.split('/').nth(1)
    } else {
        Some(request)
    };

    match candidate {
        Some(file) if FILE_REQUEST.is_match(file) => Some(
            context
                .join(file)
                .clean()
                .to_string_lossy()
                .into_owned(),
        ),
        _ => PACKAGE_NAME
            .captures(request)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
    }
}
