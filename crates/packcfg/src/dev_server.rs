//! Development server request hook and the reverse-proxy seam.
//!
//! The dev server itself is external. It calls [`RequestHook::handle`] once
//! per incoming request; when a proxy was configured the hook forwards the
//! request through it.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::value::{Map, Value};

/// An incoming dev-server request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Request with no headers and an empty body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }
}

/// The response a proxy writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// Errors raised while building or using a reverse proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid proxy options: {0}")]
    InvalidOptions(String),

    #[error("proxy target unreachable: {0}")]
    Unreachable(String),

    #[error("proxy I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Forwards requests to a backend.
pub trait ReverseProxy: Send + Sync {
    fn forward(
        &self,
        request: &Request,
        response: &mut Response,
        options: &Map,
    ) -> Result<(), ProxyError>;
}

/// Builds a [`ReverseProxy`] from the `proxy` section of dev-server options.
pub trait ProxyFactory: Send + Sync {
    fn create(&self, spec: &Value) -> Result<Arc<dyn ReverseProxy>, ProxyError>;
}

impl<F> ProxyFactory for F
where
    F: Fn(&Value) -> Result<Arc<dyn ReverseProxy>, ProxyError> + Send + Sync,
{
    fn create(&self, spec: &Value) -> Result<Arc<dyn ReverseProxy>, ProxyError> {
        self(spec)
    }
}

/// Proxy factory shared between builder clones.
pub type SharedProxyFactory = Arc<dyn ProxyFactory>;

/// Hook installed as `devServer.after`.
#[derive(Clone, Default)]
pub struct RequestHook {
    proxy: Option<Arc<dyn ReverseProxy>>,
}

impl RequestHook {
    /// A hook that lets every request through untouched.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// A hook that forwards every request through `proxy`.
    pub fn proxying(proxy: Arc<dyn ReverseProxy>) -> Self {
        Self { proxy: Some(proxy) }
    }

    /// Build the hook for a `proxy` spec.
    ///
    /// A missing factory or a spec the factory rejects leaves the hook as a
    /// passthrough.
    pub fn for_spec(spec: Option<&Value>, factory: Option<&SharedProxyFactory>) -> Self {
        let Some(spec) = spec.filter(|s| !s.is_null()) else {
            return Self::passthrough();
        };
        let Some(factory) = factory else {
            debug!("no reverse proxy available, proxy options ignored");
            return Self::passthrough();
        };

        match factory.create(spec) {
            Ok(proxy) => Self::proxying(proxy),
            Err(err) => {
                warn!(error = %err, "reverse proxy could not be created");
                Self::passthrough()
            }
        }
    }

    /// Whether requests are forwarded.
    pub fn is_proxying(&self) -> bool {
        self.proxy.is_some()
    }

    /// Handle one request.
    ///
    /// `next` continues the server's handler chain: it runs with `None` when
    /// no proxy is configured, with the error when forwarding fails, and not
    /// at all when the proxy produced the response.
    pub fn handle<N>(&self, request: &Request, response: &mut Response, next: N)
    where
        N: FnOnce(Option<ProxyError>),
    {
        let Some(proxy) = &self.proxy else {
            next(None);
            return;
        };

        info!(method = %request.method, url = %request.url, "dev server proxy");
        if let Err(err) = proxy.forward(request, response, &Map::new()) {
            next(Some(err));
        }
    }
}

impl PartialEq for RequestHook {
    fn eq(&self, other: &Self) -> bool {
        match (&self.proxy, &other.proxy) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for RequestHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHook")
            .field("proxying", &self.is_proxying())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ReverseProxy for Recording {
        fn forward(
            &self,
            request: &Request,
            response: &mut Response,
            _options: &Map,
        ) -> Result<(), ProxyError> {
            self.seen.lock().unwrap().push(request.url.clone());
            if self.fail {
                return Err(ProxyError::Unreachable("localhost:8443".into()));
            }
            response.status = 202;
            Ok(())
        }
    }

    fn recording(fail: bool) -> Arc<Recording> {
        Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            fail,
        })
    }

    #[test]
    fn passthrough_calls_next_without_error() {
        let hook = RequestHook::passthrough();
        let mut called = false;
        hook.handle(&Request::new("GET", "/"), &mut Response::default(), |err| {
            assert!(err.is_none());
            called = true;
        });
        assert!(called);
    }

    #[test]
    fn proxied_request_skips_next() {
        let proxy = recording(false);
        let hook = RequestHook::proxying(proxy.clone());
        let mut response = Response::default();
        hook.handle(&Request::new("GET", "/api/users"), &mut response, |_| {
            panic!("next must not run after a successful forward")
        });
        assert_eq!(response.status, 202);
        assert_eq!(*proxy.seen.lock().unwrap(), vec!["/api/users".to_string()]);
    }

    #[test]
    fn proxy_failure_is_passed_to_next() {
        let hook = RequestHook::proxying(recording(true));
        let mut failure = None;
        hook.handle(&Request::new("POST", "/api"), &mut Response::default(), |err| {
            failure = err;
        });
        assert!(matches!(failure, Some(ProxyError::Unreachable(_))));
    }

    #[test]
    fn missing_factory_degrades_to_passthrough() {
        let spec = Value::from(serde_json::json!({"target": "https://localhost:8443/"}));
        assert!(!RequestHook::for_spec(Some(&spec), None).is_proxying());
        assert!(!RequestHook::for_spec(None, None).is_proxying());
    }

    #[test]
    fn rejected_spec_degrades_to_passthrough() {
        let factory: SharedProxyFactory = Arc::new(|_: &Value| -> Result<Arc<dyn ReverseProxy>, ProxyError> {
            Err(ProxyError::InvalidOptions("target missing".into()))
        });
        let hook = RequestHook::for_spec(Some(&Value::object()), Some(&factory));
        assert!(!hook.is_proxying());
    }

    #[test]
    fn hooks_compare_by_proxy_identity() {
        let proxy: Arc<dyn ReverseProxy> = recording(false);
        let a = RequestHook::proxying(proxy.clone());
        let b = RequestHook::proxying(proxy);
        assert_eq!(a, b);
        assert_ne!(a, RequestHook::proxying(recording(false)));
        assert_eq!(RequestHook::passthrough(), RequestHook::passthrough());
    }
}
