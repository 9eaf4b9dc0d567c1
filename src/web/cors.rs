//! Cross-origin access for the browser frontend.

use axum::http::{HeaderValue, Method, header, request::Parts};
use std::collections::HashSet;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);
const FRONTEND_DEV_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    /// Normalized origins, see [`normalize_origin`].
    List(HashSet<String>),
}

/// Trimmed, lowercased, without trailing slashes. `None` when nothing is left.
pub fn normalize_origin(origin: &str) -> Option<String> {
    let origin = origin.trim().trim_end_matches('/');
    (!origin.is_empty()).then(|| origin.to_lowercase())
}

impl AllowedOrigins {
    /// Configured origins plus the local frontend ones. A `*` entry allows every origin.
    pub fn from_config(configured: &[String], listen_port: Option<u16>) -> Self {
        if configured.iter().any(|origin| origin.trim() == "*") {
            return Self::Any;
        }
        let mut ports = vec![FRONTEND_DEV_PORT];
        if let Some(port) = listen_port.filter(|port| *port != FRONTEND_DEV_PORT) {
            ports.push(port);
        }
        let local = ports
            .into_iter()
            .flat_map(|port| [format!("http://localhost:{port}"), format!("http://127.0.0.1:{port}")]);
        let origins = configured
            .iter()
            .cloned()
            .chain(local)
            .filter_map(|origin| normalize_origin(&origin))
            .collect();
        Self::List(origins)
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => normalize_origin(origin).is_some_and(|origin| origins.contains(&origin)),
        }
    }

    pub fn layer(&self) -> CorsLayer {
        let allow_origin = match self {
            // `*` cannot be sent together with credentials, so echo the caller instead.
            Self::Any => AllowOrigin::mirror_request(),
            Self::List(_) => {
                let allowed = self.clone();
                AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
                    origin.to_str().is_ok_and(|origin| allowed.allows(origin))
                })
            }
        };
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([header::AUTHORIZATION])
            .allow_credentials(true)
            .max_age(PREFLIGHT_MAX_AGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_origin() {
        assert_eq!(normalize_origin(" HTTPS://App.Example.com/ "), Some("https://app.example.com".to_string()));
        assert_eq!(normalize_origin("http://x.test//"), Some("http://x.test".to_string()));
        assert_eq!(normalize_origin("   "), None);
        assert_eq!(normalize_origin("/"), None);
    }

    #[test]
    fn test_local_origins_always_added() {
        let origins = AllowedOrigins::from_config(&["https://app.example.com/".to_string()], Some(8080));
        for origin in [
            "https://app.example.com",
            "http://localhost:3000",
            "http://127.0.0.1:3000",
            "http://localhost:8080",
            "http://127.0.0.1:8080",
        ] {
            assert!(origins.allows(origin), "{origin} should be allowed");
        }
        assert!(origins.allows("HTTPS://APP.EXAMPLE.COM/"));
        assert!(!origins.allows("https://evil.example.com"));
        assert!(!origins.allows(""));
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let origins = AllowedOrigins::from_config(&["https://a.example".to_string(), " * ".to_string()], None);
        assert_eq!(origins, AllowedOrigins::Any);
        assert!(origins.allows("https://anything.example"));
    }
}
