// Same-origin check for state-changing requests

use axum::http::Method;
use url::Url;

// The app's dev servers are always trusted
const LOCAL_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3001"];

// Inbound callbacks from third parties can't carry our origin
const EXEMPT_PATHS: [&str; 2] = ["/api/stripe/webhooks", "/api/auth/webhook"];
const EXEMPT_PREFIXES: [&str; 1] = ["/auth/callback"];

#[derive(Debug, Clone)]
pub struct OriginGuard {
    allowed_origins: Vec<String>,
}

impl OriginGuard {
    /// Trusts the local dev origins plus `app_url`.
    pub fn new(app_url: &str) -> Self {
        let mut allowed_origins: Vec<String> =
            LOCAL_ORIGINS.iter().map(|o| o.to_string()).collect();

        let app_url = app_url.trim().trim_end_matches('/');
        if !app_url.is_empty() && !allowed_origins.iter().any(|o| o == app_url) {
            allowed_origins.push(app_url.to_string());
        }

        Self { allowed_origins }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Full gate: safe methods and callback paths pass, everything else
    /// needs a trusted origin.
    pub fn permits(
        &self,
        method: &Method,
        path: &str,
        origin: Option<&str>,
        referer: Option<&str>,
    ) -> bool {
        if is_safe_method(method) || is_exempt_path(path) {
            return true;
        }
        self.is_allowed_origin(origin, referer)
    }

    /// `Origin` must match exactly. Without it, the origin part of
    /// `Referer` is matched instead. Neither present means no.
    pub fn is_allowed_origin(&self, origin: Option<&str>, referer: Option<&str>) -> bool {
        if let Some(origin) = origin {
            if self.is_trusted(origin) {
                return true;
            }
        }

        match referer.and_then(referer_origin) {
            Some(origin) => self.is_trusted(&origin),
            None => false,
        }
    }

    fn is_trusted(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn is_exempt_path(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path) || EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p))
}

// Unparsable or opaque referers are treated as missing
fn referer_origin(referer: &str) -> Option<String> {
    let origin = Url::parse(referer).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
