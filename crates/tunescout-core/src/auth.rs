use serde::{Deserialize, Serialize};
use url::Url;

pub const SIGN_IN_PATH: &str = "/auth/sign-in";
pub const REDIRECT_PARAM: &str = "redirect_url";

const BYPASS_PREFIXES: [&str; 3] = ["/_next/image", "/_next/static", "/favicon.ico"];

const EDGE_HEADERS: [(&str, &str); 2] = [
    ("x-modified-edge", "true"),
    (
        "cache-control",
        "s-maxage=2678400, stale-while-revalidate=2678400",
    ),
];

/// An already-verified session. Verifying tokens is the identity
/// provider's job.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
}

impl SessionIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GateRequest {
    pub url: Url,
    pub session: Option<SessionIdentity>,
}

impl GateRequest {
    pub fn new(url: Url, session: Option<SessionIdentity>) -> Self {
        Self { url, session }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Static assets skip the gate entirely.
    PassThrough,
    Allow { headers: Vec<(String, String)> },
    Redirect { location: String },
}

impl GateDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PublicPath {
    Exact(String),
    /// Matches the prefix itself and anything below it as a path segment.
    Prefix(String),
}

impl PublicPath {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => path == expected,
            Self::Prefix(prefix) => {
                let prefix = prefix.trim_end_matches('/');
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthGate {
    public_paths: Vec<PublicPath>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new(vec![
            PublicPath::Exact("/".to_string()),
            PublicPath::Prefix("/auth".to_string()),
        ])
    }
}

impl AuthGate {
    pub fn new(public_paths: Vec<PublicPath>) -> Self {
        Self { public_paths }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| public.matches(path))
    }

    pub fn evaluate(&self, request: &GateRequest) -> GateDecision {
        let path = request.url.path();
        if is_bypassed(path) {
            return GateDecision::PassThrough;
        }

        if request.session.is_some() || self.is_public(path) {
            return GateDecision::Allow {
                headers: edge_headers(),
            };
        }

        let location = sign_in_location(&request.url);
        tracing::debug!(path = %path, location = %location, "redirecting to sign-in");
        GateDecision::Redirect { location }
    }
}

pub fn sign_in_location(original: &Url) -> String {
    let mut location = original.clone();
    location.set_path(SIGN_IN_PATH);
    location.set_query(None);
    location.set_fragment(None);
    location
        .query_pairs_mut()
        .append_pair(REDIRECT_PARAM, original.as_str());
    location.to_string()
}

fn is_bypassed(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

fn edge_headers() -> Vec<(String, String)> {
    EDGE_HEADERS
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
