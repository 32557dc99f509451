use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use url::Url;

use crate::catalog::{CatalogResult, CatalogSource};
use crate::models::{CatalogOperation, CoreError, CoreErrorKind, Cursor};

const SEARCH_TYPES: &str = "album,track,artist";
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Blocking HTTP transport for the Spotify Web API using the
/// client-credentials flow.
pub struct HttpCatalogSource {
    agent: ureq::Agent,
    base_url: Url,
    token_url: String,
    credentials: ClientCredentials,
    token: Mutex<Option<AccessToken>>,
}

impl HttpCatalogSource {
    pub fn new(
        base_url: &str,
        token_url: impl Into<String>,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> CatalogResult<Self> {
        let mut base_url = Url::parse(base_url).map_err(|error| {
            CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("invalid catalog base url '{base_url}': {error}"),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("catalog base url '{base_url}' cannot carry a path"),
            ));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            base_url,
            token_url: token_url.into(),
            credentials,
            token: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> CatalogResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CoreError::new(CoreErrorKind::Internal, "catalog base url cannot be a base")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, operation: CatalogOperation, url: &Url) -> CatalogResult<String> {
        let token = self.access_token(operation)?;
        match self.send_get(url, &token) {
            Err(ureq::Error::Status(401, _)) => {
                // Token revoked or expired early; fetch a fresh one and retry once.
                self.clear_token();
                let token = self.access_token(operation)?;
                self.send_get(url, &token)
                    .map_err(|error| transport_error(operation, error))
                    .and_then(|response| read_body(operation, response))
            }
            result => result
                .map_err(|error| transport_error(operation, error))
                .and_then(|response| read_body(operation, response)),
        }
    }

    fn send_get(&self, url: &Url, token: &str) -> Result<ureq::Response, ureq::Error> {
        self.agent
            .get(url.as_str())
            .set("Authorization", &format!("Bearer {token}"))
            .set("Accept", "application/json")
            .call()
    }

    fn access_token(&self, operation: CatalogOperation) -> CatalogResult<String> {
        let mut slot = self.token.lock().map_err(|_| {
            CoreError::new(CoreErrorKind::Internal, "catalog token mutex poisoned")
                .with_operation(operation)
        })?;

        if let Some(token) = slot.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        let response = self
            .agent
            .post(&self.token_url)
            .set("Authorization", &self.credentials.basic_authorization())
            .send_form(&[("grant_type", "client_credentials")])
            .map_err(|error| match error {
                ureq::Error::Status(code @ (400 | 401), _) => CoreError::new(
                    CoreErrorKind::Unauthorized,
                    format!("catalog rejected client credentials (status {code})"),
                ),
                other => transport_error(operation, other),
            })
            .map_err(|error| error.with_operation(operation))?;
        let body = read_body(operation, response)?;
        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|error| {
            CoreError::new(
                CoreErrorKind::ParseFailure,
                format!("invalid token response: {error}"),
            )
            .with_operation(operation)
        })?;

        let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = parsed.access_token;
        *slot = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    fn clear_token(&self) {
        if let Ok(mut slot) = self.token.lock() {
            slot.take();
        }
    }
}

impl CatalogSource for HttpCatalogSource {
    fn search(&self, term: &str, limit: u32) -> CatalogResult<String> {
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut()
            .append_pair("q", term)
            .append_pair("type", SEARCH_TYPES)
            .append_pair("limit", &limit.to_string());
        self.get(CatalogOperation::Search, &url)
    }

    fn artist_albums(&self, artist_id: &str, limit: u32) -> CatalogResult<String> {
        let mut url = self.endpoint(&["artists", artist_id, "albums"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get(CatalogOperation::ArtistAlbums, &url)
    }

    fn album_tracks(&self, album_id: &str, limit: u32) -> CatalogResult<String> {
        let mut url = self.endpoint(&["albums", album_id, "tracks"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get(CatalogOperation::AlbumTracks, &url)
    }

    fn album(&self, album_id: &str) -> CatalogResult<String> {
        let url = self.endpoint(&["albums", album_id])?;
        self.get(CatalogOperation::Album, &url)
    }

    fn follow(&self, operation: CatalogOperation, cursor: &Cursor) -> CatalogResult<String> {
        let url = resolve_cursor(&self.base_url, operation, cursor)?;
        self.get(operation, &url)
    }
}

/// Cursors are followed verbatim but must stay under the catalog base url so
/// the bearer token is never sent elsewhere.
fn resolve_cursor(
    base_url: &Url,
    operation: CatalogOperation,
    cursor: &Cursor,
) -> CatalogResult<Url> {
    let url = Url::parse(cursor.token()).map_err(|error| {
        CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("catalog cursor is not a url: {error}"),
        )
        .with_operation(operation)
    })?;

    if url.origin() != base_url.origin() || !url.path().starts_with(base_url.path()) {
        return Err(CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("catalog cursor '{url}' points outside '{base_url}'"),
        )
        .with_operation(operation));
    }
    Ok(url)
}

fn read_body(operation: CatalogOperation, response: ureq::Response) -> CatalogResult<String> {
    response.into_string().map_err(|error| {
        CoreError::new(
            CoreErrorKind::UpstreamFailure,
            format!("failed to read catalog response body: {error}"),
        )
        .with_operation(operation)
    })
}

fn transport_error(operation: CatalogOperation, error: ureq::Error) -> CoreError {
    let (kind, message) = match error {
        ureq::Error::Status(401 | 403, _) => (
            CoreErrorKind::Unauthorized,
            "catalog refused the access token".to_string(),
        ),
        ureq::Error::Status(code, response) => (
            CoreErrorKind::UpstreamFailure,
            format!(
                "catalog responded with status {code} {}",
                response.status_text()
            ),
        ),
        ureq::Error::Transport(transport) => (
            if transport.kind() == ureq::ErrorKind::Io
                && transport.to_string().contains("timed out")
            {
                CoreErrorKind::Timeout
            } else {
                CoreErrorKind::UpstreamFailure
            },
            format!("catalog transport failure: {transport}"),
        ),
    };
    CoreError::new(kind, message).with_operation(operation)
}
