// Async HTTP client for the Conseil v2 API.
//
// Metadata: GET  v2/metadata/{platform}/{network}/{entity}/...
// Data:     POST v2/data/{platform}/{network}/{entity}
// Auth:     apiKey header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::metadata::{
    AttributeDefinition, EntityDefinition, NetworkDefinition, PlatformDefinition,
};
use crate::query::ConseilQuery;
use crate::transport::TransportConfig;

/// One row returned by the data endpoint, keyed by attribute name in server order.
pub type Record = serde_json::Map<String, serde_json::Value>;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one Conseil server.
///
/// Sends the API key as a default `apiKey` header. Path segments supplied by
/// callers (entity names, attribute prefixes) are percent-encoded.
#[derive(Clone)]
pub struct ConseilClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl ConseilClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server URL, API key, and transport config.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|_| Error::InvalidApiKey)?;
        key_value.set_sensitive(true);
        // Header names are case-insensitive on the wire; `HeaderName` wants lowercase.
        headers.insert("apikey", key_value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(url)
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments onto the base URL, encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // normalize_base_url rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(|e| self.map_send(e))?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send(e))?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    fn map_send(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::InvalidApiKey;
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = raw.trim();
        Error::Api {
            status: status.as_u16(),
            message: if message.is_empty() {
                status.to_string()
            } else {
                message.to_owned()
            },
        }
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// Platforms indexed by the server.
    pub async fn get_platforms(&self) -> Result<Vec<PlatformDefinition>, Error> {
        self.get(&["v2", "metadata", "platforms"]).await
    }

    /// Networks available for a platform.
    pub async fn get_networks(&self, platform: &str) -> Result<Vec<NetworkDefinition>, Error> {
        self.get(&["v2", "metadata", platform, "networks"]).await
    }

    /// Entities available on a network, with record counts.
    pub async fn get_entities(
        &self,
        platform: &str,
        network: &str,
    ) -> Result<Vec<EntityDefinition>, Error> {
        self.get(&["v2", "metadata", platform, network, "entities"])
            .await
    }

    /// Attribute definitions of an entity, in server order.
    pub async fn get_attributes(
        &self,
        platform: &str,
        network: &str,
        entity: &str,
    ) -> Result<Vec<AttributeDefinition>, Error> {
        self.get(&["v2", "metadata", platform, network, entity, "attributes"])
            .await
    }

    /// Distinct values of a low-cardinality attribute.
    pub async fn get_attribute_values(
        &self,
        platform: &str,
        network: &str,
        entity: &str,
        attribute: &str,
    ) -> Result<Vec<String>, Error> {
        self.get(&["v2", "metadata", platform, network, entity, attribute])
            .await
    }

    /// Distinct values of an attribute starting with `prefix`.
    pub async fn get_attribute_values_for_prefix(
        &self,
        platform: &str,
        network: &str,
        entity: &str,
        attribute: &str,
        prefix: &str,
    ) -> Result<Vec<String>, Error> {
        self.get(&["v2", "metadata", platform, network, entity, attribute, prefix])
            .await
    }

    // ── Data ─────────────────────────────────────────────────────────

    /// Run an entity query and return the matching rows.
    pub async fn execute_entity_query(
        &self,
        platform: &str,
        network: &str,
        entity: &str,
        query: &ConseilQuery,
    ) -> Result<Vec<Record>, Error> {
        debug!(
            entity,
            fields = query.fields.len(),
            predicates = query.predicates.len(),
            limit = query.limit,
            "executing entity query"
        );
        self.post(&["v2", "data", platform, network, entity], query)
            .await
    }
}

impl std::fmt::Debug for ConseilClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConseilClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
