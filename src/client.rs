use anyhow::{Context, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::catalog::{DataLayer, parse_catalog};
use crate::config::{ClientConfig, Overrides, load_config};
use crate::error::{ApiErrorResponse, CoverageError, Result, format_api_error};
use crate::query::{ProbeQuery, QueryResponse};
use crate::service::{CatalogService, QueryService};
use crate::util::urljoin;

/// Blocking client for the EI geospatial API.
///
/// Authenticates once with the API key on construction; every later call
/// carries the resulting bearer token.
#[derive(Clone)]
pub struct Client {
    api_url: String,
    tenant_id: String,
    token: String,
    http: HttpClient,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client using environment variables and/or `auth/secrets.ini`.
    ///
    /// This is equivalent to `Client::new(Overrides::default())`.
    pub fn from_env() -> Result<Self> {
        Self::new(Overrides::default())
    }

    /// Resolves configuration (overrides, then `EI_*` variables, then the
    /// secrets file) and authenticates. Missing credentials fail before any
    /// request is sent.
    pub fn new(overrides: Overrides) -> Result<Self> {
        let cfg = load_config(overrides)?;
        Self::connect(&cfg, Duration::from_secs(60))
    }

    pub fn connect(cfg: &ClientConfig, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ei-coverage/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("ei-coverage")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")
            .map_err(|e| CoverageError::AuthenticationFailure(format!("{:#}", e)))?;

        let token = authenticate(&http, cfg)
            .map_err(|e| CoverageError::AuthenticationFailure(format!("{:#}", e)))?;
        tracing::info!(org = %cfg.org_id, "authenticated with EI");

        Ok(Self {
            api_url: cfg.api_url.clone(),
            tenant_id: cfg.tenant_id.clone(),
            token,
            http,
        })
    }

    /// Full catalog listing.
    pub fn data_layers(&self) -> Result<Vec<DataLayer>> {
        let url = urljoin(&self.api_url, "datalayers");
        let (status, text) = self
            .send::<Value>("GET", &url, None)
            .map_err(|e| CoverageError::CatalogServiceFailure(format!("{:#}", e)))?;
        let layers = catalog_from_reply(status, &url, &text)?;
        tracing::info!(layers = layers.len(), "fetched catalog");
        Ok(layers)
    }

    /// Submits a point query and waits for its reply.
    pub fn submit(&self, query: &ProbeQuery) -> Result<QueryResponse> {
        let url = urljoin(&self.api_url, "query");
        tracing::debug!(layer = query.layer_id().unwrap_or(""), "submitting query");
        let (status, text) = self
            .send("POST", &url, Some(query))
            .map_err(|e| CoverageError::QueryServiceFailure(format!("{:#}", e)))?;
        query_from_reply(status, &url, &text)
    }

    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-IBM-Client-Id", format!("geospatial-{}", self.tenant_id))
    }

    fn send<TReq: Serialize + ?Sized>(
        &self,
        method: &str,
        url: &str,
        body: Option<&TReq>,
    ) -> anyhow::Result<(StatusCode, String)> {
        let req = match method {
            "GET" => self.http.get(url),
            _ => self.http.post(url),
        };
        let req = self.apply_auth(req).header(ACCEPT, "application/json");
        let req = match body {
            Some(body) => req.json(body),
            None => req,
        };
        let resp = req
            .send()
            .with_context(|| format!("could not connect to {}", url))?;

        let status = resp.status();
        Ok((status, resp.text().unwrap_or_default()))
    }
}

fn catalog_from_reply(status: StatusCode, url: &str, text: &str) -> Result<Vec<DataLayer>> {
    let listing: Value = decode_reply(status, url, text)
        .map_err(|e| CoverageError::CatalogServiceFailure(format!("{:#}", e)))?;
    parse_catalog(listing)
}

fn query_from_reply(status: StatusCode, url: &str, text: &str) -> Result<QueryResponse> {
    let reply: Value = decode_reply(status, url, text)
        .map_err(|e| CoverageError::QueryServiceFailure(format!("{:#}", e)))?;
    QueryResponse::from_reply(reply)
}

fn decode_reply<T: DeserializeOwned>(status: StatusCode, url: &str, text: &str) -> anyhow::Result<T> {
    if !status.is_success() {
        // Try to parse EI error payloads for actionable messages.
        if let Ok(err_json) = serde_json::from_str::<ApiErrorResponse>(text) {
            bail!(format_api_error(status, url, &err_json));
        }

        bail!(
            "API request failed: HTTP {} for url ({})\n{}",
            status,
            url,
            text
        );
    }

    serde_json::from_str::<T>(text)
        .with_context(|| format!("failed to parse API JSON (url={}, status={})", url, status))
}

/// Exchanges the API key for an access token.
fn authenticate(http: &HttpClient, cfg: &ClientConfig) -> anyhow::Result<String> {
    let req = auth_request(http, cfg).build().context("invalid authentication request")?;
    let url = req.url().to_string();

    let resp = http
        .execute(req)
        .with_context(|| format!("could not connect to {}", url))?;

    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    if !status.is_success() {
        if let Ok(err_json) = serde_json::from_str::<ApiErrorResponse>(&text) {
            bail!(format_api_error(status, &url, &err_json));
        }
        bail!("authentication failed: HTTP {} ({})\n{}", status, url, text);
    }

    token_from_body(&text).ok_or_else(|| anyhow!("authentication reply carried no token"))
}

fn auth_request(http: &HttpClient, cfg: &ClientConfig) -> RequestBuilder {
    http.post(urljoin(&cfg.auth_url, "api-key"))
        .query(&[("orgId", cfg.org_id.as_str())])
        .header("X-IBM-Client-Id", format!("saascore-{}", cfg.tenant_id))
        .header("X-API-Key", cfg.api_key.trim())
}

// The token endpoint answers with the bare JWT, sometimes JSON-quoted, and
// some gateways wrap it as {"access_token": ...}.
fn token_from_body(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let token = match serde_json::from_str::<Value>(text) {
        Ok(Value::String(s)) => Some(s),
        Ok(Value::Object(map)) => map
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string),
        Ok(_) => None,
        Err(_) => Some(text.to_string()),
    };
    token.filter(|t| !t.is_empty())
}

impl CatalogService for Client {
    fn data_layers(&self) -> Result<Vec<DataLayer>> {
        Client::data_layers(self)
    }
}

impl QueryService for Client {
    fn submit(&self, query: &ProbeQuery) -> Result<QueryResponse> {
        Client::submit(self, query)
    }
}
