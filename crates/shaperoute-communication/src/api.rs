//! API gateway for the route generation backend
//!
//! Typed wrapper over the backend's JSON endpoints. Every call either returns
//! a fully decoded value or a [`ClientError`]; partial responses are never
//! accepted. No retries happen here; retry policy belongs to the caller.

use async_trait::async_trait;
use reqwest::{multipart, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shaperoute_core::{ClientError, GpxResult, RouteRequest, RouteResult, Shape};
use std::time::Duration;
use tracing::{debug, warn};

/// Operations the orchestrator needs from the route backend.
#[async_trait]
pub trait RouteBackend: Send + Sync {
    /// `GET /symbols`
    async fn list_shapes(&self) -> Result<Vec<Shape>, ClientError>;

    /// `POST /route`
    async fn generate_route(&self, request: &RouteRequest) -> Result<RouteResult, ClientError>;

    /// `POST /route/gpx`
    async fn generate_route_with_track(
        &self,
        request: &RouteRequest,
    ) -> Result<GpxResult, ClientError>;

    /// `POST /route/gpx/download`
    async fn fetch_track_file(&self, request: &RouteRequest) -> Result<Vec<u8>, ClientError>;
}

#[derive(Deserialize)]
struct ShapeList {
    symbols: Vec<Shape>,
}

#[derive(Deserialize)]
struct UploadedShape {
    metadata: Shape,
}

#[derive(Deserialize)]
struct HealthStatus {
    status: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client for the route backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Default connect timeout. Requests have no overall timeout because
    /// route generation can take tens of seconds.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_connect_timeout(base_url, Self::DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client for `base_url` with a custom connect timeout
    pub fn with_connect_timeout(
        base_url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ClientError::network)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload an SVG shape (`POST /symbols`, multipart field `file`)
    pub async fn upload_shape(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<Shape, ClientError> {
        let part = multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("image/svg+xml")
            .map_err(ClientError::protocol)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/symbols"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let uploaded: UploadedShape = decode_json(response).await?;
        debug!("Uploaded shape {} as {}", file_name, uploaded.metadata.id);
        Ok(uploaded.metadata)
    }

    /// Check backend liveness (`GET /health`), returning the reported status
    pub async fn health(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(transport_error)?;
        let health: HealthStatus = decode_json(response).await?;
        Ok(health.status)
    }

    async fn post_route(&self, path: &str, request: &RouteRequest) -> Result<Response, ClientError> {
        debug!(
            "POST {} shape={} start={} km={}",
            path, request.shape_id, request.start, request.target_distance_km
        );
        let response = self
            .http
            .post(self.url(path))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await
    }
}

#[async_trait]
impl RouteBackend for ApiClient {
    async fn list_shapes(&self) -> Result<Vec<Shape>, ClientError> {
        let response = self
            .http
            .get(self.url("/symbols"))
            .send()
            .await
            .map_err(transport_error)?;
        let list: ShapeList = decode_json(response).await?;
        debug!("Backend reported {} shapes", list.symbols.len());
        Ok(list.symbols)
    }

    async fn generate_route(&self, request: &RouteRequest) -> Result<RouteResult, ClientError> {
        let response = self.post_route("/route", request).await?;
        decode_json(response).await
    }

    async fn generate_route_with_track(
        &self,
        request: &RouteRequest,
    ) -> Result<GpxResult, ClientError> {
        let response = self.post_route("/route/gpx", request).await?;
        decode_json(response).await
    }

    async fn fetch_track_file(&self, request: &RouteRequest) -> Result<Vec<u8>, ClientError> {
        let response = self.post_route("/route/gpx/download", request).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!("Received {} byte track", bytes.len());
        Ok(bytes.to_vec())
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::protocol(err)
    } else {
        ClientError::network(err)
    }
}

/// Turn a non-2xx response into a protocol error carrying the backend's
/// `detail` message when it sent one.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(text),
        }) => text,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no detail")
            .to_string(),
        Err(_) => body,
    };
    warn!("Backend answered {}: {}", status, detail);
    Err(ClientError::protocol(format!(
        "backend returned {}: {}",
        status.as_u16(),
        detail
    )))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(ClientError::protocol)
}
