//! HTTP access to the conversation API and request sequencing.

use std::time::Duration;

use log::{info, warn};
use rand::Rng;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use super::fallback;
use super::model::{CompareRequest, ConversationPoint, DataResponse, ErrorBody, SharedConnection, Stats};
use crate::config::ApiConfig;
use crate::error::{Result, VizError};

/// Anything that can serve the three API calls the viewer makes.
pub trait DataSource {
    /// `GET /health` then `GET /data`.
    fn fetch_data(&self) -> Result<DataResponse>;

    /// `POST /refresh`, which recomputes server side, then [`fetch_data`](Self::fetch_data).
    fn refresh(&self) -> Result<DataResponse>;

    /// `POST /compare` for two users.
    fn compare(&self, email1: &str, email2: &str) -> Result<Vec<SharedConnection>>;
}

pub struct HttpDataSource {
    base_url: String,
    health_check: bool,
    client: Client,
}

impl HttpDataSource {
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()
            .map_err(|err| VizError::Http(format!("client build failed: {err}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_check: config.health_check,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check_health(&self) -> Result<()> {
        let response = self.client.get(self.url("health")).send()?;
        if !response.status().is_success() {
            return Err(VizError::HttpStatus {
                code: response.status().as_u16(),
                message: "API server is not healthy".to_string(),
            });
        }
        Ok(())
    }
}

impl DataSource for HttpDataSource {
    fn fetch_data(&self) -> Result<DataResponse> {
        if self.health_check {
            self.check_health()?;
        }
        let response = self.client.get(self.url("data")).send()?;
        decode_json(response)
    }

    fn refresh(&self) -> Result<DataResponse> {
        let response = self.client.post(self.url("refresh")).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(response));
        }
        self.fetch_data()
    }

    fn compare(&self, email1: &str, email2: &str) -> Result<Vec<SharedConnection>> {
        let response = self
            .client
            .post(self.url("compare"))
            .json(&CompareRequest { email1, email2 })
            .send()?;
        decode_json(response)
    }
}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(status_error(response));
    }
    response
        .json()
        .map_err(|err| VizError::Decode(err.to_string()))
}

fn status_error(response: Response) -> VizError {
    let code = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    VizError::HttpStatus {
        code,
        message: error_message(&body),
    }
}

/// Pulls `error` out of a `{"error": ...}` body, else returns the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "<no body>".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    Api,
    /// The API failed; the viewer is showing generated placeholder data.
    Fallback { reason: String },
}

impl DataOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataOrigin::Fallback { .. })
    }
}

#[derive(Debug, Clone)]
pub struct LoadedData {
    pub points: Vec<ConversationPoint>,
    pub stats: Stats,
    pub last_updated: String,
    pub origin: DataOrigin,
}

impl LoadedData {
    /// Generated placeholder data standing in for a failed load.
    pub fn fallback<R: Rng + ?Sized>(reason: String, rng: &mut R) -> Self {
        let points = fallback::generate_now(rng);
        LoadedData {
            stats: Stats::from_points(&points),
            points,
            last_updated: String::new(),
            origin: DataOrigin::Fallback { reason },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    Refresh,
}

/// Loads from `source`, degrading to the generated dataset on any failure.
pub fn load_or_fallback<S, R>(source: &S, kind: LoadKind, rng: &mut R) -> LoadedData
where
    S: DataSource + ?Sized,
    R: Rng + ?Sized,
{
    let result = match kind {
        LoadKind::Initial => source.fetch_data(),
        LoadKind::Refresh => source.refresh(),
    };

    match result {
        Ok(response) => {
            info!(
                "loaded {} conversations from {} users",
                response.data.len(),
                response.stats.unique_users
            );
            let stats = if response.stats == Stats::default() {
                Stats::from_points(&response.data)
            } else {
                response.stats
            };
            LoadedData {
                points: response.data,
                stats,
                last_updated: response.last_updated,
                origin: DataOrigin::Api,
            }
        }
        Err(err) => {
            warn!("data fetch failed, using fallback data: {err}");
            LoadedData::fallback(err.to_string(), rng)
        }
    }
}

/// Identifies one issued request of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Hands out increasing request ids; only the latest one is current.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn issue(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }
}
