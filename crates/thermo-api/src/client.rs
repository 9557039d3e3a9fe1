// Controller HTTP client
//
// Wraps `reqwest::Client` with the controller's URL layout and its
// error convention: non-2xx responses may carry `{"error": "..."}`.
// Every command is a single request; nothing here retries.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, FanSpeedAck, ModeAck, PidParams, TemperatureSample};
use crate::transport::TransportConfig;

/// HTTP client for the thermostat controller's command API.
pub struct ThermostatClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ThermostatClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `http://localhost:5000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }


    // ── Endpoints ────────────────────────────────────────────────────

    /// `POST /mode` with a wire mode token (`manual`, `auto`, `pid`).
    pub async fn set_mode(&self, token: &str) -> Result<ModeAck, Error> {
        let url = self.url("mode")?;
        self.post(url, &serde_json::json!({ "mode": token })).await
    }

    /// `POST /manual_speed` with a fan level in `0..=3`.
    pub async fn set_manual_speed(&self, speed: u8) -> Result<FanSpeedAck, Error> {
        let url = self.url("manual_speed")?;
        self.post(url, &serde_json::json!({ "speed": speed })).await
    }

    /// `POST /pid_params`. Returns whatever the controller echoes back.
    pub async fn set_pid_params(&self, params: &PidParams) -> Result<serde_json::Value, Error> {
        let url = self.url("pid_params")?;
        self.post(url, params).await
    }

    /// `GET /influx/temperature`: recent samples, oldest first.
    pub async fn recent_temperatures(&self) -> Result<Vec<TemperatureSample>, Error> {
        let url = self.url("influx/temperature")?;
        self.get(url).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = Self::check_status(resp).await?;

        serde_json::from_str(&body).map_err(|e| deserialization(&e, body))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self.http.post(url).json(body).send().await?;
        let body = Self::check_status(resp).await?;

        // Some controller builds answer 200 with an empty body.
        let text = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| deserialization(&e, body.clone()))
    }

    /// Turn a non-2xx response into `Error::Api`, preferring the
    /// controller's own `error` message over the status line.
    async fn check_status(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| {
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_owned()
            });

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn deserialization(err: &serde_json::Error, body: String) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{err} (body preview: {preview:?})"),
        body,
    }
}
