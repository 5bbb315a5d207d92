//! HTTP client for the GMD server REST API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use gmd_core::models::{InterceptorSite, LaunchRequest, Missile};

#[derive(Debug, Deserialize)]
pub struct LaunchResponse {
    pub message: String,
    pub missile_id: String,
}

#[derive(Debug, Deserialize)]
pub struct InterceptResponse {
    pub message: String,
    pub missile_id: String,
    pub interceptor_site_id: String,
    pub interceptor_expended: bool,
    #[serde(default)]
    pub remaining_interceptors: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MassAttackResponse {
    pub message: String,
    pub missiles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MissilesResponse {
    missiles: Vec<Missile>,
}

#[derive(Debug, Deserialize)]
struct SitesResponse {
    interceptor_sites: Vec<InterceptorSite>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Blocking client for a running GMD server.
pub struct GmdClient {
    client: Client,
    base_url: String,
}

impl GmdClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the server (e.g., "http://localhost:3000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn launch(&self, request: &LaunchRequest) -> Result<LaunchResponse> {
        let response = self
            .client
            .post(format!("{}/api/missiles/launch", self.base_url))
            .json(request)
            .send()
            .context("Failed to send launch command")?;
        parse(response)
    }

    pub fn intercept(&self, missile_id: &str, site_id: &str) -> Result<InterceptResponse> {
        let response = self
            .client
            .post(format!("{}/api/intercept/{}", self.base_url, missile_id))
            .query(&[("interceptor_site_id", site_id)])
            .send()
            .context("Failed to send intercept command")?;
        parse(response)
    }

    pub fn mass_attack(&self) -> Result<MassAttackResponse> {
        let response = self
            .client
            .post(format!("{}/api/simulate/mass-attack", self.base_url))
            .send()
            .context("Failed to start mass attack")?;
        parse(response)
    }

    pub fn missiles(&self) -> Result<Vec<Missile>> {
        let response = self
            .client
            .get(format!("{}/api/missiles", self.base_url))
            .send()
            .context("Failed to fetch missiles")?;
        parse::<MissilesResponse>(response).map(|body| body.missiles)
    }

    pub fn sites(&self) -> Result<Vec<InterceptorSite>> {
        let response = self
            .client
            .get(format!("{}/api/interceptors", self.base_url))
            .send()
            .context("Failed to fetch interceptor sites")?;
        parse::<SitesResponse>(response).map(|body| body.interceptor_sites)
    }
}

fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .map(|body| body.error)
            .unwrap_or_else(|_| "no error detail".to_string());
        bail!("Server returned {}: {}", status, detail);
    }
    response.json().context("Failed to decode server response")
}
