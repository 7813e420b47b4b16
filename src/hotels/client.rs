use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::auth::SiteAuth;
use super::types::*;

const SEARCH_PATH: &str = "/api/rooms/search";

#[derive(Debug, Error)]
pub enum SearchError {
    /// 403 from the search endpoint: the XSRF/session tokens need refreshing.
    #[error("search rejected credentials (HTTP 403)")]
    AuthExpired,
    #[error("search returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search response was not a room list: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct SearchClient {
    http: Client,
    auth: SiteAuth,
    base_url: String,
}

impl SearchClient {
    pub fn new(auth: SiteAuth, base_url: String, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            auth,
            base_url,
        })
    }

    /// Run one availability search for the query.
    pub async fn search(&self, query: &BookingQuery) -> Result<Vec<RoomAvailability>, SearchError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);

        let mut req = self.http.post(&url);
        for (k, v) in &self.auth.headers() {
            req = req.header(k, v);
        }
        // after the headers so the charset-qualified content type wins
        let req = req.json(query);

        let resp = req.send().await?;
        let status = resp.status();
        debug!(status = %status, "Search response");

        if status == StatusCode::FORBIDDEN {
            return Err(SearchError::AuthExpired);
        }
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let body = resp.text().await?;
        let rooms: Vec<RoomAvailability> = serde_json::from_str(&body)?;
        debug!("Fetched {} room records", rooms.len());
        Ok(rooms)
    }
}
