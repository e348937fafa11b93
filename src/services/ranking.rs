// src/services/ranking.rs

//! Ranking source client.
//!
//! Fetches the soaring token ranking over HTTP. Each cycle gets its own
//! session (a client with a fresh cookie store) which is dropped on
//! [`CandidateSource::release`].

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{RankResponse, SourceConfig, TokenRecord};
use crate::services::CandidateSource;
use crate::utils::html::{extract_pre_text, looks_like_html, page_title};
use crate::utils::http::{create_source_client, excerpt};
use crate::utils::url::short_path;

/// HTTP client for the ranking endpoint.
pub struct RankingClient {
    config: SourceConfig,
    session: Mutex<Option<Client>>,
}

impl RankingClient {
    /// Create a new ranking client. No connection is made until the first fetch.
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<Client>> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Client for the current cycle, opened on first use.
    fn open_session(&self) -> Result<Client> {
        let mut session = self.session();
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }
        log::debug!("Opening ranking session");
        let client = create_source_client(&self.config)?;
        *session = Some(client.clone());
        Ok(client)
    }

    fn context(&self) -> String {
        short_path(&self.config.url)
    }
}

#[async_trait]
impl CandidateSource for RankingClient {
    async fn fetch_candidates(&self, limit: usize) -> Result<Vec<TokenRecord>> {
        let client = self.open_session()?;
        let context = self.context();

        log::info!("Fetching ranking from {}", self.config.url);
        let response = client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&context, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(&context, e))?;

        if !status.is_success() {
            return Err(AppError::fetch(
                &context,
                format!("status {}: {}", status, excerpt(&body)),
            ));
        }

        parse_rank_body(&context, &body, limit)
    }

    fn release(&self) {
        if self.session().take().is_some() {
            log::debug!("Ranking session closed");
        }
    }
}

/// Decode a ranking body, raw JSON or wrapped in a rendered HTML page.
pub(crate) fn parse_rank_body(context: &str, body: &str, limit: usize) -> Result<Vec<TokenRecord>> {
    let json = if looks_like_html(body) {
        extract_pre_text(body).ok_or_else(|| {
            let title = page_title(body).unwrap_or_else(|| "untitled page".to_string());
            AppError::fetch(
                context,
                format!("received HTML without a JSON payload ({title})"),
            )
        })?
    } else {
        body.to_string()
    };

    let response: RankResponse = serde_json::from_str(&json).map_err(|e| {
        AppError::fetch(context, format!("malformed payload: {e}: {}", excerpt(&json)))
    })?;

    if let Some(code) = response.code.filter(|&c| c != 0) {
        return Err(AppError::fetch(
            context,
            format!(
                "API error code {}: {}",
                code,
                response.msg.as_deref().unwrap_or("no message")
            ),
        ));
    }

    let mut rank = response.data.map(|d| d.rank).ok_or_else(|| {
        AppError::fetch(context, format!("missing data.rank: {}", excerpt(&json)))
    })?;
    rank.truncate(limit);
    Ok(rank)
}
