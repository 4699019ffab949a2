pub mod auth;
pub mod journal;
pub mod master;
pub mod report;
pub mod shop;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::config::ApiSettings;
use crate::error::{AcctError, Result};

/// Pagination metadata returned by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
}

/// Standard response envelope shared by the list and report endpoints.
/// Report endpoints put the record count either in `total` or in
/// `pagination.total` depending on the family.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    /// Total record count, falling back through the envelope's two homes
    /// for it. `None` means the caller should fall back to the row count.
    pub fn total_records(&self) -> Option<u64> {
        self.total.or(self.pagination.as_ref().map(|p| p.total))
    }
}

/// Which of the two backends a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Main,
    Report,
}

/// Blocking HTTP client for the accounting backend. Owns the agent, the
/// two base URLs and the bearer token for the current session.
pub struct ApiClient {
    agent: Agent,
    base_url: String,
    report_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(api: &ApiSettings, token: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(api.timeout_secs())))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            report_url: api.report_url().trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn url(&self, base: Base, path: &str) -> String {
        let root = match base {
            Base::Main => &self.base_url,
            Base::Report => &self.report_url,
        };
        format!("{}/{}", root, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> Option<String> {
        if self.token.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.token))
        }
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        base: Base,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>> {
        let url = self.url(base, path);
        let mut req = self.agent.get(&url);
        if let Some(auth) = self.bearer() {
            req = req.header("Authorization", &auth);
        }
        for (key, value) in query {
            req = req.query(*key, value);
        }
        let resp = req.call().map_err(|e| AcctError::Transport {
            endpoint: url.clone(),
            source: Box::new(e),
        })?;
        read_envelope(&url, resp)
    }

    pub fn post<T: DeserializeOwned>(
        &self,
        base: Base,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Envelope<T>> {
        let url = self.url(base, path);
        let mut req = self.agent.post(&url);
        if let Some(auth) = self.bearer() {
            req = req.header("Authorization", &auth);
        }
        let resp = req.send_json(body).map_err(|e| AcctError::Transport {
            endpoint: url.clone(),
            source: Box::new(e),
        })?;
        read_envelope(&url, resp)
    }

    pub fn put<T: DeserializeOwned>(
        &self,
        base: Base,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Envelope<T>> {
        let url = self.url(base, path);
        let mut req = self.agent.put(&url);
        if let Some(auth) = self.bearer() {
            req = req.header("Authorization", &auth);
        }
        let resp = req.send_json(body).map_err(|e| AcctError::Transport {
            endpoint: url.clone(),
            source: Box::new(e),
        })?;
        read_envelope(&url, resp)
    }

    /// POST returning the raw response body instead of the standard
    /// envelope. The login endpoints put their tokens at the top level.
    pub fn post_value<T: DeserializeOwned>(
        &self,
        base: Base,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let url = self.url(base, path);
        let mut req = self.agent.post(&url);
        if let Some(auth) = self.bearer() {
            req = req.header("Authorization", &auth);
        }
        let mut resp = req.send_json(body).map_err(|e| AcctError::Transport {
            endpoint: url.clone(),
            source: Box::new(e),
        })?;
        check_status(&url, &mut resp)?;
        resp.body_mut()
            .read_json()
            .map_err(|e| AcctError::BadResponse {
                endpoint: url,
                reason: e.to_string(),
            })
    }

    /// GET a binary body (PDF download).
    pub fn get_bytes(&self, base: Base, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        let url = self.url(base, path);
        let mut req = self.agent.get(&url);
        if let Some(auth) = self.bearer() {
            req = req.header("Authorization", &auth);
        }
        for (key, value) in query {
            req = req.query(*key, value);
        }
        let mut resp = req.call().map_err(|e| AcctError::Transport {
            endpoint: url.clone(),
            source: Box::new(e),
        })?;
        check_status(&url, &mut resp)?;
        resp.body_mut()
            .read_to_vec()
            .map_err(|e| AcctError::BadResponse {
                endpoint: url,
                reason: e.to_string(),
            })
    }
}

fn read_envelope<T: DeserializeOwned>(
    url: &str,
    mut resp: ureq::http::Response<ureq::Body>,
) -> Result<Envelope<T>> {
    check_status(url, &mut resp)?;
    resp.body_mut()
        .read_json()
        .map_err(|e| AcctError::BadResponse {
            endpoint: url.to_string(),
            reason: e.to_string(),
        })
}

fn check_status(url: &str, resp: &mut ureq::http::Response<ureq::Body>) -> Result<()> {
    let status = resp.status().as_u16();
    if status == 401 {
        // Token is dead; the caller tears down the whole session.
        return Err(AcctError::SessionExpired);
    }
    if status >= 400 {
        let message = resp
            .body_mut()
            .read_to_string()
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        return Err(AcctError::Api {
            endpoint: url.to_string(),
            status,
            message,
        });
    }
    Ok(())
}
