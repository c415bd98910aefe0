use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode, header::USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::GeocodeError;

/// Shared outbound client. Cloning is cheap; all clones use one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let inner = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build outbound HTTP client")?;

        Ok(Self { inner })
    }

    /// Issue one GET and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        user_agent: Option<&str>,
    ) -> Result<T, GeocodeError> {
        let mut request = self.inner.get(url).query(query);
        if let Some(agent) = user_agent {
            request = request.header(USER_AGENT, agent);
        }

        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "provider responded");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
