use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use caption_core::errors::RemoteError;
use caption_core::record::TranscriptRow;
use caption_core::remote::RemoteStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the hosted transcript backend.
#[derive(Clone)]
pub struct HttpRemoteConfig {
    /// Project base URL, e.g. `https://xyz.example.co`.
    pub base_url: String,
    /// Anonymous/service API key; sent as both `apikey` and bearer token.
    pub api_key: SecretString,
    pub timeout: Duration,
}

impl HttpRemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// PostgREST-style remote store: one POST per batch against
/// `/rest/v1/{table}`, upsert semantics selected via the Prefer header
/// (`resolution=merge-duplicates`: insert if absent, replace if
/// present, keyed by primary key). The whole batch is applied by one
/// statement server-side, which is what lets callers treat it as
/// all-or-nothing.
pub struct HttpRemote {
    client: Client,
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl HttpRemote {
    pub fn new(config: HttpRemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Network(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn upsert(&self, table: &str, rows: &[TranscriptRow]) -> Result<(), RemoteError> {
        let resp = self
            .client
            .post(self.endpoint(table))
            .header("apikey", self.api_key.expose_secret())
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout(self.timeout)
                } else {
                    RemoteError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs);
            return Err(RemoteError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        Ok(())
    }
}
