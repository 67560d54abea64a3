use anyhow::Context;
use async_trait::async_trait;
use contracts::domain::a001_connection::{Connection, ConnectionId, Credentials};
use reqwest::StatusCode;
use std::time::Duration;

use super::{MarketplaceApi, OrderImportSession};
use crate::shared::config::MarketplaceApiConfig;
use crate::usecases::u501_import_orders::ImportError;

/// HTTP-клиент API маркетплейса
pub struct HttpMarketplaceApi {
    base_url: String,
    timeout: Duration,
}

impl HttpMarketplaceApi {
    pub fn new(config: &MarketplaceApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    async fn open_session(
        &self,
        connection: &Connection,
    ) -> Result<Box<dyn OrderImportSession>, ImportError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Box::new(HttpOrderImportSession {
            client,
            url: format!("{}/orders/import", self.base_url),
            connection_id: connection.id,
            credentials: connection.credentials.clone(),
        }))
    }
}

struct HttpOrderImportSession {
    client: reqwest::Client,
    url: String,
    connection_id: ConnectionId,
    credentials: Credentials,
}

#[async_trait]
impl OrderImportSession for HttpOrderImportSession {
    async fn import_orders(&self) -> Result<(), ImportError> {
        tracing::info!("Requesting order import for connection {}: POST {}", self.connection_id, self.url);

        let start_time = std::time::Instant::now();
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.credentials.public_key, Some(&self.credentials.secret_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                let error_msg = if e.is_timeout() {
                    format!("Request timeout: {}", e)
                } else if e.is_connect() {
                    format!("Connection error: {}", e)
                } else {
                    format!("Network error: {}", e)
                };
                tracing::error!("{}", error_msg);
                ImportError::Unexpected(anyhow::anyhow!(error_msg))
            })?;

        let status = response.status();
        tracing::info!(
            "Request completed in {:.2}s with status {}",
            start_time.elapsed().as_secs_f64(),
            status
        );

        let body = if status.is_success() {
            String::new()
        } else {
            response.text().await.unwrap_or_default()
        };
        check_status(status, &body)
    }
}

/// 401/403 означают отклоненные ключи, прочие неуспешные ответы считаются неожиданной ошибкой
fn check_status(status: StatusCode, body: &str) -> Result<(), ImportError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ImportError::InvalidCredentials(
            format!("Credentials rejected by marketplace API ({})", status),
        )),
        _ => Err(ImportError::Unexpected(anyhow::anyhow!(
            "Order import request failed with status {}: {}",
            status,
            body
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_passes() {
        assert!(check_status(StatusCode::OK, "").is_ok());
        assert!(check_status(StatusCode::ACCEPTED, "").is_ok());
    }

    #[test]
    fn auth_statuses_map_to_invalid_credentials() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = check_status(status, "denied").unwrap_err();
            assert!(matches!(err, ImportError::InvalidCredentials(_)));
        }
    }

    #[test]
    fn other_failures_are_unexpected() {
        let err = check_status(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert!(matches!(err, ImportError::Unexpected(_)));
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn unreachable_host_is_unexpected() {
        let api = HttpMarketplaceApi::new(&MarketplaceApiConfig {
            base_url: "http://127.0.0.1:9/".into(),
            timeout_seconds: 2,
        });
        let connection = Connection::new(ConnectionId(1), "Main", Credentials::new("pk", "sk"));

        let session = api.open_session(&connection).await.unwrap();
        let err = session.import_orders().await.unwrap_err();
        assert!(matches!(err, ImportError::Unexpected(_)));
    }
}
