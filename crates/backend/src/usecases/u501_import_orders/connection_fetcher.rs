use async_trait::async_trait;
use contracts::domain::a001_connection::ConnectionId;
use std::sync::Arc;

use super::errors::ImportError;
use crate::domain::a001_connection::ConnectionRepository;
use crate::shared::marketplaces::{MarketplaceApi, OrderImportSession};

/// Источник сессий импорта по идентификатору подключения
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, id: ConnectionId) -> Result<Box<dyn OrderImportSession>, ImportError>;
}

/// Загружает подключение, проверяет ключи и открывает сессию API
pub struct ConnectionFetcher {
    connections: Arc<dyn ConnectionRepository>,
    api: Arc<dyn MarketplaceApi>,
}

impl ConnectionFetcher {
    pub fn new(connections: Arc<dyn ConnectionRepository>, api: Arc<dyn MarketplaceApi>) -> Self {
        Self { connections, api }
    }
}

#[async_trait]
impl SessionProvider for ConnectionFetcher {
    async fn get_session(&self, id: ConnectionId) -> Result<Box<dyn OrderImportSession>, ImportError> {
        let connection = self
            .connections
            .get_by_id(id)
            .await?
            .ok_or_else(|| ImportError::connection_not_found(id))?;

        connection
            .credentials
            .validate()
            .map_err(ImportError::InvalidCredentials)?;

        self.api.open_session(&connection).await
    }
}
