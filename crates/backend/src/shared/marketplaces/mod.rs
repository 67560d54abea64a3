pub mod http_client;

use async_trait::async_trait;
use contracts::domain::a001_connection::Connection;

use crate::usecases::u501_import_orders::ImportError;

pub use http_client::HttpMarketplaceApi;

/// Клиент API маркетплейса: открывает сессию для подключения
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn open_session(&self, connection: &Connection)
        -> Result<Box<dyn OrderImportSession>, ImportError>;
}

/// Сессия импорта заказов одного подключения
#[async_trait]
pub trait OrderImportSession: Send + Sync {
    async fn import_orders(&self) -> Result<(), ImportError>;
}
