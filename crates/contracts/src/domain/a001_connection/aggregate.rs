use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор подключения к маркетплейсу (entity_id в ec_marketplaces_connection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub i32);

impl ConnectionId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Ключи доступа к API маркетплейса
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub public_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Проверка ключей до обращения к API.
    /// Возвращает текст ошибки, который попадает в лог импорта.
    pub fn validate(&self) -> Result<(), String> {
        if self.public_key.trim().is_empty() {
            return Err("Public key is empty".into());
        }
        if self.secret_key.trim().is_empty() {
            return Err("Secret key is empty".into());
        }
        if self.public_key.chars().any(char::is_whitespace)
            || self.secret_key.chars().any(char::is_whitespace)
        {
            return Err("Key contains whitespace characters".into());
        }
        Ok(())
    }
}

// Секретный ключ не попадает в логи
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &"***")
            .finish()
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Подключение канала продаж к API маркетплейса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    pub is_active: bool,
    /// Витрина, из которой берется базовая информация (store.store_id)
    pub base_storeview_id: u32,
    pub credentials: Credentials,
}

impl Connection {
    pub fn new(id: ConnectionId, name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
            base_storeview_id: 0,
            credentials,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_base_storeview(mut self, storeview_id: u32) -> Self {
        self.base_storeview_id = storeview_id;
        self
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Фильтр для выборки подключений из репозитория
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionFilter {
    pub is_active: Option<bool>,
}

impl ConnectionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Только активные подключения (is_active = true)
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
        }
    }

    pub fn matches(&self, connection: &Connection) -> bool {
        self.is_active
            .map_or(true, |flag| connection.is_active == flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_are_rejected() {
        assert!(Credentials::new("", "secret").validate().is_err());
        assert!(Credentials::new("public", "   ").validate().is_err());
        assert!(Credentials::new("pub lic", "secret").validate().is_err());
        assert!(Credentials::new("public", "secret").validate().is_ok());
    }

    #[test]
    fn debug_output_hides_secret() {
        let printed = format!("{:?}", Credentials::new("public", "top-secret"));
        assert!(printed.contains("public"));
        assert!(!printed.contains("top-secret"));
    }

    #[test]
    fn active_filter_skips_inactive_connections() {
        let active = Connection::new(ConnectionId(1), "shop", Credentials::new("a", "b"));
        let inactive = active.clone().with_active(false);

        assert!(ConnectionFilter::active().matches(&active));
        assert!(!ConnectionFilter::active().matches(&inactive));
        assert!(ConnectionFilter::all().matches(&inactive));
    }
}
