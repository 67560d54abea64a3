use serde::{Deserialize, Serialize};

use crate::domain::a001_connection::ConnectionId;

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор сохраненной настройки канала (entity_id в ec_marketplaces_channel_mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMappingId(pub i32);

impl ChannelMappingId {
    pub fn value(&self) -> i32 {
        self.0
    }
}

// ============================================================================
// Tri-state
// ============================================================================

/// Значение настройки с тремя состояниями.
///
/// В базе хранится как nullable SMALLINT: `1` (да), `2` ("использовать
/// настройку по умолчанию"), `NULL` (значение не задано). Любое другое число
/// читается как явное "нет".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    Explicit(bool),
    UseDefault,
    #[default]
    Unset,
}

impl TriState {
    pub const STORED_YES: i16 = 1;
    pub const STORED_USE_DEFAULT: i16 = 2;
    pub const STORED_NO: i16 = 0;

    pub fn from_stored(value: Option<i16>) -> Self {
        match value {
            None => Self::Unset,
            Some(Self::STORED_YES) => Self::Explicit(true),
            Some(Self::STORED_USE_DEFAULT) => Self::UseDefault,
            Some(_) => Self::Explicit(false),
        }
    }

    pub fn to_stored(self) -> Option<i16> {
        match self {
            Self::Explicit(true) => Some(Self::STORED_YES),
            Self::Explicit(false) => Some(Self::STORED_NO),
            Self::UseDefault => Some(Self::STORED_USE_DEFAULT),
            Self::Unset => None,
        }
    }

    /// `UseDefault` и `Unset` разрешаются одинаково: через настройку по умолчанию.
    pub fn defers(self) -> bool {
        matches!(self, Self::UseDefault | Self::Unset)
    }

    pub fn explicit(self) -> Option<bool> {
        match self {
            Self::Explicit(value) => Some(value),
            _ => None,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Настройки обработки заказов для одного канала продаж подключения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMapping {
    /// `None`: запись еще не сохранена (новая настройка канала)
    pub id: Option<ChannelMappingId>,
    pub connection_id: ConnectionId,
    pub channel_id: i32,
    pub storeview_id: u32,
    pub storeview_id_internal: Option<u32>,
    pub storeview_id_external: Option<u32>,
    pub external_fulfilment: bool,
    pub customer_create: TriState,
    pub customer_group_id: Option<u32>,
    pub customer_id: Option<u32>,
    pub send_emails: TriState,
    pub discount_code: Option<String>,
    pub shipping_method: Option<String>,
    pub payment_method: Option<String>,
}

impl ChannelMapping {
    /// Пустая (несохраненная) настройка канала.
    /// Все значения разрешаются через настройки по умолчанию.
    pub fn unloaded(connection_id: ConnectionId, channel_id: i32) -> Self {
        Self {
            id: None,
            connection_id,
            channel_id,
            storeview_id: 0,
            storeview_id_internal: None,
            storeview_id_external: None,
            external_fulfilment: false,
            customer_create: TriState::Unset,
            customer_group_id: None,
            customer_id: None,
            send_emails: TriState::Unset,
            discount_code: None,
            shipping_method: None,
            payment_method: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.id.is_some()
    }

    /// Витрина для поиска настроек: явно переданная (если не 0) или витрина канала
    pub fn effective_storeview(&self, storeview_override: u32) -> u32 {
        if storeview_override != 0 {
            storeview_override
        } else {
            self.storeview_id
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.connection_id.value() <= 0 {
            return Err("Connection must be set".into());
        }
        if self.channel_id <= 0 {
            return Err("Channel must be set".into());
        }
        if self.customer_create == TriState::Explicit(true) && self.customer_group_id.is_none() {
            return Err("Customer group is required when customers are created".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_map_to_tri_state() {
        assert_eq!(TriState::from_stored(None), TriState::Unset);
        assert_eq!(TriState::from_stored(Some(1)), TriState::Explicit(true));
        assert_eq!(TriState::from_stored(Some(2)), TriState::UseDefault);
        assert_eq!(TriState::from_stored(Some(0)), TriState::Explicit(false));
        assert_eq!(TriState::from_stored(Some(7)), TriState::Explicit(false));
    }

    #[test]
    fn tri_state_survives_storage() {
        for state in [
            TriState::Explicit(true),
            TriState::Explicit(false),
            TriState::UseDefault,
            TriState::Unset,
        ] {
            assert_eq!(TriState::from_stored(state.to_stored()), state);
        }
    }

    #[test]
    fn override_wins_over_mapping_storeview() {
        let mut mapping = ChannelMapping::unloaded(ConnectionId(1), 10);
        mapping.storeview_id = 5;
        assert_eq!(mapping.effective_storeview(0), 5);
        assert_eq!(mapping.effective_storeview(3), 3);
    }

    #[test]
    fn validation_requires_group_for_created_customers() {
        let mut mapping = ChannelMapping::unloaded(ConnectionId(1), 10);
        mapping.customer_create = TriState::Explicit(true);
        assert!(mapping.validate().is_err());
        mapping.customer_group_id = Some(1);
        assert!(mapping.validate().is_ok());
    }
}
