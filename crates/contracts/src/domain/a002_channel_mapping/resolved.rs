use serde::{Deserialize, Serialize};

use crate::domain::a001_connection::ConnectionId;

/// Итоговые настройки канала с учетом значений по умолчанию.
/// Передаются в создание заказа.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOrderSettings {
    pub connection_id: ConnectionId,
    pub channel_id: i32,
    pub storeview_id: u32,
    pub external_fulfilment: bool,
    pub customer_create: bool,
    pub customer_group_id: u32,
    pub customer_id: Option<u32>,
    pub send_emails: bool,
    pub discount_code: Option<String>,
    pub shipping_method: String,
    pub payment_method: String,
}
