use serde::{Deserialize, Serialize};
use std::fmt;

/// Уровень, на котором ищется значение настройки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Default,
    Store,
}

/// Настройки импорта заказов, которые канал может переопределить
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderImportSetting {
    CustomerCreate,
    CustomerGroupId,
    SendEmails,
    ShippingMethod,
    PaymentMethod,
}

impl OrderImportSetting {
    /// Путь настройки в конфигурации платформы
    pub fn path(&self) -> &'static str {
        match self {
            Self::CustomerCreate => "order_import/customer_create",
            Self::CustomerGroupId => "order_import/customer_group_id",
            Self::SendEmails => "order_import/send_emails",
            Self::ShippingMethod => "order_import/shipping_method",
            Self::PaymentMethod => "order_import/payment_method",
        }
    }
}

impl fmt::Display for OrderImportSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Скалярное значение настройки платформы без строгого типа.
/// Приведение к нужному типу никогда не падает.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    /// `Null`, `0`, `""` и `"0"` дают ложь, остальное истину
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Text(text) => {
                let text = text.trim();
                !(text.is_empty() || text == "0")
            }
        }
    }

    /// Целое значение; нечисловой текст и отрицательные числа дают 0
    pub fn as_u32(&self) -> u32 {
        match self {
            Self::Null => 0,
            Self::Bool(value) => u32::from(*value),
            Self::Int(value) => u32::try_from(*value).unwrap_or(0),
            Self::Text(text) => text.trim().parse::<u32>().unwrap_or(0),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => if *value { "1".into() } else { "0".into() },
            Self::Int(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
