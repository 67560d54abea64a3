//! Настройки платформы по умолчанию с учетом уровня (scope).

use contracts::shared::settings::{OrderImportSetting, Scope, SettingValue};

use crate::shared::config::{OrderImportConfig, StoreOrderImportConfig};

/// Источник настроек по умолчанию: (настройка, уровень, витрина) -> значение
pub trait SettingsProvider: Send + Sync {
    fn get_default(&self, setting: OrderImportSetting, scope: Scope, storeview_id: u32) -> SettingValue;
}

/// Настройки из секции `[order_import]` файла config.toml.
///
/// На уровне витрины сначала проверяется `[[order_import.stores]]` с нужным
/// `storeview_id`, затем `[order_import.defaults]`.
#[derive(Debug, Clone, Default)]
pub struct ConfigSettings {
    config: OrderImportConfig,
}

impl ConfigSettings {
    pub fn new(config: OrderImportConfig) -> Self {
        Self { config }
    }

    fn store(&self, storeview_id: u32) -> Option<&StoreOrderImportConfig> {
        self.config
            .stores
            .iter()
            .find(|store| store.storeview_id == storeview_id)
    }

    fn store_value(store: &StoreOrderImportConfig, setting: OrderImportSetting) -> Option<SettingValue> {
        match setting {
            OrderImportSetting::CustomerCreate => store.customer_create.map(SettingValue::from),
            OrderImportSetting::CustomerGroupId => store
                .customer_group_id
                .map(|id| SettingValue::from(i64::from(id))),
            OrderImportSetting::SendEmails => store.send_emails.map(SettingValue::from),
            OrderImportSetting::ShippingMethod => store.shipping_method.clone().map(SettingValue::from),
            OrderImportSetting::PaymentMethod => store.payment_method.clone().map(SettingValue::from),
        }
    }

    fn default_value(&self, setting: OrderImportSetting) -> SettingValue {
        let defaults = &self.config.defaults;
        match setting {
            OrderImportSetting::CustomerCreate => defaults.customer_create.into(),
            OrderImportSetting::CustomerGroupId => i64::from(defaults.customer_group_id).into(),
            OrderImportSetting::SendEmails => defaults.send_emails.into(),
            OrderImportSetting::ShippingMethod => defaults.shipping_method.clone().into(),
            OrderImportSetting::PaymentMethod => defaults.payment_method.clone().into(),
        }
    }
}

impl SettingsProvider for ConfigSettings {
    fn get_default(&self, setting: OrderImportSetting, scope: Scope, storeview_id: u32) -> SettingValue {
        let scoped = match scope {
            Scope::Store => self
                .store(storeview_id)
                .and_then(|store| Self::store_value(store, setting)),
            Scope::Default => None,
        };

        scoped.unwrap_or_else(|| self.default_value(setting))
    }
}
