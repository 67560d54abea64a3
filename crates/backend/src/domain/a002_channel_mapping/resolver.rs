use std::sync::Arc;

use contracts::domain::a002_channel_mapping::{ChannelMapping, ResolvedOrderSettings, TriState};
use contracts::shared::settings::{OrderImportSetting, Scope, SettingValue};

use crate::shared::settings::SettingsProvider;

/// Итоговые настройки обработки заказов канала.
///
/// Значение берется из настройки канала, если оно задано явно. Иначе
/// (несохраненная настройка, "использовать по умолчанию", пустая строка)
/// используется настройка платформы уровня витрины.
///
/// `storeview_override`: витрина для поиска настроек по умолчанию;
/// `0` означает витрину самого канала.
#[derive(Clone)]
pub struct ConfigResolver {
    settings: Arc<dyn SettingsProvider>,
}

impl ConfigResolver {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        Self { settings }
    }

    fn scoped_default(
        &self,
        mapping: &ChannelMapping,
        setting: OrderImportSetting,
        storeview_override: u32,
    ) -> SettingValue {
        let storeview_id = mapping.effective_storeview(storeview_override);
        self.settings.get_default(setting, Scope::Store, storeview_id)
    }

    fn tri_state(
        &self,
        mapping: &ChannelMapping,
        value: TriState,
        setting: OrderImportSetting,
        storeview_override: u32,
    ) -> bool {
        match value.explicit() {
            Some(flag) if mapping.is_loaded() => flag,
            _ => self
                .scoped_default(mapping, setting, storeview_override)
                .as_bool(),
        }
    }

    fn text(
        &self,
        mapping: &ChannelMapping,
        value: Option<&str>,
        setting: OrderImportSetting,
        storeview_override: u32,
    ) -> String {
        match value {
            Some(text) if mapping.is_loaded() && !text.is_empty() => text.to_string(),
            _ => self
                .scoped_default(mapping, setting, storeview_override)
                .as_text(),
        }
    }

    pub fn resolve_customer_create(&self, mapping: &ChannelMapping, storeview_override: u32) -> bool {
        self.tri_state(
            mapping,
            mapping.customer_create,
            OrderImportSetting::CustomerCreate,
            storeview_override,
        )
    }

    /// Группа покупателя следует тому же условию, что и создание покупателя
    pub fn resolve_customer_group_id(&self, mapping: &ChannelMapping, storeview_override: u32) -> u32 {
        if mapping.is_loaded() && !mapping.customer_create.defers() {
            return mapping.customer_group_id.unwrap_or(0);
        }
        self.scoped_default(mapping, OrderImportSetting::CustomerGroupId, storeview_override)
            .as_u32()
    }

    pub fn resolve_send_emails(&self, mapping: &ChannelMapping, storeview_override: u32) -> bool {
        self.tri_state(
            mapping,
            mapping.send_emails,
            OrderImportSetting::SendEmails,
            storeview_override,
        )
    }

    pub fn resolve_shipping_method(&self, mapping: &ChannelMapping, storeview_override: u32) -> String {
        self.text(
            mapping,
            mapping.shipping_method.as_deref(),
            OrderImportSetting::ShippingMethod,
            storeview_override,
        )
    }

    pub fn resolve_payment_method(&self, mapping: &ChannelMapping, storeview_override: u32) -> String {
        self.text(
            mapping,
            mapping.payment_method.as_deref(),
            OrderImportSetting::PaymentMethod,
            storeview_override,
        )
    }

    /// Все настройки канала, готовые для создания заказа
    pub fn resolve_all(&self, mapping: &ChannelMapping, storeview_override: u32) -> ResolvedOrderSettings {
        ResolvedOrderSettings {
            connection_id: mapping.connection_id,
            channel_id: mapping.channel_id,
            storeview_id: mapping.effective_storeview(storeview_override),
            external_fulfilment: mapping.external_fulfilment,
            customer_create: self.resolve_customer_create(mapping, storeview_override),
            customer_group_id: self.resolve_customer_group_id(mapping, storeview_override),
            customer_id: mapping.customer_id,
            send_emails: self.resolve_send_emails(mapping, storeview_override),
            discount_code: mapping.discount_code.clone().filter(|code| !code.is_empty()),
            shipping_method: self.resolve_shipping_method(mapping, storeview_override),
            payment_method: self.resolve_payment_method(mapping, storeview_override),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_connection::ConnectionId;
    use contracts::domain::a002_channel_mapping::ChannelMappingId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Настройки по умолчанию в памяти; запоминает запрошенные витрины
    #[derive(Default)]
    struct FakeSettings {
        values: HashMap<(OrderImportSetting, u32), SettingValue>,
        requested: Mutex<Vec<(OrderImportSetting, Scope, u32)>>,
    }

    impl FakeSettings {
        fn with(mut self, setting: OrderImportSetting, storeview_id: u32, value: impl Into<SettingValue>) -> Self {
            self.values.insert((setting, storeview_id), value.into());
            self
        }
    }

    impl SettingsProvider for FakeSettings {
        fn get_default(&self, setting: OrderImportSetting, scope: Scope, storeview_id: u32) -> SettingValue {
            self.requested.lock().unwrap().push((setting, scope, storeview_id));
            self.values
                .get(&(setting, storeview_id))
                .cloned()
                .unwrap_or(SettingValue::Null)
        }
    }

    fn resolver(settings: FakeSettings) -> (ConfigResolver, Arc<FakeSettings>) {
        let settings = Arc::new(settings);
        (ConfigResolver::new(settings.clone()), settings)
    }

    fn persisted(storeview_id: u32) -> ChannelMapping {
        let mut mapping = ChannelMapping::unloaded(ConnectionId(7), 11);
        mapping.id = Some(ChannelMappingId(1));
        mapping.storeview_id = storeview_id;
        mapping
    }

    #[test]
    fn unloaded_mapping_uses_store_default_for_override() {
        let (resolver, settings) =
            resolver(FakeSettings::default().with(OrderImportSetting::SendEmails, 3, true));
        let mapping = ChannelMapping::unloaded(ConnectionId(7), 11);

        assert!(resolver.resolve_send_emails(&mapping, 3));
        assert_eq!(
            settings.requested.lock().unwrap().as_slice(),
            &[(OrderImportSetting::SendEmails, Scope::Store, 3)]
        );
    }

    #[test]
    fn unloaded_mapping_defers_even_with_explicit_values() {
        let (resolver, _) = resolver(
            FakeSettings::default()
                .with(OrderImportSetting::CustomerCreate, 0, false)
                .with(OrderImportSetting::ShippingMethod, 0, "flatrate_flatrate"),
        );
        let mut mapping = ChannelMapping::unloaded(ConnectionId(7), 11);
        mapping.customer_create = TriState::Explicit(true);
        mapping.shipping_method = Some("tablerate_bestway".into());

        assert!(!resolver.resolve_customer_create(&mapping, 0));
        assert_eq!(resolver.resolve_shipping_method(&mapping, 0), "flatrate_flatrate");
    }

    #[test]
    fn empty_payment_method_falls_back_to_store_default() {
        let (resolver, _) =
            resolver(FakeSettings::default().with(OrderImportSetting::PaymentMethod, 5, "invoice"));
        let mut mapping = persisted(5);
        mapping.payment_method = Some(String::new());

        assert_eq!(resolver.resolve_payment_method(&mapping, 0), "invoice");
    }

    #[test]
    fn stored_strings_are_returned_verbatim() {
        let (resolver, settings) =
            resolver(FakeSettings::default().with(OrderImportSetting::ShippingMethod, 5, "flatrate_flatrate"));
        let mut mapping = persisted(5);
        mapping.shipping_method = Some("tablerate_bestway".into());

        assert_eq!(resolver.resolve_shipping_method(&mapping, 0), "tablerate_bestway");
        assert!(settings.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn use_default_and_unset_resolve_the_same_way() {
        let (resolver, _) = resolver(
            FakeSettings::default()
                .with(OrderImportSetting::CustomerCreate, 5, true)
                .with(OrderImportSetting::SendEmails, 5, "1"),
        );
        for state in [TriState::UseDefault, TriState::Unset] {
            let mut mapping = persisted(5);
            mapping.customer_create = state;
            mapping.send_emails = state;

            assert!(resolver.resolve_customer_create(&mapping, 0));
            assert!(resolver.resolve_send_emails(&mapping, 0));
        }
    }

    #[test]
    fn explicit_tri_state_values_skip_defaults() {
        let (resolver, _) = resolver(FakeSettings::default().with(OrderImportSetting::SendEmails, 5, true));
        let mut mapping = persisted(5);
        mapping.send_emails = TriState::from_stored(Some(9));
        mapping.customer_create = TriState::from_stored(Some(1));

        assert!(!resolver.resolve_send_emails(&mapping, 0));
        assert!(resolver.resolve_customer_create(&mapping, 0));
    }

    #[test]
    fn customer_group_follows_customer_create_condition() {
        let (resolver, _) =
            resolver(FakeSettings::default().with(OrderImportSetting::CustomerGroupId, 5, 4_i64));

        let mut mapping = persisted(5);
        mapping.customer_create = TriState::UseDefault;
        mapping.customer_group_id = Some(9);
        assert_eq!(resolver.resolve_customer_group_id(&mapping, 0), 4);

        mapping.customer_create = TriState::Explicit(false);
        assert_eq!(resolver.resolve_customer_group_id(&mapping, 0), 9);
    }

    #[test]
    fn resolve_all_bundles_every_setting() {
        let (resolver, _) = resolver(
            FakeSettings::default()
                .with(OrderImportSetting::CustomerCreate, 2, true)
                .with(OrderImportSetting::CustomerGroupId, 2, 3_i64)
                .with(OrderImportSetting::SendEmails, 2, false)
                .with(OrderImportSetting::ShippingMethod, 2, "flatrate_flatrate")
                .with(OrderImportSetting::PaymentMethod, 2, "checkmo"),
        );
        let mut mapping = persisted(5);
        mapping.customer_create = TriState::UseDefault;
        mapping.send_emails = TriState::Explicit(true);
        mapping.discount_code = Some("SUMMER".into());
        mapping.external_fulfilment = true;

        let resolved = resolver.resolve_all(&mapping, 2);

        assert_eq!(resolved.storeview_id, 2);
        assert!(resolved.customer_create);
        assert_eq!(resolved.customer_group_id, 3);
        assert!(resolved.send_emails);
        assert_eq!(resolved.shipping_method, "flatrate_flatrate");
        assert_eq!(resolved.payment_method, "checkmo");
        assert_eq!(resolved.discount_code.as_deref(), Some("SUMMER"));
        assert!(resolved.external_fulfilment);
    }
}
