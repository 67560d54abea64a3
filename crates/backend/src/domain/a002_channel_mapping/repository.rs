use contracts::domain::a001_connection::ConnectionId;
use contracts::domain::a002_channel_mapping::{ChannelMapping, ChannelMappingId, TriState};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ec_marketplaces_channel_mapping")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub entity_id: i32,
    pub connection_id: i32,
    pub channel_id: i32,
    pub storeview_id: i32,
    pub storeview_id_internal: Option<i32>,
    pub storeview_id_external: Option<i32>,
    pub external_fulfilment: i16,
    pub customer_create: Option<i16>,
    pub customer_group_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub send_emails: Option<i16>,
    pub discount_code: Option<String>,
    pub shipping_method: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_i32(value: u32) -> anyhow::Result<i32> {
    Ok(i32::try_from(value)?)
}

impl From<Model> for ChannelMapping {
    fn from(m: Model) -> Self {
        ChannelMapping {
            id: Some(ChannelMappingId(m.entity_id)),
            connection_id: ConnectionId(m.connection_id),
            channel_id: m.channel_id,
            storeview_id: to_u32(m.storeview_id),
            storeview_id_internal: m.storeview_id_internal.map(to_u32),
            storeview_id_external: m.storeview_id_external.map(to_u32),
            external_fulfilment: m.external_fulfilment != 0,
            customer_create: TriState::from_stored(m.customer_create),
            customer_group_id: m.customer_group_id.map(to_u32),
            customer_id: m.customer_id.map(to_u32),
            send_emails: TriState::from_stored(m.send_emails),
            discount_code: m.discount_code,
            shipping_method: m.shipping_method,
            payment_method: m.payment_method,
        }
    }
}

fn to_active_model(mapping: &ChannelMapping) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        entity_id: match mapping.id {
            Some(id) => Set(id.value()),
            None => sea_orm::ActiveValue::NotSet,
        },
        connection_id: Set(mapping.connection_id.value()),
        channel_id: Set(mapping.channel_id),
        storeview_id: Set(to_i32(mapping.storeview_id)?),
        storeview_id_internal: Set(mapping.storeview_id_internal.map(to_i32).transpose()?),
        storeview_id_external: Set(mapping.storeview_id_external.map(to_i32).transpose()?),
        external_fulfilment: Set(i16::from(mapping.external_fulfilment)),
        customer_create: Set(mapping.customer_create.to_stored()),
        customer_group_id: Set(mapping.customer_group_id.map(to_i32).transpose()?),
        customer_id: Set(mapping.customer_id.map(to_i32).transpose()?),
        send_emails: Set(mapping.send_emails.to_stored()),
        discount_code: Set(mapping.discount_code.clone()),
        shipping_method: Set(mapping.shipping_method.clone()),
        payment_method: Set(mapping.payment_method.clone()),
    })
}

/// Хранилище настроек каналов (ec_marketplaces_channel_mapping)
#[derive(Clone)]
pub struct ChannelMappingRepository {
    conn: DatabaseConnection,
}

impl ChannelMappingRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: ChannelMappingId) -> anyhow::Result<Option<ChannelMapping>> {
        let result = Entity::find_by_id(id.value()).one(&self.conn).await?;
        Ok(result.map(Into::into))
    }

    /// Настройка канала подключения. Если записи нет, возвращается
    /// несохраненная настройка: все значения берутся по умолчанию.
    pub async fn find_for_channel(
        &self,
        connection_id: ConnectionId,
        channel_id: i32,
    ) -> anyhow::Result<ChannelMapping> {
        let result = Entity::find()
            .filter(Column::ConnectionId.eq(connection_id.value()))
            .filter(Column::ChannelId.eq(channel_id))
            .one(&self.conn)
            .await?;
        Ok(result
            .map(Into::into)
            .unwrap_or_else(|| ChannelMapping::unloaded(connection_id, channel_id)))
    }

    pub async fn save(&self, mapping: &ChannelMapping) -> anyhow::Result<ChannelMappingId> {
        mapping.validate().map_err(|e| anyhow::anyhow!(e))?;

        let active = to_active_model(mapping)?;
        let model = if mapping.is_loaded() {
            active.update(&self.conn).await?
        } else {
            active.insert(&self.conn).await?
        };
        Ok(ChannelMappingId(model.entity_id))
    }
}
