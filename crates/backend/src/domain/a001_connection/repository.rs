use async_trait::async_trait;
use contracts::domain::a001_connection::{Connection, ConnectionFilter, ConnectionId, Credentials};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ec_marketplaces_connection")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub entity_id: i32,
    pub name: String,
    pub is_active: i16,
    pub public_key: String,
    pub secret_key: String,
    pub base_storeview_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Connection {
    fn from(m: Model) -> Self {
        Connection::new(
            ConnectionId(m.entity_id),
            m.name,
            Credentials::new(m.public_key, m.secret_key),
        )
        .with_active(m.is_active != 0)
        .with_base_storeview(u32::try_from(m.base_storeview_id).unwrap_or(0))
    }
}

/// Доступ к подключениям маркетплейса
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn list(&self, filter: &ConnectionFilter) -> anyhow::Result<Vec<Connection>>;

    async fn get_by_id(&self, id: ConnectionId) -> anyhow::Result<Option<Connection>>;
}

pub struct SeaOrmConnectionRepository {
    conn: DatabaseConnection,
}

impl SeaOrmConnectionRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, connection: &Connection) -> anyhow::Result<ConnectionId> {
        let active = ActiveModel {
            entity_id: if connection.id.value() > 0 {
                Set(connection.id.value())
            } else {
                sea_orm::ActiveValue::NotSet
            },
            name: Set(connection.name.clone()),
            is_active: Set(i16::from(connection.is_active)),
            public_key: Set(connection.credentials.public_key.clone()),
            secret_key: Set(connection.credentials.secret_key.clone()),
            base_storeview_id: Set(i32::try_from(connection.base_storeview_id)?),
        };
        let model = active.insert(&self.conn).await?;
        Ok(ConnectionId(model.entity_id))
    }
}

#[async_trait]
impl ConnectionRepository for SeaOrmConnectionRepository {
    async fn list(&self, filter: &ConnectionFilter) -> anyhow::Result<Vec<Connection>> {
        let mut query = Entity::find().order_by_asc(Column::EntityId);
        if let Some(is_active) = filter.is_active {
            query = if is_active {
                query.filter(Column::IsActive.ne(0))
            } else {
                query.filter(Column::IsActive.eq(0))
            };
        }

        let items = query
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }

    async fn get_by_id(&self, id: ConnectionId) -> anyhow::Result<Option<Connection>> {
        let result = Entity::find_by_id(id.value()).one(&self.conn).await?;
        Ok(result.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::{memory_database, seed_store};
    use sea_orm::ConnectionTrait;

    async fn seeded() -> SeaOrmConnectionRepository {
        let conn = memory_database().await;
        seed_store(&conn, 4, "wholesale").await;
        let repo = SeaOrmConnectionRepository::new(conn);
        for connection in [
            Connection::new(ConnectionId(1), "Main", Credentials::new("pk1", "sk1")),
            Connection::new(ConnectionId(2), "Outlet", Credentials::new("pk2", "sk2"))
                .with_active(false),
            Connection::new(ConnectionId(3), "Wholesale", Credentials::new("pk3", "sk3"))
                .with_base_storeview(4),
        ] {
            repo.insert(&connection).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn active_filter_excludes_inactive_connections() {
        let repo = seeded().await;

        let active: Vec<i32> = repo
            .list(&ConnectionFilter::active())
            .await
            .unwrap()
            .iter()
            .map(|c| c.id.value())
            .collect();
        assert_eq!(active, vec![1, 3]);

        let all = repo.list(&ConnectionFilter::all()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn get_by_id_maps_columns() {
        let repo = seeded().await;

        let connection = repo.get_by_id(ConnectionId(3)).await.unwrap().unwrap();
        assert_eq!(connection.name, "Wholesale");
        assert!(connection.is_active);
        assert_eq!(connection.base_storeview_id, 4);
        assert_eq!(connection.credentials, Credentials::new("pk3", "sk3"));

        assert!(repo.get_by_id(ConnectionId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn default_connection_references_admin_store() {
        let repo = SeaOrmConnectionRepository::new(memory_database().await);

        let id = repo
            .insert(&Connection::new(ConnectionId(1), "Main", Credentials::new("pk", "sk")))
            .await
            .unwrap();

        let connection = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(connection.base_storeview_id, 0);
    }

    #[tokio::test]
    async fn unknown_base_storeview_is_rejected() {
        let repo = SeaOrmConnectionRepository::new(memory_database().await);

        let result = repo
            .insert(
                &Connection::new(ConnectionId(1), "Main", Credentials::new("pk", "sk"))
                    .with_base_storeview(99),
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn deleting_store_resets_base_storeview_to_admin() {
        let repo = seeded().await;

        repo.conn
            .execute_unprepared("DELETE FROM store WHERE store_id = 4")
            .await
            .unwrap();

        let connection = repo.get_by_id(ConnectionId(3)).await.unwrap().unwrap();
        assert_eq!(connection.base_storeview_id, 0);
    }
}
