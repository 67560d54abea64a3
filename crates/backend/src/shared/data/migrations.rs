//! Шаги схемы модуля ec_marketplaces.

use contracts::system::SchemaVersion;

use super::migration_runner::{MigrationStep, SchemaChange};
use super::schema::{ColumnSpec, ColumnType, OnDelete, SeedValue};

pub const TABLE_STORE: &str = "store";
pub const TABLE_CONNECTION: &str = "ec_marketplaces_connection";
pub const TABLE_CHANNEL_MAPPING: &str = "ec_marketplaces_channel_mapping";
pub const TABLE_ORDER_LINES: &str = "ec_marketplaces_order_lines";
pub const TABLE_LOG: &str = "ec_marketplaces_log";

pub fn module_steps() -> Vec<MigrationStep> {
    vec![
        install(),
        add_channel_mapping_storeview_ids(),
        add_connection_base_storeview_id(),
        add_order_line_export_flag(),
        widen_order_line_id(),
    ]
}

/// 1.0.0: исходные таблицы модуля.
/// Витрина 0 (admin) служит значением по умолчанию для ссылок на store.
fn install() -> MigrationStep {
    MigrationStep::new(
        SchemaVersion::new(1, 0, 0),
        "install",
        vec![
            SchemaChange::create_table(
                TABLE_STORE,
                vec![
                    ColumnSpec::new("store_id", ColumnType::Integer).primary_key(),
                    ColumnSpec::new("code", ColumnType::Varchar(32)).not_null(),
                    ColumnSpec::new("name", ColumnType::Varchar(255)).not_null(),
                ],
            ),
            SchemaChange::seed_row(
                TABLE_STORE,
                "store_id",
                0,
                vec![
                    ("code", SeedValue::Text("admin".into())),
                    ("name", SeedValue::Text("Admin".into())),
                ],
            ),
            SchemaChange::create_table(
                TABLE_CONNECTION,
                vec![
                    ColumnSpec::new("entity_id", ColumnType::Integer).primary_key(),
                    ColumnSpec::new("name", ColumnType::Varchar(255)).not_null(),
                    ColumnSpec::new("is_active", ColumnType::SmallInt)
                        .not_null()
                        .default_value(0),
                    ColumnSpec::new("public_key", ColumnType::Varchar(255)).not_null(),
                    ColumnSpec::new("secret_key", ColumnType::Varchar(255)).not_null(),
                ],
            ),
            SchemaChange::create_table(
                TABLE_CHANNEL_MAPPING,
                vec![
                    ColumnSpec::new("entity_id", ColumnType::Integer).primary_key(),
                    ColumnSpec::new("connection_id", ColumnType::Integer)
                        .not_null()
                        .references(TABLE_CONNECTION, "entity_id", OnDelete::Restrict),
                    ColumnSpec::new("channel_id", ColumnType::Integer).not_null(),
                    ColumnSpec::new("storeview_id", ColumnType::Integer)
                        .not_null()
                        .default_value(0),
                    ColumnSpec::new("external_fulfilment", ColumnType::SmallInt)
                        .not_null()
                        .default_value(0),
                    ColumnSpec::new("customer_create", ColumnType::SmallInt),
                    ColumnSpec::new("customer_group_id", ColumnType::Integer),
                    ColumnSpec::new("customer_id", ColumnType::Integer),
                    ColumnSpec::new("send_emails", ColumnType::SmallInt),
                    ColumnSpec::new("discount_code", ColumnType::Varchar(255)),
                    ColumnSpec::new("shipping_method", ColumnType::Varchar(255)),
                    ColumnSpec::new("payment_method", ColumnType::Varchar(255)),
                ],
            ),
            SchemaChange::create_table(
                TABLE_ORDER_LINES,
                vec![
                    ColumnSpec::new("entity_id", ColumnType::Integer).primary_key(),
                    ColumnSpec::new("connection_id", ColumnType::Integer)
                        .not_null()
                        .references(TABLE_CONNECTION, "entity_id", OnDelete::Cascade),
                    ColumnSpec::new("order_id", ColumnType::Integer).not_null(),
                    ColumnSpec::new("ec_order_line_id", ColumnType::Varchar(64)).not_null(),
                ],
            ),
            SchemaChange::create_table(
                TABLE_LOG,
                vec![
                    ColumnSpec::new("entity_id", ColumnType::Integer).primary_key(),
                    ColumnSpec::new("created_at", ColumnType::Varchar(32)).not_null(),
                    ColumnSpec::new("connection_id", ColumnType::Integer),
                    ColumnSpec::new("category", ColumnType::Varchar(64)).not_null(),
                    ColumnSpec::new("message", ColumnType::Text).not_null(),
                ],
            ),
        ],
    )
}

/// 1.0.25: витрины для внутренних и внешних заказов канала
fn add_channel_mapping_storeview_ids() -> MigrationStep {
    MigrationStep::new(
        SchemaVersion::new(1, 0, 25),
        "add channel mapping storeview ids",
        vec![
            SchemaChange::add_column(
                TABLE_CHANNEL_MAPPING,
                ColumnSpec::new("storeview_id_internal", ColumnType::SmallInt).references(
                    TABLE_STORE,
                    "store_id",
                    OnDelete::SetNull,
                ),
            ),
            SchemaChange::add_column(
                TABLE_CHANNEL_MAPPING,
                ColumnSpec::new("storeview_id_external", ColumnType::SmallInt).references(
                    TABLE_STORE,
                    "store_id",
                    OnDelete::SetNull,
                ),
            ),
        ],
    )
}

/// 1.0.28: базовая витрина подключения
fn add_connection_base_storeview_id() -> MigrationStep {
    MigrationStep::new(
        SchemaVersion::new(1, 0, 28),
        "add connection base storeview id",
        vec![SchemaChange::add_column(
            TABLE_CONNECTION,
            ColumnSpec::new("base_storeview_id", ColumnType::SmallInt)
                .not_null()
                .default_value(0)
                .references(TABLE_STORE, "store_id", OnDelete::SetDefault),
        )],
    )
}

/// 1.0.36: признак готовности строки заказа к выгрузке
fn add_order_line_export_flag() -> MigrationStep {
    MigrationStep::new(
        SchemaVersion::new(1, 0, 36),
        "add export flag to order lines",
        vec![SchemaChange::add_column(
            TABLE_ORDER_LINES,
            ColumnSpec::new("export", ColumnType::SmallInt)
                .not_null()
                .default_value(0),
        )],
    )
}

/// 1.0.41: ec_order_line_id VARCHAR(64) -> VARCHAR(128)
fn widen_order_line_id() -> MigrationStep {
    MigrationStep::new(
        SchemaVersion::new(1, 0, 41),
        "increase order line id length",
        vec![SchemaChange::widen_column(
            TABLE_ORDER_LINES,
            ColumnSpec::new("ec_order_line_id", ColumnType::Varchar(128)).not_null(),
        )],
    )
}
