pub mod db;
pub mod migration_runner;
pub mod migrations;
pub mod schema;
