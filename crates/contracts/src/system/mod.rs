pub mod schema_version;

pub use schema_version::SchemaVersion;
