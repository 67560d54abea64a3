pub mod aggregate;

pub use aggregate::{Connection, ConnectionFilter, ConnectionId, Credentials};
