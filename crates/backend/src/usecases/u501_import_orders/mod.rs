pub mod connection_fetcher;
pub mod errors;
pub mod executor;

pub use connection_fetcher::{ConnectionFetcher, SessionProvider};
pub use errors::ImportError;
pub use executor::ImportOrchestrator;
