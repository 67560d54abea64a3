pub mod aggregate;
pub mod resolved;

pub use aggregate::{ChannelMapping, ChannelMappingId, TriState};
pub use resolved::ResolvedOrderSettings;
