pub mod repository;
pub mod resolver;

pub use repository::ChannelMappingRepository;
pub use resolver::ConfigResolver;
