pub mod initialization;
pub mod manager;
pub mod managers;
pub mod registry;
pub mod worker;

pub use initialization::initialize_scheduled_tasks;
pub use manager::TaskManager;
pub use registry::TaskManagerRegistry;
pub use worker::ScheduledTaskWorker;
