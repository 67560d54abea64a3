pub mod u501_import_orders;

pub use u501_import_orders::U501ImportOrdersManager;
