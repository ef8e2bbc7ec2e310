pub mod manager;

pub use manager::{NewOrder, OrderError, OrderManager};
