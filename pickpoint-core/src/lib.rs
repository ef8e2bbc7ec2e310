pub mod error;
pub mod events;
pub mod models;
pub mod packaging;
pub mod repository;

pub use error::{CacheError, StoreError, ValidationError};
pub use models::{CustomerId, Order, OrderId, REFUND_WINDOW_HOURS};
pub use packaging::{PackageKind, PackagingError};
pub use repository::{OrderCache, OrderStore, StoreTx};
