pub mod config;
pub mod error;
pub mod quantity;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::{QuantityError, ServiceError};
pub use quantity::Quantity;
pub use service::*;
pub use storage::*;
