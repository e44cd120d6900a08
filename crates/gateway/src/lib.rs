pub mod builder;
pub mod cache;
pub mod error;
pub mod gateway;
pub mod metrics;

pub use builder::GatewayBuilder;
pub use cache::MetadataCache;
pub use error::GatewayError;
pub use gateway::{FileStream, Gateway};
pub use metrics::{GatewayMetrics, MetricsSnapshot};
