pub mod metrics;
pub mod viewport;

pub use metrics::*;
pub use viewport::*;
