//! Shared Strategy Framework
//!
//! Seams between the rotation strategy and the outside world: candle sources,
//! alert channels, the fetch error taxonomy, runtime metrics and test doubles.

pub mod error;
pub mod metrics;
pub mod testing;
pub mod traits;

pub use error::*;
pub use metrics::*;
pub use testing::*;
pub use traits::*;
