//! Scalar data types with a dedicated ASN.1 universal tag

pub mod date;
pub mod time;
pub mod date_time;

// Re-export types
pub use date::{BerDate, Month};
pub use time::BerTime;
pub use date_time::BerDateTime;
