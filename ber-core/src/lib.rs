//! Core types for the generic BER codec
//!
//! This crate provides the error taxonomy and the date/time scalar types
//! shared by the encoder and decoder engines.

pub mod error;
pub mod datatypes;

pub use error::{BerError, BerResult};
pub use datatypes::{BerDate, BerDateTime, BerTime, Month};
