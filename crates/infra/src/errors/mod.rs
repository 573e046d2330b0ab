//! Infrastructure error handling
//!
//! Conversions from external library errors into the domain taxonomy live
//! here so adapter code can use `?` throughout.

mod conversions;

pub use conversions::InfraError;
