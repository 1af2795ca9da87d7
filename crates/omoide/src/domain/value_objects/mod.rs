//! Value Objects
//!
//! Immutable value types that describe domain concepts.

mod sender;
mod verbosity;

pub use sender::*;
pub use verbosity::*;
