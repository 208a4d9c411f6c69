//! Request handlers.

pub mod download;
pub mod health;
pub mod keys;

pub use download::*;
pub use health::*;
pub use keys::*;
