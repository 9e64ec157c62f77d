//! Common types shared by the PAT health-check crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
