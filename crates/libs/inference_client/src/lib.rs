#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod client;
mod error;
mod wire;

pub use client::*;
pub use error::*;
pub use wire::parse_response;
