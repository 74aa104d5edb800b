#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod analysis;
mod detection;
mod geometry;
mod grade;
mod origin;

pub use analysis::*;
pub use detection::*;
pub use geometry::*;
pub use grade::*;
pub use origin::*;
