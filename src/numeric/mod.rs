//! High-precision arithmetic for topological decisions.
//!
//! Ordinary floating point is used everywhere except where round-off could
//! flip a plane-side classification. There, coordinates are lifted into
//! [`HugeScalar`] / [`HugeVector`], evaluated exactly, and only the
//! *approximate* value of the exact result is compared against zero.

mod expansion;
mod huge;

pub use huge::{HugeScalar, HugeVector};
