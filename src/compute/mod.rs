//! Compute layer: geometry, indexes and query planning.
//!
//! Everything here is synchronous and free of locking; the engine wraps the
//! indexes for shared access.

pub mod spatial;
pub mod validation;
