//! Phase-2 metric implementations. Each module is a pure, synchronous
//! algorithm; the async cancellation/timeout harness that wraps them lives
//! in [`crate::harness`] and is orchestrated by [`crate::analysis`].

pub mod betweenness;
pub mod critical_path;
pub mod cycles;
pub mod eigenvector;
pub mod hits;
pub mod kcore;
pub mod pagerank;
pub mod slack;
