//! Integration test crate for cutmark.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the cutmark crates to verify they work together.

#[cfg(test)]
mod index;

#[cfg(test)]
mod state;

#[cfg(test)]
mod workflow;
