//! # envsafe-core — Foundational Types for envsafe
//!
//! This crate is the leaf of the envsafe workspace. It defines the
//! type-system primitives shared by the resolver, the evaluator, and any
//! caller that aggregates their output. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `JurisdictionCode` and `EntityId`
//!    are validated at construction and at deserialization. No bare strings
//!    flow into a threshold lookup.
//!
//! 2. **One `SafetyStatus` lattice.** `Safe < Warning < Danger`. Aggregation
//!    is a join over this order; an empty set is `Safe`.
//!
//! 3. **Single `SafetyCategory` enum.** Water, air, health, disaster.
//!    Every `match` is exhaustive, so adding a category forces every
//!    consumer to handle it.
//!
//! 4. **Jurisdiction tables tolerate malformed data.** Dangling and cyclic
//!    parent pointers are reported by `validate()` and bounded by
//!    `chain()`, never by a panic.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `envsafe-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod category;
pub mod error;
pub mod identity;
pub mod jurisdiction;
pub mod status;

// Re-export primary types for ergonomic imports.
pub use category::{SafetyCategory, SAFETY_CATEGORY_COUNT};
pub use error::{SafetyError, ValidationError};
pub use identity::{EntityId, JurisdictionCode};
pub use jurisdiction::{ChainEnd, ChainWalk, Jurisdiction, JurisdictionTable, MAX_CHAIN_DEPTH};
pub use status::{worst_status, SafetyStatus};
