//! Structural-sharing merge over immutable JSON-like trees.
//!
//! Repeatedly polling an endpoint usually yields bodies that are value-equal
//! to what was already held. Decoding those bodies naively produces entirely
//! new allocations, which defeats any downstream change detection keyed on
//! identity. This module provides the fix: [`SharedValue`], a JSON tree whose
//! composite nodes share children behind [`std::sync::Arc`], and
//! [`structural_merge`], a pure recursive merge that returns the *old*
//! pointer for every subtree whose value did not change.
//!
//! The loader folds every successful response body through
//! [`structural_merge`] against the slot's previous value, so state slots
//! only register a change (and bump their version) when the data actually
//! differs.

pub mod node;
pub mod structural;

pub use node::SharedValue;
pub use structural::{structural_merge, structural_merge_value};
