//! Consistency checking between a CODEOWNERS-style ownership manifest and
//! the actual contents of a set of tracked directory trees.
//!
//! Two invariants are enforced: every file under the tracked trees must be
//! matched by at least one rule, and every rule that is relevant to the
//! tracked trees must match at least one real file. Everything else — how
//! the manifest is located, how directories are walked, how failures are
//! rendered — is the caller's business, fed in through [`FileSource`] and
//! read back out of the [`ValidationReport`].

pub mod parser;

mod engine;
mod error;
mod pattern;
mod report;

pub use engine::{check, validate, FileSource};
pub use error::ValidationError;
pub use parser::Rule;
pub use pattern::{normalize, Pattern};
pub use report::{UnusedRule, ValidationReport};
