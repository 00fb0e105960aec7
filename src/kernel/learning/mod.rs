//! Playground learning state: undo history of property edits and
//! challenge completion.

mod challenge;
mod history;
mod policy;

pub use challenge::{default_challenges, Challenge, ChallengeTracker, Progress, Requirement};
pub use history::{PropertyChange, PropertyHistory};
pub use policy::{PolicyError, UndoPolicy};

#[cfg(test)]
#[path = "../../../tests/unit/kernel/learning/mod.rs"]
mod tests;
