//! Core primitives shared by every component.
//!
//! - clock: injectable time source (wall clock or manual)
//! - confirm: interactive confirmation capability
//! - event: key chords coming from the host
//! - callback: error type returned by consumer callbacks

pub mod callback;
pub mod clock;
pub mod confirm;
pub mod event;

pub use callback::CallbackError;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use confirm::{AutoConfirm, Confirm, SharedConfirm};
pub use event::{Key, KeyCode, Modifiers};
