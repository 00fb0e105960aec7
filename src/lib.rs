//! stylelab - headless state core of a CSS learning playground
//!
//! Module layout:
//! - core: clock, confirmation, key chords, callback errors
//! - kernel: storage, notifications, tabs, learning state, event bus
//! - app: the `Platform` context wiring the components together

pub mod app;
pub mod core;
pub mod kernel;
