//! Services layer (ports + adapters).
//!
//! - `ports`: contracts and configuration types used by the components.
//! - `adapters`: filesystem / platform specific implementations.

pub mod adapters;
pub mod bus;
pub mod ports;

pub use bus::{event_bus, EventBusReceiver, EventBusSender, EventSink};
