//! Headless components and the services they run on.

pub mod event;
pub mod learning;
pub mod services;
pub mod storage;
pub mod tabs;
pub mod toast;

pub use event::{ChangeOrigin, LearningEvent, PlatformEvent, StorageEvent, TabEvent, ToastEvent};
pub use learning::{ChallengeTracker, PropertyHistory};
pub use storage::KeyValueStore;
pub use tabs::TabRegistry;
pub use toast::NotificationQueue;
