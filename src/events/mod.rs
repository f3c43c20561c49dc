pub mod publisher;
pub mod types;

// Re-export key types for convenience
pub use publisher::EventPublisher;
pub use types::{DomainEvent, HealthNotification};
