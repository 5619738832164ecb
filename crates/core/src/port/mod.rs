// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod job_deserializer;
pub mod performer;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_deserializer::{JobDeserializer, ResolvedJob};
pub use performer::Performer;
pub use time_provider::TimeProvider;
