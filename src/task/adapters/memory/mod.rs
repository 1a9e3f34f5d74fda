//! In-memory adapters for tests and local runs.

mod gateway;
mod navigator;

pub use gateway::InMemoryTaskGateway;
pub use navigator::RecordingNavigator;
