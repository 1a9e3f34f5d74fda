//! Task list management.
//!
//! Tasks move between three tabs (active, completed and deleted) through
//! swipe gestures and bulk actions. Every change is applied locally first
//! and persisted through an asynchronous gateway, with failed writes
//! reverted or kept as unsynced. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
