//! Taskdeck: an offline-tolerant task list core.
//!
//! This crate provides the state and interaction logic behind a tabbed task
//! list: optimistic status transitions driven by swipe gestures, a shared
//! multi-selection for bulk actions, and reconciliation with a remote task
//! store that may fail or lag behind.
//!
//! # Architecture
//!
//! Taskdeck follows hexagonal architecture principles:
//!
//! - **Domain**: Pure task types with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the task store and navigation
//! - **Adapters**: In-memory implementations of the ports
//!
//! # Modules
//!
//! - [`task`]: Task records, lifecycle controller and list interactions

pub mod task;
