//! Port contracts for the task list.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod gateway;
pub mod navigation;

pub use gateway::{
    TaskGateway, TaskGatewayError, TaskGatewayResult, TaskPatch, TaskSnapshotStream,
};
pub use navigation::Navigator;
