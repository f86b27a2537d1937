//! ticket_lifecycle - stateful services for the support-ticket workflow
//!
//! Owns the process-lifetime state (cooldowns, the ticket registry, saved
//! panel configurations) and the `LifecycleController` that drives tickets
//! through open, claim and close in response to platform events. The
//! platform itself is reached only through the traits in [`platform`];
//! [`testing`] provides an in-memory stand-in for all of them.

pub mod config;
pub mod controller;
pub mod cooldown;
pub mod panel_store;
pub mod platform;
pub mod registry;
pub mod testing;

// Re-export commonly used types
pub use config::ControllerConfig;
pub use controller::LifecycleController;
pub use cooldown::{CooldownStatus, CooldownTracker};
pub use panel_store::PanelStore;
pub use platform::{
    DeliverySink, MessageHistorySource, PermissionOracle, RoomPermissions, RoomProvisioner,
};
pub use registry::{Resolution, TicketRegistry};
pub use testing::FakePlatform;
