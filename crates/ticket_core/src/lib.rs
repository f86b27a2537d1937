//! ticket_core - Core types for the support-ticket workflow
//!
//! This crate provides the foundational types used by the lifecycle layer:
//! - `ids` - opaque platform identifiers
//! - `ticket` - the ticket state machine
//! - `transcript` - archival transcript rendering
//! - `panel` - saved panel configuration
//! - `event` - inbound events and outbound signals

pub mod error;
pub mod event;
pub mod ids;
pub mod panel;
pub mod ticket;
pub mod transcript;

// Re-export commonly used types
pub use error::{Result, TicketError};
pub use event::{Event, Signal};
pub use ids::{CategoryId, ChannelId, RoleId, RoomId, UserId, WorkspaceId};
pub use panel::PanelConfig;
pub use ticket::{CloseBegin, Ticket, TicketState};
pub use transcript::{
    HistoryMessage, Transcript, EMPTY_MESSAGE_PLACEHOLDER, TRANSCRIPT_MESSAGE_CAP,
};
