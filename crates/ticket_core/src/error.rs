//! Ticket workflow error types

use crate::ids::RoomId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("user already has an open ticket")]
    DuplicateTicket,

    #[error("ticket creation is on cooldown for another {remaining_seconds}s")]
    CooldownActive { remaining_seconds: u64 },

    #[error("permission denied")]
    PermissionDenied,

    #[error("no panel is configured for this workspace")]
    NotConfigured,

    #[error("no ticket is registered for room {0}")]
    UnknownRoom(RoomId),

    #[error("invalid ticket state transition: {0}")]
    InvalidTransition(&'static str),

    #[error("room provisioning failed: {0}")]
    Provisioning(anyhow::Error),

    #[error("transcript delivery failed: {0}")]
    Delivery(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TicketError>;
