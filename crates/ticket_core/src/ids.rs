//! Opaque platform identifiers
//!
//! Every identifier the chat platform hands us is an equality-comparable
//! token. Nothing in this crate parses or derives meaning from the raw
//! value; the newtypes exist so a `RoomId` can never be passed where a
//! `UserId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

platform_id!(
    /// A platform user account.
    UserId
);
platform_id!(
    /// A private communication room created per ticket.
    RoomId
);
platform_id!(
    /// The top-level community container panels and tickets live in.
    WorkspaceId
);
platform_id!(
    /// A permission group, e.g. the staff role.
    RoleId
);
platform_id!(
    /// A room category returned by the provisioner.
    CategoryId
);
platform_id!(
    /// A delivery target for transcripts and notices.
    ChannelId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(UserId::new("42"), UserId::from("42"));
        assert_ne!(RoomId::new("a"), RoomId::new("b"));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = WorkspaceId::new("guild-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"guild-1\"");
        let back: WorkspaceId = serde_json::from_str("\"guild-1\"").unwrap();
        assert_eq!(back, id);
    }
}
