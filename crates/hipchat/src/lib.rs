//! HipChat integration for Hipfrog.
//!
//! - **Events** (`events`) - room-message webhook envelopes
//! - **Commands** (`commands`) - `/hipfrog circle ...`, `/hipfrog role ...`
//! - **Mentions** (`mentions`) - `@role` / `@circle` re-broadcasts with room mentions
//! - **Capabilities** (`capabilities`) - the add-on descriptor HipChat installs from
//! - **Client** (`client`) - token exchange, room notifications and roster
//!
//! ```text
//! room_message webhook → CommandDispatcher / MentionDispatcher → GlassFrog → CommandResult
//! ```

pub mod capabilities;
pub mod client;
pub mod commands;
pub mod events;
pub mod mentions;
pub mod messages;

pub use capabilities::Descriptor;
pub use client::{HipchatApi, HipchatError, HttpHipchatClient, RoomMember};
pub use commands::{CommandDispatcher, HipfrogCommand};
pub use events::{EventContext, RoomMessageEvent};
pub use mentions::{MentionDispatcher, MentionKind};
