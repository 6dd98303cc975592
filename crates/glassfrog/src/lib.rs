//! Typed access to the GlassFrog organizational-structure API plus the
//! resolution and formatting layer the chat commands are built on.

pub mod client;
pub mod format;
pub mod resolver;
pub mod tree;
pub mod types;

pub use client::{ApiError, GlassfrogApi, HttpGlassfrogClient};
pub use format::AppLinks;
pub use resolver::{resolve_circle, resolve_role};
pub use tree::{build_circle_tree, CircleNode};
pub use types::{
    CircleDetail, CircleListing, CircleRecord, Links, PersonSummary, RoleDetail, RoleRecord,
    SupportedRole,
};
