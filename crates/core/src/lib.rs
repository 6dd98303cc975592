pub mod config;
pub mod domain;
pub mod errors;

pub use domain::entity::EntityKind;
pub use domain::installation::{
    AccessTokenGrant, ChatEndpoints, Installation, InstallationRegistration,
};
pub use domain::message::{CommandResult, MessageColor, MessageFormat};
pub use errors::{ApplicationError, CommandError};
