use thiserror::Error;

use crate::domain::entity::EntityKind;

/// Failures of a chat command. `Display` is the text shown in the room.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(
        "Sorry, no {kind} matched <code>{identifier}</code>. Use the {kind} ID instead, or \
         type <code>/hipfrog circles</code> to browse your organization."
    )]
    NotFound { kind: EntityKind, identifier: String },
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },
    #[error("Please set the Glassfrog Token first in the plugin configuration.")]
    MissingConfiguration,
    #[error(
        "Please specify a {} ID after @{kind}. Type <code>/hipfrog</code> to find it.",
        .kind.title()
    )]
    MalformedMention { kind: EntityKind },
    #[error("This room has no active Hipfrog installation (`{0}`). Please reinstall the integration.")]
    UnknownInstallation(String),
    #[error(
        "Sorry, <code>/hipfrog {0}</code> is not supported. Type <code>/hipfrog</code> to see \
         the available commands."
    )]
    UnsupportedCommand(String),
    #[error(
        "Sorry, <code>{subcommand}</code> is not supported for circle {circle_id}. Try \
         <code>/hipfrog circle {circle_id} people</code> or <code>/hipfrog circle {circle_id} roles</code>."
    )]
    UnsupportedSubcommand { subcommand: String, circle_id: String },
}

impl CommandError {
    pub fn not_found(kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self::NotFound { kind, identifier: identifier.into() }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Upstream { .. } => "upstream",
            Self::MissingConfiguration => "missing_configuration",
            Self::MalformedMention { .. } => "malformed_mention",
            Self::UnknownInstallation(_) => "unknown_installation",
            Self::UnsupportedCommand(_) | Self::UnsupportedSubcommand { .. } => "unsupported",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Persistence(_) => "The installation store is temporarily unavailable.",
            Self::Integration(_) => "The chat platform could not be reached. Please retry shortly.",
            Self::Configuration(_) => "An unexpected internal error occurred.",
        }
    }
}
