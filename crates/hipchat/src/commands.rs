use tracing::info;

use hipfrog_core::domain::installation::Installation;
use hipfrog_core::{CommandError, CommandResult};
use hipfrog_glassfrog::format::{self, AppLinks};
use hipfrog_glassfrog::{build_circle_tree, resolve_circle, resolve_role, GlassfrogApi};

use crate::events::EventContext;
use crate::messages;

/// A parsed `/hipfrog` invocation. Identifiers are kept as typed (lower-cased).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HipfrogCommand {
    Help,
    Circles,
    Circle { identifier: String },
    CircleMembers { identifier: String },
    CircleRoles { identifier: String },
    CircleSubcommand { identifier: String, subcommand: String },
    Role { identifier: String },
    RoleUsage,
    Unknown { token: String },
}

impl HipfrogCommand {
    /// Parses the full message text; the first token is the command itself.
    pub fn parse(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        match tokens.as_slice() {
            [] | [_] => Self::Help,
            [_, "circles" | "circle"] => Self::Circles,
            [_, "circles" | "circle", identifier] => {
                Self::Circle { identifier: identifier.to_string() }
            }
            [_, "circles" | "circle", identifier, "people" | "members", ..] => {
                Self::CircleMembers { identifier: identifier.to_string() }
            }
            [_, "circles" | "circle", identifier, "roles", ..] => {
                Self::CircleRoles { identifier: identifier.to_string() }
            }
            [_, "circles" | "circle", identifier, subcommand, ..] => Self::CircleSubcommand {
                identifier: identifier.to_string(),
                subcommand: subcommand.to_string(),
            },
            [_, "roles" | "role"] => Self::RoleUsage,
            [_, "roles" | "role", identifier, ..] => {
                Self::Role { identifier: identifier.to_string() }
            }
            [_, token, ..] => Self::Unknown { token: token.to_string() },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Circles => "circles",
            Self::Circle { .. } => "circle",
            Self::CircleMembers { .. } => "circle_members",
            Self::CircleRoles { .. } => "circle_roles",
            Self::CircleSubcommand { .. } => "circle_subcommand",
            Self::Role { .. } => "role",
            Self::RoleUsage => "role_usage",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Routes `/hipfrog` commands to GlassFrog lookups and renders the answer.
pub struct CommandDispatcher<G> {
    api: G,
    links: AppLinks,
}

impl<G> CommandDispatcher<G>
where
    G: GlassfrogApi,
{
    pub fn new(api: G, links: AppLinks) -> Self {
        Self { api, links }
    }

    pub fn api(&self) -> &G {
        &self.api
    }

    pub async fn route(
        &self,
        installation: &Installation,
        text: &str,
        ctx: &EventContext,
    ) -> CommandResult {
        let command = HipfrogCommand::parse(text);
        let result = match installation.glassfrog_token() {
            Some(token) => self.execute(token, &command).await,
            None => Err(CommandError::MissingConfiguration),
        };

        info!(
            event_name = "hipfrog.command.dispatched",
            correlation_id = %ctx.correlation_id,
            oauth_id = %installation.oauth_id,
            command = command.name(),
            outcome = match &result {
                Ok(_) => "success",
                Err(error) => error.error_class(),
            },
            "dispatched hipfrog command"
        );

        CommandResult::from(result)
    }

    async fn execute(&self, token: &str, command: &HipfrogCommand) -> Result<String, CommandError> {
        match command {
            HipfrogCommand::Help => Ok(messages::HELP.to_string()),
            HipfrogCommand::Circles => {
                let listing = self.api.circles(token).await?;
                Ok(format::circle_listing(&self.links, &build_circle_tree(&listing)))
            }
            HipfrogCommand::Circle { identifier } => {
                let circle_id = resolve_circle(&self.api, token, identifier).await?;
                let detail = self.api.circle(token, &circle_id).await?;
                Ok(format::circle_detail(&self.links, &circle_id, &detail))
            }
            HipfrogCommand::CircleMembers { identifier } => {
                let circle_id = resolve_circle(&self.api, token, identifier).await?;
                let people = self.api.circle_people(token, &circle_id).await?;
                Ok(format::circle_members(&self.links, &people))
            }
            HipfrogCommand::CircleRoles { identifier } => {
                let circle_id = resolve_circle(&self.api, token, identifier).await?;
                let roles = self.api.circle_roles(token, &circle_id).await?;
                Ok(format::circle_roles(&self.links, &roles))
            }
            HipfrogCommand::CircleSubcommand { identifier, subcommand } => {
                let circle_id = resolve_circle(&self.api, token, identifier).await?;
                Err(CommandError::UnsupportedSubcommand {
                    subcommand: subcommand.clone(),
                    circle_id,
                })
            }
            HipfrogCommand::Role { identifier } => {
                let role_id = resolve_role(&self.api, token, identifier).await?;
                let detail = self.api.role(token, &role_id).await?;
                Ok(format::role_detail(&self.links, &role_id, &detail))
            }
            HipfrogCommand::RoleUsage => Ok(messages::ROLE_USAGE.to_string()),
            HipfrogCommand::Unknown { token: unknown } => {
                Err(CommandError::UnsupportedCommand(unknown.clone()))
            }
        }
    }
}
