use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use hipfrog_core::domain::installation::Installation;
use hipfrog_core::{CommandError, CommandResult, EntityKind, MessageFormat};
use hipfrog_glassfrog::{resolve_circle, resolve_role, GlassfrogApi};

use crate::client::{HipchatApi, RoomMember};
use crate::events::{EventContext, RoomMessageEvent};

const UNFILLED: &str = "(unfilled)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MentionKind {
    Role,
    Circle,
}

impl MentionKind {
    pub fn entity(self) -> EntityKind {
        match self {
            Self::Role => EntityKind::Role,
            Self::Circle => EntityKind::Circle,
        }
    }

    fn pattern(self) -> Option<&'static Regex> {
        static ROLE: OnceLock<Option<Regex>> = OnceLock::new();
        static CIRCLE: OnceLock<Option<Regex>> = OnceLock::new();
        let (cell, source) = match self {
            Self::Role => (&ROLE, r"(?i)@role\s+(\S+)"),
            Self::Circle => (&CIRCLE, r"(?i)@circle\s+(\S+)"),
        };
        cell.get_or_init(|| Regex::new(source).ok()).as_ref()
    }
}

/// The identifier following `@role` / `@circle`, without trailing sentence punctuation.
pub fn extract_identifier(kind: MentionKind, text: &str) -> Option<String> {
    let captured = kind.pattern()?.captures(text)?.get(1)?.as_str();
    let identifier = captured.trim_end_matches(|ch: char| matches!(ch, '.' | ',' | ';' | '!' | '?'));
    (!identifier.is_empty()).then(|| identifier.to_string())
}

/// Maps each member to `@mention_name` when someone in the room has exactly
/// that name, keeping member order.
pub fn mention_tags(members: &[String], roster: &[RoomMember]) -> Vec<String> {
    members
        .iter()
        .map(|name| {
            roster
                .iter()
                .find(|member| &member.name == name)
                .map(|member| format!("@{}", member.mention_name))
                .unwrap_or_else(|| name.clone())
        })
        .collect()
}

/// Re-broadcasts `@role` / `@circle` messages with the members mentioned.
pub struct MentionDispatcher<G, H> {
    glassfrog: G,
    hipchat: H,
}

impl<G, H> MentionDispatcher<G, H>
where
    G: GlassfrogApi,
    H: HipchatApi,
{
    pub fn new(glassfrog: G, hipchat: H) -> Self {
        Self { glassfrog, hipchat }
    }

    pub async fn route(
        &self,
        kind: MentionKind,
        installation: &Installation,
        event: &RoomMessageEvent,
        ctx: &EventContext,
    ) -> CommandResult {
        let result = match installation.glassfrog_token() {
            Some(token) => self.broadcast(kind, token, installation, event, ctx).await,
            None => Err(CommandError::MissingConfiguration),
        };

        info!(
            event_name = "hipfrog.mention.dispatched",
            correlation_id = %ctx.correlation_id,
            oauth_id = %installation.oauth_id,
            kind = kind.entity().as_str(),
            outcome = match &result {
                Ok(_) => "success",
                Err(error) => error.error_class(),
            },
            "dispatched mention"
        );

        match result {
            Ok(message) => CommandResult::success(message).with_format(MessageFormat::Text),
            Err(error) => CommandResult::from(error),
        }
    }

    async fn broadcast(
        &self,
        kind: MentionKind,
        token: &str,
        installation: &Installation,
        event: &RoomMessageEvent,
        ctx: &EventContext,
    ) -> Result<String, CommandError> {
        let identifier = extract_identifier(kind, event.text())
            .ok_or(CommandError::MalformedMention { kind: kind.entity() })?;

        let (label, members) = match kind {
            MentionKind::Role => {
                let role_id = resolve_role(&self.glassfrog, token, &identifier).await?;
                let detail = self.glassfrog.role(token, &role_id).await?;
                let label = format!("{} (/hipfrog role {role_id})", detail.role.name);
                (label, detail.people.into_iter().map(|person| person.name).collect::<Vec<_>>())
            }
            MentionKind::Circle => {
                let circle_id = resolve_circle(&self.glassfrog, token, &identifier).await?;
                let people = self.glassfrog.circle_people(token, &circle_id).await?;
                let label = format!("Circle {circle_id} (/hipfrog circle {circle_id})");
                (label, people.into_iter().map(|person| person.name).collect::<Vec<_>>())
            }
        };

        let mentions = if members.is_empty() {
            UNFILLED.to_string()
        } else {
            let roster = match self.hipchat.room_members(installation).await {
                Ok(roster) => roster,
                Err(error) => {
                    warn!(
                        event_name = "hipfrog.mention.roster_unavailable",
                        correlation_id = %ctx.correlation_id,
                        oauth_id = %installation.oauth_id,
                        error = %error,
                        "room roster unavailable, mentioning by name"
                    );
                    Vec::new()
                }
            };
            mention_tags(&members, &roster).join(", ")
        };

        Ok(format!(
            "@{} said: {} /cc {label} - {mentions}",
            event.sender_mention(),
            event.text()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_identifier, mention_tags, MentionKind};
    use crate::client::RoomMember;

    fn member(name: &str, mention_name: &str) -> RoomMember {
        RoomMember { id: None, name: name.to_string(), mention_name: mention_name.to_string() }
    }

    #[test]
    fn mention_patterns_compile() {
        for kind in [MentionKind::Role, MentionKind::Circle] {
            assert!(kind.pattern().is_some(), "{kind:?} pattern must compile");
        }
        assert_eq!(extract_identifier(MentionKind::Role, "@ROLE 12"), Some("12".to_string()));
    }

    #[test]
    fn extracts_identifier_after_marker() {
        assert_eq!(
            extract_identifier(MentionKind::Role, "can @role 1234 look at this?"),
            Some("1234".to_string())
        );
        assert_eq!(
            extract_identifier(MentionKind::Circle, "ping @Circle sales."),
            Some("sales".to_string())
        );
        assert_eq!(
            extract_identifier(MentionKind::Role, "@role ops:secretary, please"),
            Some("ops:secretary".to_string())
        );
    }

    #[test]
    fn missing_identifier_is_none() {
        assert_eq!(extract_identifier(MentionKind::Role, "hey @role"), None);
        assert_eq!(extract_identifier(MentionKind::Circle, "hey @role 12"), None);
        assert_eq!(extract_identifier(MentionKind::Role, "@role ?!"), None);
    }

    #[test]
    fn roster_match_is_exact_and_keeps_order() {
        let roster = vec![member("Grace Hopper", "grace"), member("Ada", "ada")];
        let members =
            vec!["Ada".to_string(), "Linus".to_string(), "grace hopper".to_string(), "Grace Hopper".to_string()];

        assert_eq!(
            mention_tags(&members, &roster),
            vec!["@ada".to_string(), "Linus".to_string(), "grace hopper".to_string(), "@grace".to_string()]
        );
    }
}
