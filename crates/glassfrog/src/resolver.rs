use hipfrog_core::{CommandError, EntityKind};

use crate::client::GlassfrogApi;

fn is_numeric(identifier: &str) -> bool {
    identifier.parse::<i64>().is_ok()
}

fn find_by_name<'a, I>(candidates: I, identifier: &str) -> Option<i64>
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let wanted = identifier.to_lowercase();
    candidates.into_iter().find(|(_, name)| name.to_lowercase() == wanted).map(|(id, _)| id)
}

/// Turns a circle id or circle name into a circle id.
///
/// Numeric identifiers are returned as given without contacting GlassFrog.
pub async fn resolve_circle<G>(api: &G, token: &str, identifier: &str) -> Result<String, CommandError>
where
    G: GlassfrogApi + ?Sized,
{
    if is_numeric(identifier) {
        return Ok(identifier.to_string());
    }

    let listing = api.circles(token).await?;
    find_by_name(
        listing.circles.iter().map(|circle| (circle.id, circle.name.as_str())),
        identifier,
    )
    .map(|id| id.to_string())
    .ok_or_else(|| CommandError::not_found(EntityKind::Circle, identifier))
}

/// Turns a role id, role name, or `circle:role` pair into a role id.
///
/// With a circle part the name is only matched against that circle's roles.
pub async fn resolve_role<G>(api: &G, token: &str, identifier: &str) -> Result<String, CommandError>
where
    G: GlassfrogApi + ?Sized,
{
    if is_numeric(identifier) {
        return Ok(identifier.to_string());
    }

    let (scope, role_name) = match identifier.split_once(':') {
        Some((circle, role)) if !circle.is_empty() => (Some(circle), role),
        Some((_, role)) => (None, role),
        None => (None, identifier),
    };

    let roles = match scope {
        Some(circle) => {
            let circle_id = resolve_circle(api, token, circle).await?;
            api.circle_roles(token, &circle_id).await?
        }
        None => api.roles(token).await?,
    };

    find_by_name(roles.iter().map(|role| (role.id, role.name.as_str())), role_name)
        .map(|id| id.to_string())
        .ok_or_else(|| CommandError::not_found(EntityKind::Role, role_name))
}
