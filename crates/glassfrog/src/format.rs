//! Chat renderings of GlassFrog records.
//!
//! Every layout is HTML for the chat platform's rich message format. Optional
//! fields are left out entirely when absent and lines are joined with `<br/>`.

use std::fmt::Write;

use crate::tree::CircleNode;
use crate::types::{CircleDetail, PersonSummary, RoleDetail, RoleRecord};

const LINE_BREAK: &str = "<br/>";

/// Builds links into the GlassFrog web app.
#[derive(Clone, Debug)]
pub struct AppLinks {
    base_url: String,
}

impl AppLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn circle(&self, id: impl std::fmt::Display) -> String {
        format!("{}/circles/{id}", self.base_url)
    }

    pub fn role(&self, id: impl std::fmt::Display) -> String {
        format!("{}/roles/{id}", self.base_url)
    }

    pub fn person(&self, id: impl std::fmt::Display) -> String {
        format!("{}/people/{id}", self.base_url)
    }
}

impl Default for AppLinks {
    fn default() -> Self {
        Self::new("https://app.glassfrog.com")
    }
}

fn labelled(label: &str, value: &str) -> String {
    format!("<strong>{label}:</strong> {value}")
}

fn domains_line(domains: &[String]) -> Option<String> {
    match domains.len() {
        0 => None,
        1 => Some(labelled("Domain", &domains[0])),
        _ => Some(labelled("Domains", &domains.join(", "))),
    }
}

/// One entry renders inline after the singular label, several as a bulleted list.
fn list_line(singular: &str, plural: &str, entries: &[String]) -> Option<String> {
    match entries {
        [] => None,
        [only] => Some(labelled(singular, only)),
        many => {
            let items: String = many.iter().map(|entry| format!("<li>{entry}</li>")).collect();
            Some(format!("<strong>{plural}:</strong><ul>{items}</ul>"))
        }
    }
}

pub fn circle_detail(links: &AppLinks, circle_id: &str, detail: &CircleDetail) -> String {
    let mut lines = vec![format!(
        "<strong><a href=\"{}\">Circle - {}</a></strong><br/>",
        links.circle(circle_id),
        detail.circle.name
    )];

    if let Some(purpose) = detail.purpose() {
        lines.push(labelled("Purpose", purpose));
    }
    if let Some(strategy) = detail.circle.strategy.as_deref() {
        lines.push(labelled("Strategy", strategy));
    }
    lines.extend(domains_line(&detail.domains));
    if let Some(parent) = detail.parent_circle() {
        lines.push(labelled("Parent circle", &format!("<code>/hipfrog circle {parent}</code>")));
    }
    lines.push(format!(
        "Type <code>/hipfrog circle {circle_id} people</code> to see its members or \
         <code>/hipfrog circle {circle_id} roles</code> to see its roles and subcircles."
    ));

    lines.join(LINE_BREAK)
}

pub fn role_detail(links: &AppLinks, role_id: &str, detail: &RoleDetail) -> String {
    let mut lines = vec![format!(
        "<strong><a href=\"{}\">Role - {}</a></strong><br/>",
        links.role(role_id),
        detail.role.name
    )];

    if let Some(purpose) = detail.role.purpose.as_deref() {
        lines.push(labelled("Purpose", purpose));
    }
    lines.extend(domains_line(&detail.domains));
    if let Some(circle) = &detail.circle {
        lines.push(labelled(
            "Circle",
            &format!(
                "<code>/hipfrog circle {0}</code> - <a href=\"{1}\">{2}</a>",
                circle.id,
                links.circle(circle.id),
                circle.name
            ),
        ));
    }
    lines.extend(list_line("Accountability", "Accountabilities", &detail.accountabilities));

    let people: Vec<String> =
        detail.people.iter().map(|person| person_entry(links, person)).collect();
    lines.extend(list_line("Person", "People", &people));

    lines.push(format!(
        "Type <code>@role {role_id}</code> in a message to notify everyone filling this role."
    ));

    lines.join(LINE_BREAK)
}

fn person_entry(links: &AppLinks, person: &PersonSummary) -> String {
    format!("<code>{0}</code> - <a href=\"{1}\">{2}</a>", person.id, links.person(person.id), person.name)
}

pub fn circle_listing(links: &AppLinks, roots: &[CircleNode]) -> String {
    let mut message = String::from("The following circles are in your organization:<br /><ul>");
    write_circle_nodes(links, roots, &mut message);
    message.push_str("</ul>");
    message.push_str(
        "<br/>Type <code>/hipfrog circle [circle ID]</code> to see the details of a circle.",
    );
    message
}

fn write_circle_nodes(links: &AppLinks, nodes: &[CircleNode], out: &mut String) {
    for node in nodes {
        let _ = write!(
            out,
            "<li><a href=\"{}\">{}</a> - <code>{}</code>",
            links.circle(node.id),
            node.name,
            node.id
        );
        if !node.children.is_empty() {
            out.push_str("<ul>");
            write_circle_nodes(links, &node.children, out);
            out.push_str("</ul>");
        }
        out.push_str("</li>");
    }
}

pub fn circle_members(links: &AppLinks, people: &[PersonSummary]) -> String {
    let mut sorted: Vec<&PersonSummary> = people.iter().collect();
    sorted.sort_by(|left, right| left.name.cmp(&right.name));

    let items: String =
        sorted.into_iter().map(|person| format!("<li>{}</li>", person_entry(links, person))).collect();
    format!("The following people are in this circle:<br /><ul>{items}</ul>")
}

pub fn circle_roles(links: &AppLinks, roles: &[RoleRecord]) -> String {
    let mut sorted: Vec<&RoleRecord> = roles.iter().collect();
    sorted.sort_by(|left, right| left.name.cmp(&right.name));

    let items: String = sorted
        .into_iter()
        .map(|role| {
            let shortcut = match role.links.supporting_circle {
                Some(circle_id) => format!("<code>/hipfrog circle {circle_id}</code>"),
                None => format!("<code>/hipfrog role {}</code>", role.id),
            };
            format!("<li>{shortcut} - <a href=\"{}\">{}</a></li>", links.role(role.id), role.name)
        })
        .collect();

    format!(
        "The following roles and subcircles are in this circle:<br /><ul>{items}</ul>\
         <br/>Type <code>/hipfrog role [role ID]</code> to see the details of a role."
    )
}
