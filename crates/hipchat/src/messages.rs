//! Fixed texts posted to rooms and shown on the configuration page.

pub const HELP: &str = "<strong>Hipfrog</strong> brings your GlassFrog organization into this room.<br/>\
<ul>\
<li><code>/hipfrog circles</code> - list the circles in your organization</li>\
<li><code>/hipfrog circle [circle]</code> - show the purpose, domains and parent of a circle</li>\
<li><code>/hipfrog circle [circle] people</code> - list the members of a circle</li>\
<li><code>/hipfrog circle [circle] roles</code> - list the roles and subcircles of a circle</li>\
<li><code>/hipfrog role [role]</code> - show a role, or <code>/hipfrog role [circle]:[role]</code> to look it up within one circle</li>\
<li><code>@role [role]</code> or <code>@circle [circle]</code> anywhere in a message - notify everyone in it</li>\
</ul>\
Circles and roles can be given by ID or by name.";

pub const ROLE_USAGE: &str = "Type <code>/hipfrog role [role]</code> with a role ID or name to see a role. \
Use <code>/hipfrog circle [circle] roles</code> to find the roles of a circle.";

pub const INSTALLED: &str = "Hipfrog was installed in this room. Set your GlassFrog API token on the \
integration's configuration page to get started.";

pub const CONFIGURED: &str =
    "The GlassFrog token was saved. Type <code>/hipfrog</code> to see what Hipfrog can do.";

pub const CONFIGURED_FLASH: &str = "The GlassFrog token works and has been saved.";

pub fn token_test_failed(status: Option<u16>, message: &str) -> String {
    let code = status.map(|status| status.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "Encountered Error {code} when testing the Glassfrog Token. Message given: '{message}'."
    )
}
