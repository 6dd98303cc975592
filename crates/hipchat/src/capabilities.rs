//! The add-on descriptor served at `/capabilities.json`.

use serde::Serialize;

use hipfrog_core::config::{HipchatConfig, ServerConfig};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub name: String,
    pub key: String,
    pub description: String,
    pub links: DescriptorLinks,
    pub vendor: Vendor,
    pub capabilities: DescriptorCapabilities,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DescriptorLinks {
    pub homepage: String,
    #[serde(rename = "self")]
    pub self_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Vendor {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorCapabilities {
    pub hipchat_api_consumer: ApiConsumer,
    pub installable: Installable,
    pub configurable: Configurable,
    pub webhook: Vec<Webhook>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConsumer {
    pub scopes: Vec<String>,
    pub from_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installable {
    pub allow_global: bool,
    pub allow_room: bool,
    pub callback_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Configurable {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Webhook {
    pub url: String,
    pub pattern: String,
    pub event: String,
    pub authentication: String,
    pub name: String,
}

/// `(path, pattern, name)` of each room_message hook.
const WEBHOOKS: [(&str, &str, &str); 3] = [
    ("/hipfrog", "^/hipfrog", "hipfrog"),
    ("/atrole", "@role", "atrole"),
    ("/atcircle", "@circle", "atcircle"),
];

impl Descriptor {
    pub fn new(server: &ServerConfig, hipchat: &HipchatConfig) -> Self {
        let webhook = WEBHOOKS
            .iter()
            .map(|(path, pattern, name)| Webhook {
                url: server.public_link(path),
                pattern: (*pattern).to_string(),
                event: "room_message".to_string(),
                authentication: "none".to_string(),
                name: (*name).to_string(),
            })
            .collect();

        Self {
            name: hipchat.addon_name.clone(),
            key: hipchat.addon_key.clone(),
            description: "Look up GlassFrog circles and roles and mention their members from the room."
                .to_string(),
            links: DescriptorLinks {
                homepage: server.public_link("/"),
                self_url: server.public_link("/capabilities.json"),
            },
            vendor: Vendor { name: hipchat.addon_name.clone(), url: server.public_link("/") },
            capabilities: DescriptorCapabilities {
                hipchat_api_consumer: ApiConsumer {
                    scopes: crate::client::TOKEN_SCOPES.split(' ').map(str::to_string).collect(),
                    from_name: hipchat.addon_name.clone(),
                },
                installable: Installable {
                    allow_global: false,
                    allow_room: true,
                    callback_url: server.public_link("/installed"),
                },
                configurable: Configurable { url: server.public_link("/configure.html") },
                webhook,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use hipfrog_core::config::AppConfig;
    use serde_json::json;

    use super::Descriptor;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.public_url = "https://hipfrog.example/".to_string();
        config
    }

    #[test]
    fn descriptor_points_callbacks_at_public_url() {
        let config = config();
        let value = serde_json::to_value(Descriptor::new(&config.server, &config.hipchat))
            .expect("serialize descriptor");

        assert_eq!(value["key"], "hipfrog");
        assert_eq!(value["links"]["self"], "https://hipfrog.example/capabilities.json");
        assert_eq!(
            value["capabilities"]["hipchatApiConsumer"]["scopes"],
            json!(["send_notification", "view_room"])
        );
        assert_eq!(value["capabilities"]["installable"]["allowGlobal"], false);
        assert_eq!(value["capabilities"]["installable"]["allowRoom"], true);
        assert_eq!(
            value["capabilities"]["installable"]["callbackUrl"],
            "https://hipfrog.example/installed"
        );
        assert_eq!(
            value["capabilities"]["configurable"]["url"],
            "https://hipfrog.example/configure.html"
        );
    }

    #[test]
    fn registers_three_room_message_hooks() {
        let config = config();
        let descriptor = Descriptor::new(&config.server, &config.hipchat);
        let hooks: Vec<(&str, &str)> = descriptor
            .capabilities
            .webhook
            .iter()
            .map(|hook| (hook.url.as_str(), hook.pattern.as_str()))
            .collect();

        assert_eq!(
            hooks,
            vec![
                ("https://hipfrog.example/hipfrog", "^/hipfrog"),
                ("https://hipfrog.example/atrole", "@role"),
                ("https://hipfrog.example/atcircle", "@circle"),
            ]
        );
        assert!(descriptor.capabilities.webhook.iter().all(|hook| hook.event == "room_message"));
    }
}
