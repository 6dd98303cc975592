use serde::Deserialize;

/// Body of a `room_message` webhook call.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RoomMessageEvent {
    #[serde(default)]
    pub event: Option<String>,
    pub oauth_client_id: String,
    #[serde(default)]
    pub webhook_id: Option<i64>,
    pub item: EventItem,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventItem {
    pub message: RoomMessage,
    #[serde(default)]
    pub room: Option<EventRoom>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RoomMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub from: Option<MessageFrom>,
}

/// Users appear as objects; integrations post with a plain label.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageFrom {
    User(MessageSender),
    Label(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageSender {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mention_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventRoom {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl RoomMessageEvent {
    pub fn text(&self) -> &str {
        &self.item.message.message
    }

    /// The sender's mention name, falling back to the display name.
    pub fn sender_mention(&self) -> &str {
        self.item
            .message
            .from
            .as_ref()
            .and_then(|from| match from {
                MessageFrom::User(user) => user.mention_name.as_deref().or(user.name.as_deref()),
                MessageFrom::Label(label) => Some(label.as_str()),
            })
            .unwrap_or("someone")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}
