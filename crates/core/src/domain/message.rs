use serde::{Deserialize, Serialize};

use crate::errors::CommandError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageColor {
    #[serde(rename = "green")]
    Success,
    #[serde(rename = "red")]
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFormat {
    Html,
    Text,
}

/// Uniform output of every dispatch path; also the body of room notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub color: MessageColor,
    pub message: String,
    pub notify: bool,
    pub message_format: MessageFormat,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            color: MessageColor::Success,
            message: message.into(),
            notify: false,
            message_format: MessageFormat::Html,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            color: MessageColor::Error,
            message: message.into(),
            notify: false,
            message_format: MessageFormat::Html,
        }
    }

    pub fn with_format(mut self, message_format: MessageFormat) -> Self {
        self.message_format = message_format;
        self
    }

    pub fn is_success(&self) -> bool {
        self.color == MessageColor::Success
    }
}

impl From<Result<String, CommandError>> for CommandResult {
    fn from(outcome: Result<String, CommandError>) -> Self {
        match outcome {
            Ok(message) => Self::success(message),
            Err(error) => Self::from(error),
        }
    }
}

impl From<CommandError> for CommandResult {
    fn from(error: CommandError) -> Self {
        Self::error(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CommandResult, MessageFormat};
    use crate::errors::CommandError;

    #[test]
    fn serializes_to_notification_shape() {
        let value = serde_json::to_value(CommandResult::success("hello")).expect("serialize");

        assert_eq!(
            value,
            json!({
                "color": "green",
                "message": "hello",
                "notify": false,
                "message_format": "html"
            })
        );
    }

    #[test]
    fn plain_text_error_uses_red() {
        let value =
            serde_json::to_value(CommandResult::error("boom").with_format(MessageFormat::Text))
                .expect("serialize");

        assert_eq!(value["color"], "red");
        assert_eq!(value["message_format"], "text");
    }

    #[test]
    fn command_errors_become_error_results() {
        let result = CommandResult::from(Err::<String, _>(CommandError::MissingConfiguration));

        assert!(!result.is_success());
        assert!(result.message.contains("Glassfrog Token"));
    }
}
