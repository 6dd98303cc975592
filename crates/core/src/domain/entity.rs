use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of organizational entity a chat command can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Circle,
    Role,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Role => "role",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Circle => "Circle",
            Self::Role => "Role",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
