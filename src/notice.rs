//! Transient user-facing notices (the banner messages shown above any view).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(text: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            text: text.into(),
            level,
            created_at: Utc::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, NoticeLevel::Info)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, NoticeLevel::Success)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, NoticeLevel::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, NoticeLevel::Error)
    }
}
