use serde::{Deserialize, Serialize};

/// User actions delivered to the selection controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CarCommand {
    Select { mark: String },
    StartEngine,
    /// Confirmed free-text rating entry.
    Rate { input: String },
    CancelRating,
    ToggleFavorite,
}

impl CarCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::StartEngine => "start_engine",
            Self::Rate { .. } => "rate",
            Self::CancelRating => "cancel_rating",
            Self::ToggleFavorite => "toggle_favorite",
        }
    }
}
