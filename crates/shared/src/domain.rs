use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(CarId);

pub const MAX_RATING: f32 = 10.0;

/// Colour stored on the 0-255 scale of the seed dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TintColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl TintColor {
    pub fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// Channels scaled to 0-1, clamped.
    pub fn unit_channels(&self) -> [f32; 3] {
        [self.red, self.green, self.blue].map(|c| (c / 255.0).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CarId,
    pub mark: String,
    pub model: String,
    pub rating: f32,
    pub last_started: Option<DateTime<Utc>>,
    pub times_driven: i64,
    pub my_choice: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tint_color: Option<TintColor>,
}

/// An entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub mark: String,
    pub model: String,
    pub rating: f32,
    pub last_started: Option<DateTime<Utc>>,
    pub times_driven: i64,
    pub my_choice: bool,
    pub image_data: Option<Vec<u8>>,
    pub tint_color: Option<TintColor>,
}

impl NewCatalogEntry {
    pub fn new(mark: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            mark: mark.into(),
            model: model.into(),
            rating: 0.0,
            last_started: None,
            times_driven: 0,
            my_choice: false,
            image_data: None,
            tint_color: None,
        }
    }

    pub fn into_entry(self, id: CarId) -> CatalogEntry {
        CatalogEntry {
            id,
            mark: self.mark,
            model: self.model,
            rating: self.rating,
            last_started: self.last_started,
            times_driven: self.times_driven,
            my_choice: self.my_choice,
            image_data: self.image_data,
            tint_color: self.tint_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    Idle,
    Selected,
}
