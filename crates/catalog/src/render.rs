//! Projection of a catalog entry onto display fields.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use shared::domain::{CatalogEntry, MAX_RATING};

pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// strftime template for the last-started date.
    pub date_format: String,
    pub utc_offset: FixedOffset,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarView {
    pub mark: String,
    pub model: String,
    pub rating_text: String,
    pub trips_text: String,
    pub last_started_text: Option<String>,
    pub image: Option<Bitmap>,
    pub favorite_visible: bool,
    pub background: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn wrong_value() -> Self {
        Self::new("Wrong value", "Wrong input")
    }
}

/// Write-only target of rendered views and user notices.
pub trait DisplaySink {
    fn show(&mut self, view: &CarView);
    fn notify(&mut self, notice: &Notice);
}

pub fn render(entry: &CatalogEntry, options: &RenderOptions) -> CarView {
    CarView {
        mark: entry.mark.clone(),
        model: entry.model.clone(),
        rating_text: format!("Rating: {} / {}", format_rating(entry.rating), MAX_RATING),
        trips_text: format!("Number of trips: {}", entry.times_driven),
        last_started_text: entry
            .last_started
            .map(|at| format!("Last time started: {}", format_date(at, options))),
        image: entry.image_data.as_deref().and_then(decode_bitmap),
        favorite_visible: entry.my_choice,
        background: entry.tint_color.map(|tint| {
            let [red, green, blue] = tint.unit_channels();
            Rgba {
                red,
                green,
                blue,
                alpha: 1.0,
            }
        }),
    }
}

/// Whole ratings keep one decimal place ("7.0").
pub fn format_rating(rating: f32) -> String {
    format!("{rating:?}")
}

fn format_date(at: DateTime<Utc>, options: &RenderOptions) -> String {
    let local = at.with_timezone(&options.utc_offset);
    let mut out = String::new();
    if write!(out, "{}", local.format(&options.date_format)).is_err() {
        tracing::debug!(format = %options.date_format, "invalid date template; using ISO date");
        out.clear();
        out.push_str(&local.format("%Y-%m-%d").to_string());
    }
    out
}

fn decode_bitmap(bytes: &[u8]) -> Option<Bitmap> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => {
            let rgba = decoded.to_rgba8();
            Some(Bitmap {
                width: rgba.width(),
                height: rgba.height(),
                rgba: rgba.into_raw(),
            })
        }
        Err(error) => {
            tracing::debug!(%error, "stored image could not be decoded");
            None
        }
    }
}
