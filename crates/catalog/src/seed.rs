//! One-time import of the bundled car dataset.
//!
//! A bundle is a directory holding `data.json` (an array of car descriptors)
//! and an `images/` directory the descriptors refer to by name.

use std::{
    collections::HashSet,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{
    domain::{NewCatalogEntry, TintColor},
    error::CatalogError,
};
use tracing::{info, warn};

use crate::store::{persistence, CatalogStore};

const DATA_FILE: &str = "data.json";
const IMAGE_DIR: &str = "images";
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadySeeded,
    Seeded { inserted: usize, skipped: usize },
    /// The bundle could not be read; the installation flag stays unset.
    Skipped { reason: String },
}

impl SeedOutcome {
    pub fn seeded(&self) -> bool {
        matches!(self, Self::Seeded { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SeedBundle {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedDescriptor {
    mark: String,
    model: String,
    #[serde(default)]
    rating: f32,
    #[serde(default)]
    last_started: Option<DateTime<Utc>>,
    #[serde(default)]
    times_driven: i64,
    #[serde(default)]
    my_choice: bool,
    #[serde(default)]
    image_name: Option<String>,
    #[serde(default)]
    tint_color: Option<ColorDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ColorDescriptor {
    red: Option<f32>,
    green: Option<f32>,
    blue: Option<f32>,
}

impl ColorDescriptor {
    fn to_tint(&self) -> Option<TintColor> {
        Some(TintColor::new(self.red?, self.green?, self.blue?))
    }
}

impl SeedBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    /// Reads every usable descriptor. Returns the entries and the number of
    /// descriptors that were skipped.
    pub fn load_entries(&self) -> Result<(Vec<NewCatalogEntry>, usize), CatalogError> {
        let path = self.data_path();
        let raw = fs::read(&path)
            .map_err(|err| CatalogError::Resource(format!("{}: {err}", path.display())))?;
        let items: Vec<serde_json::Value> = serde_json::from_slice(&raw)
            .map_err(|err| CatalogError::Resource(format!("{}: {err}", path.display())))?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(items.len());
        let mut skipped = 0;
        for (index, item) in items.into_iter().enumerate() {
            let descriptor = match serde_json::from_value::<SeedDescriptor>(item) {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    warn!(index, %error, "skipping malformed seed descriptor");
                    skipped += 1;
                    continue;
                }
            };
            if !seen.insert(descriptor.mark.clone()) {
                warn!(index, mark = %descriptor.mark, "skipping duplicate seed mark");
                skipped += 1;
                continue;
            }
            entries.push(self.build_entry(descriptor));
        }
        Ok((entries, skipped))
    }

    fn build_entry(&self, descriptor: SeedDescriptor) -> NewCatalogEntry {
        let image_data = descriptor
            .image_name
            .as_deref()
            .and_then(|name| self.load_image(name));
        let tint_color = descriptor.tint_color.as_ref().and_then(|color| {
            let tint = color.to_tint();
            if tint.is_none() {
                warn!(mark = %descriptor.mark, "seed colour is missing a channel");
            }
            tint
        });

        NewCatalogEntry {
            mark: descriptor.mark,
            model: descriptor.model,
            rating: descriptor.rating,
            last_started: descriptor.last_started,
            times_driven: descriptor.times_driven.max(0),
            my_choice: descriptor.my_choice,
            image_data,
            tint_color,
        }
    }

    fn image_path(&self, name: &str) -> Option<PathBuf> {
        let dir = self.root.join(IMAGE_DIR);
        let exact = dir.join(name);
        if Path::new(name).extension().is_some() && exact.is_file() {
            return Some(exact);
        }
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    /// Loads a named image and re-encodes it as PNG.
    fn load_image(&self, name: &str) -> Option<Vec<u8>> {
        let Some(path) = self.image_path(name) else {
            warn!(image = name, "seed image not found");
            return None;
        };
        let decoded = match fs::read(&path)
            .map_err(|err| err.to_string())
            .and_then(|bytes| image::load_from_memory(&bytes).map_err(|err| err.to_string()))
        {
            Ok(decoded) => decoded,
            Err(error) => {
                warn!(image = name, path = %path.display(), %error, "seed image unreadable");
                return None;
            }
        };

        let mut png = Vec::new();
        let encoded = decoded.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png);
        if let Err(error) = encoded {
            warn!(image = name, %error, "failed to encode seed image as png");
            return None;
        }
        Some(png)
    }
}

/// Imports the bundle unless the installation flag says it already happened.
///
/// Store failures are returned; bundle failures are logged and reported as
/// [`SeedOutcome::Skipped`].
pub async fn seed_if_empty<S>(
    store: &S,
    bundle: &SeedBundle,
) -> Result<SeedOutcome, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    if store.is_data_loaded().await.map_err(persistence)? {
        return Ok(SeedOutcome::AlreadySeeded);
    }
    // Entries without the flag: a previous import stopped before the flag write.
    if store.count_entries().await.map_err(persistence)? > 0 {
        warn!("catalog already holds entries; marking data as loaded");
        store.set_data_loaded(true).await.map_err(persistence)?;
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let (entries, skipped) = match bundle.load_entries() {
        Ok(loaded) => loaded,
        Err(error) => {
            warn!(
                bundle = %bundle.root().display(),
                %error,
                "seed bundle unavailable; continuing with empty catalog"
            );
            return Ok(SeedOutcome::Skipped {
                reason: error.to_string(),
            });
        }
    };

    let ids = store.insert_entries(&entries).await.map_err(persistence)?;
    store.set_data_loaded(true).await.map_err(persistence)?;
    info!(inserted = ids.len(), skipped, "seeded car catalog");
    Ok(SeedOutcome::Seeded {
        inserted: ids.len(),
        skipped,
    })
}
