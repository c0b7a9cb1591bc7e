//! The selection controller: applies user commands to the active car and
//! keeps the display in step with the store.

use shared::{
    domain::{CatalogEntry, SelectionState, MAX_RATING},
    error::CatalogError,
    protocol::CarCommand,
};
use tracing::{debug, error, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    render::{render, DisplaySink, Notice, RenderOptions},
    seed::{seed_if_empty, SeedBundle, SeedOutcome},
    store::{persistence, CatalogStore},
};

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Rendered,
    Cancelled,
    /// The command failed; the screen still shows the previous state.
    Rejected(CatalogError),
}

#[derive(Debug)]
pub struct StartupReport {
    pub seed: Result<SeedOutcome, CatalogError>,
    pub selected: Option<String>,
}

pub struct SelectionController<S, D> {
    store: S,
    sink: D,
    clock: Box<dyn Clock>,
    options: RenderOptions,
    selection: Option<CatalogEntry>,
}

impl<S: CatalogStore, D: DisplaySink> SelectionController<S, D> {
    pub fn new(store: S, sink: D) -> Self {
        Self {
            store,
            sink,
            clock: Box::new(SystemClock),
            options: RenderOptions::default(),
            selection: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn selection(&self) -> Option<&CatalogEntry> {
        self.selection.as_ref()
    }

    pub fn state(&self) -> SelectionState {
        if self.selection.is_some() {
            SelectionState::Selected
        } else {
            SelectionState::Idle
        }
    }

    /// Seeds the store if needed, then selects `initial_mark` or the first
    /// known mark.
    pub async fn startup(
        &mut self,
        bundle: &SeedBundle,
        initial_mark: Option<&str>,
    ) -> StartupReport {
        let seed = seed_if_empty(&self.store, bundle).await;
        if let Err(err) = &seed {
            error!(error = %err, "catalog seeding failed");
        }

        let mark = match initial_mark {
            Some(mark) => Some(mark.to_string()),
            None => match self.available_marks().await {
                Ok(marks) => marks.into_iter().next(),
                Err(err) => {
                    error!(error = %err, "failed to list catalog marks");
                    None
                }
            },
        };

        let selected = match mark {
            Some(mark) => match self.select_by_key(&mark).await {
                Ok(()) => Some(mark),
                Err(err) => {
                    warn!(%mark, error = %err, "initial selection failed");
                    None
                }
            },
            None => {
                info!("catalog is empty; nothing to select");
                None
            }
        };

        StartupReport { seed, selected }
    }

    pub async fn available_marks(&self) -> Result<Vec<String>, CatalogError> {
        self.store.list_marks().await.map_err(persistence)
    }

    pub async fn select_by_key(&mut self, key: &str) -> Result<(), CatalogError> {
        let entry = self
            .store
            .find_by_mark(key)
            .await
            .map_err(persistence)?
            .ok_or_else(|| CatalogError::not_found(key))?;
        debug!(mark = %entry.mark, car_id = entry.id.0, "car selected");
        self.selection = Some(entry);
        self.render_selection();
        Ok(())
    }

    pub async fn record_engine_start(&mut self) -> Result<(), CatalogError> {
        let mut updated = self.selected()?.clone();
        updated.times_driven = updated.times_driven.saturating_add(1);
        updated.last_started = Some(self.clock.now());

        self.store.save_entry(&updated).await.map_err(persistence)?;
        debug!(mark = %updated.mark, times_driven = updated.times_driven, "engine started");
        self.selection = Some(updated);
        self.render_selection();
        Ok(())
    }

    /// Parses and stores a new rating. Both a rejected value and a failed
    /// save reach the user as a notice.
    pub async fn set_rating(&mut self, input: &str) -> Result<f32, CatalogError> {
        let mut updated = self.selected()?.clone();
        let rating = match parse_rating(input) {
            Ok(rating) => rating,
            Err(err) => {
                self.sink.notify(&Notice::new(
                    "Wrong value",
                    format!("Rating must be a number from 0 to {MAX_RATING}"),
                ));
                return Err(err);
            }
        };
        updated.rating = rating;
        if let Err(err) = self.store.save_entry(&updated).await {
            error!(mark = %updated.mark, error = ?err, "failed to save rating");
            self.sink.notify(&Notice::wrong_value());
            return Err(persistence(err));
        }

        self.selection = Some(updated);
        self.render_selection();
        Ok(rating)
    }

    /// Makes the selection the one favorite, clearing any other.
    pub async fn toggle_favorite(&mut self) -> Result<(), CatalogError> {
        let current = self.selected()?.clone();
        let previous = self.store.find_favorites().await.map_err(persistence)?;

        let mut changed: Vec<CatalogEntry> = previous
            .into_iter()
            .filter(|entry| entry.id != current.id)
            .map(|mut entry| {
                entry.my_choice = false;
                entry
            })
            .collect();
        let mut updated = current;
        updated.my_choice = true;
        changed.push(updated.clone());

        self.store.save_entries(&changed).await.map_err(persistence)?;
        debug!(mark = %updated.mark, cleared = changed.len() - 1, "favorite changed");
        self.selection = Some(updated);
        self.render_selection();
        Ok(())
    }

    /// Applies one command. Failures are logged and turned into an outcome.
    pub async fn dispatch(&mut self, command: CarCommand) -> DispatchOutcome {
        let name = command.name();
        let result = match command {
            CarCommand::Select { mark } => self.select_by_key(&mark).await,
            CarCommand::StartEngine => self.record_engine_start().await,
            CarCommand::Rate { input } => self.set_rating(&input).await.map(|_| ()),
            CarCommand::CancelRating => {
                debug!(command = name, "rating entry cancelled");
                return DispatchOutcome::Cancelled;
            }
            CarCommand::ToggleFavorite => self.toggle_favorite().await,
        };

        match result {
            Ok(()) => {
                debug!(command = name, "command applied");
                DispatchOutcome::Rendered
            }
            Err(err @ CatalogError::Persistence(_)) => {
                error!(command = name, code = ?err.code(), error = %err, "command failed");
                DispatchOutcome::Rejected(err)
            }
            Err(err) => {
                warn!(command = name, code = ?err.code(), error = %err, "command rejected");
                DispatchOutcome::Rejected(err)
            }
        }
    }

    fn selected(&self) -> Result<&CatalogEntry, CatalogError> {
        self.selection.as_ref().ok_or(CatalogError::NoSelection)
    }

    fn render_selection(&mut self) {
        if let Some(entry) = &self.selection {
            let view = render(entry, &self.options);
            self.sink.show(&view);
        }
    }
}

/// Accepts finite ratings in `0..=10`; anything else is rejected rather than
/// coerced.
pub fn parse_rating(input: &str) -> Result<f32, CatalogError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::validation(input, "empty input"));
    }
    let rating: f32 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| CatalogError::validation(input, "not a number"))?;
    if !rating.is_finite() {
        return Err(CatalogError::validation(input, "not a finite number"));
    }
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err(CatalogError::validation(
            input,
            format!("must be between 0 and {MAX_RATING}"),
        ));
    }
    // "-0" parses to negative zero
    Ok(rating + 0.0)
}
