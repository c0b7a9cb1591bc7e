//! Selection controller for the car catalog: store seam, view projection and
//! the one-time seeding step.

pub mod clock;
pub mod controller;
pub mod render;
pub mod seed;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use controller::{DispatchOutcome, SelectionController, StartupReport};
pub use render::{render, Bitmap, CarView, DisplaySink, Notice, RenderOptions, Rgba};
pub use seed::{seed_if_empty, SeedBundle, SeedOutcome};
pub use store::CatalogStore;

#[cfg(test)]
mod tests;
