//! # wsi-core
//!
//! Shared foundation of the whole-slide imaging render-enhancement core:
//!
//! - [`params`] — the parameter store: typed configuration structs for
//!   manual tone, stain, and focus settings. One clamping setter per logical
//!   parameter, a full [`params::SettingsSnapshot`] for persistence and
//!   testing, no hidden globals.
//! - [`surface`] — the rendering contract with the host: a drawable RGBA
//!   surface that may refuse pixel reads (cross-origin-restricted sources),
//!   plus an in-memory implementation for tests and headless use.
//! - [`events`] — host lifecycle events and the per-frame debounce that
//!   collapses any number of triggers into at most one recompute per
//!   animation frame.
//! - [`error`] — the error taxonomy shared by the engine crates.
//!
//! Everything here is synchronous and single-threaded by design; parameter
//! mutation and consumption happen on the same thread, so no locking exists
//! anywhere in the store.

pub mod error;
pub mod events;
pub mod params;
pub mod surface;

pub use error::{CoreError, CoreResult};
pub use events::{FrameScheduler, RenderEvent};
pub use params::{
    ColorParameters, EnhancementSettings, FocusColormap, FocusParameters, SettingsSnapshot,
    StainAdjustment, StainKind, StainViewMode,
};
pub use surface::{MemorySurface, RenderSurface, is_readable};
