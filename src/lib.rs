pub mod cli;
pub mod client;
pub mod color;
pub mod config;
pub mod errors;
pub mod form;
pub mod models;
pub mod poller;
pub mod render;
pub mod reshape;
pub mod submit;
pub mod ui;

pub use client::{ApiClient, EventSink, StatsSource};
pub use color::Color;
pub use config::Settings;
pub use errors::{AppError, Result};
pub use form::{EventForm, FormField};
pub use models::{EventAggregateRecord, EventSubmission, Series, SeriesKey, SeriesPoint};
pub use poller::{Poller, ReloadHandle, UPDATE_INTERVAL};
pub use render::{ChartRenderer, RenderController};
pub use reshape::{reshape, reshape_with};
pub use submit::Submitter;
pub use ui::HtmlChartRenderer;
