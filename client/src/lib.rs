//! SPFarms harvest workflow client
//!
//! Drives a harvest through the post-harvest lifecycle against the facility
//! API: per-strain weights are collected and submitted, then the single
//! legal forward transition for the current stage is requested.

pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod view;
pub mod weights_editor;

pub use api::{HarvestApi, HttpHarvestClient};
pub use config::{Config, WeightSubmission};
pub use controller::HarvestController;
pub use error::{ClientError, ClientResult};
pub use view::{ActionView, HarvestView, PageView};
pub use weights_editor::WeightsEditor;
