//! Shared types and workflow logic for the SPFarms harvest tooling
//!
//! This crate contains the harvest data model and the client-side rules
//! shared between the API client, the CLI and the dashboard (via WASM).

pub mod models;
pub mod progress;
pub mod types;
pub mod validation;
pub mod weights;
pub mod workflow;

pub use models::*;
pub use progress::*;
pub use types::*;
pub use validation::*;
pub use weights::*;
pub use workflow::*;
