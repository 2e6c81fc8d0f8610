//! # Solarplan
//!
//! AI-assisted solar installation planner for your terminal - from site
//! photos to order sheet.
//!
//! Solarplan collects site survey photos and system requirements, then runs
//! a four-step generation pipeline against the Gemini API: component
//! compatibility analysis, installation renderings, an itemized bill of
//! materials, and a ready-to-send order sheet. Without an API key the same
//! workflow runs in manual data-entry mode.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install solarplan
//!
//! # Store your Gemini API key (or set GEMINI_API_KEY)
//! solarplan key set <KEY>
//!
//! # Open the planner
//! solarplan
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod ai;
pub mod app;
pub mod core;
pub mod tui;
pub mod workflow;

pub use ai::{
    ApiKey, CredentialError, CredentialResolver, GatewayError, GeminiClient, Rendering,
    SolarGateway,
};
pub use app::{App, AppEvent};
pub use core::{
    BomItem, BomParseError, Config, PhotoError, PhotoLibrary, SitePhoto, SystemRequirements,
};
pub use workflow::{StepCall, StepKey, StepOutput, StepPhase, StepStatus, WorkflowEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "solarplan";
