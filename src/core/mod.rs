//! Core types for Solarplan.
//!
//! This module contains the fundamental data structures of a planning
//! session: site photos, system requirements, the bill of materials, and
//! configuration.

mod bom;
mod config;
mod photo;
mod requirements;

pub use bom::{parse_bom_json, to_editable_json, to_prompt_lines, BomItem, BomParseError};
pub use config::{AiConfig, Config, UiConfig};
pub use photo::{encode_batch, encode_photo, PhotoError, PhotoLibrary, SitePhoto};
pub use requirements::{InverterType, PanelType, RequirementField, SystemRequirements};
