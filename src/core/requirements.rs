//! The user-edited system requirements record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Solar panel construction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelType {
    #[default]
    Monocrystalline,
    Polycrystalline,
    ThinFilm,
}

impl PanelType {
    pub const ALL: [Self; 3] = [Self::Monocrystalline, Self::Polycrystalline, Self::ThinFilm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monocrystalline => "monocrystalline",
            Self::Polycrystalline => "polycrystalline",
            Self::ThinFilm => "thin-film",
        }
    }

    /// Next variant, wrapping around. Used by the form's selector.
    pub fn cycle(&self) -> Self {
        match self {
            Self::Monocrystalline => Self::Polycrystalline,
            Self::Polycrystalline => Self::ThinFilm,
            Self::ThinFilm => Self::Monocrystalline,
        }
    }
}

impl fmt::Display for PanelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monocrystalline" | "mono" => Ok(Self::Monocrystalline),
            "polycrystalline" | "poly" => Ok(Self::Polycrystalline),
            "thin-film" | "thinfilm" | "thin_film" => Ok(Self::ThinFilm),
            _ => Err(()),
        }
    }
}

/// Inverter topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InverterType {
    String,
    Micro,
    #[default]
    Hybrid,
}

impl InverterType {
    pub const ALL: [Self; 3] = [Self::String, Self::Micro, Self::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Micro => "micro",
            Self::Hybrid => "hybrid",
        }
    }

    /// Next variant, wrapping around. Used by the form's selector.
    pub fn cycle(&self) -> Self {
        match self {
            Self::String => Self::Micro,
            Self::Micro => Self::Hybrid,
            Self::Hybrid => Self::String,
        }
    }
}

impl fmt::Display for InverterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InverterType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "micro" => Ok(Self::Micro),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(()),
        }
    }
}

/// Names of the editable requirement fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementField {
    DesiredKw,
    BatteryKwh,
    PanelType,
    InverterType,
    AdditionalNotes,
}

/// The system requirements the user fills in before generation.
///
/// Capacity fields stay free-text: the gating predicates decide when enough
/// has been entered, nothing is validated at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemRequirements {
    pub desired_kw: String,
    pub battery_kwh: String,
    pub panel_type: PanelType,
    pub inverter_type: InverterType,
    pub additional_notes: String,
}

impl Default for SystemRequirements {
    fn default() -> Self {
        Self {
            desired_kw: "10".to_string(),
            battery_kwh: "15".to_string(),
            panel_type: PanelType::Monocrystalline,
            inverter_type: InverterType::Hybrid,
            additional_notes: "South-facing asphalt shingle roof, two stories.".to_string(),
        }
    }
}

impl SystemRequirements {
    /// Replace a single field, leaving the others untouched.
    ///
    /// Enum-typed fields parse their value and keep the current selection
    /// when the label is unrecognized.
    pub fn set_field(&mut self, field: RequirementField, value: &str) {
        match field {
            RequirementField::DesiredKw => self.desired_kw = value.to_string(),
            RequirementField::BatteryKwh => self.battery_kwh = value.to_string(),
            RequirementField::PanelType => {
                if let Ok(panel) = value.parse() {
                    self.panel_type = panel;
                }
            }
            RequirementField::InverterType => {
                if let Ok(inverter) = value.parse() {
                    self.inverter_type = inverter;
                }
            }
            RequirementField::AdditionalNotes => self.additional_notes = value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_replaces_only_named_field() {
        let mut requirements = SystemRequirements::default();
        requirements.set_field(RequirementField::DesiredKw, "7.5");

        assert_eq!(requirements.desired_kw, "7.5");
        assert_eq!(requirements.battery_kwh, "15");
        assert_eq!(requirements.inverter_type, InverterType::Hybrid);
    }

    #[test]
    fn test_set_field_parses_enum_values() {
        let mut requirements = SystemRequirements::default();
        requirements.set_field(RequirementField::PanelType, "thin-film");
        assert_eq!(requirements.panel_type, PanelType::ThinFilm);

        // An unrecognized label keeps the current selection.
        requirements.set_field(RequirementField::PanelType, "plutonium");
        assert_eq!(requirements.panel_type, PanelType::ThinFilm);
    }

    #[test]
    fn test_cycle_covers_all_variants() {
        let mut panel = PanelType::Monocrystalline;
        for _ in 0..PanelType::ALL.len() {
            panel = panel.cycle();
        }
        assert_eq!(panel, PanelType::Monocrystalline);

        let mut inverter = InverterType::String;
        for _ in 0..InverterType::ALL.len() {
            inverter = inverter.cycle();
        }
        assert_eq!(inverter, InverterType::String);
    }
}
