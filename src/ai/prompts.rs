//! Prompt assembly for the four generation steps.

use crate::core::{to_prompt_lines, BomItem, SystemRequirements};

/// Prompt for the component-compatibility analysis.
pub fn analysis(requirements: &SystemRequirements) -> String {
    format!(
        "Analyze the following solar system requirements and generate a list of \
compatible key components. Provide a concise list of suitable solar panels, \
inverters, and battery systems.

System Requirements:
- Desired Power Output: {} kW
- Battery Storage: {} kWh
- Preferred Panel Type: {}
- Preferred Inverter Type: {}
- Additional Notes: {}

Format the output as a simple, clear list. For example:
- Panels: [Brand/Model], [Efficiency], [Warranty]
- Inverter: [Brand/Model], [Type], [Max AC Power]
- Battery: [Brand/Model], [Capacity kWh], [Chemistry]",
        requirements.desired_kw,
        requirements.battery_kwh,
        requirements.panel_type,
        requirements.inverter_type,
        requirements.additional_notes,
    )
}

/// Prompt for the installation renderings.
pub fn renderings(components: &str, photo_count: usize) -> String {
    format!(
        "Generate a detailed 3D rendering of a proposed solar array installation \
on the residential property shown in the {photo_count} uploaded site survey \
photo(s). Incorporate the following compatible components into the design:
{components}
The rendering should be realistic, showing the panels on the roof with proper \
mounting and wiring."
    )
}

/// Prompt for the bill of materials. Sent together with the response schema.
pub fn bill_of_materials(components: &str) -> String {
    format!(
        "Based on the provided list of compatible components and the site photos, \
generate a comprehensive bill of materials for the solar installation. \
Estimate quantities needed for a standard installation on a residential roof. \
Include panels, inverter, battery, racking, wiring, connectors, and other \
necessary hardware.

Compatible Components List:
{components}

Return the data in a valid JSON array format, following the provided schema precisely."
    )
}

/// Prompt for the order sheet compilation.
pub fn order_sheet(items: &[BomItem]) -> String {
    format!(
        "Compile a complete and professionally formatted purchase order request \
for a solar equipment supplier based on the following bill of materials. The \
order sheet should have a clear header, an itemized list with quantities, \
descriptions, and vendors, and a footer with a placeholder for authorization.

Bill of Materials:
{}

Generate the output as a clean, well-formatted text document ready to be \
copied and sent.",
        to_prompt_lines(items)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_interpolates_requirements() {
        let mut requirements = SystemRequirements::default();
        requirements.desired_kw = "7.2".to_string();
        requirements.additional_notes = "Flat roof, heavy shade".to_string();

        let prompt = analysis(&requirements);
        assert!(prompt.contains("7.2 kW"));
        assert!(prompt.contains("Flat roof, heavy shade"));
        assert!(prompt.contains("monocrystalline"));
    }

    #[test]
    fn test_order_sheet_prompt_lists_items() {
        let items = vec![BomItem {
            item: "Solar panel".to_string(),
            quantity: 24,
            description: "400W monocrystalline".to_string(),
            vendor: "Acme Solar".to_string(),
        }];

        let prompt = order_sheet(&items);
        assert!(prompt.contains("- Solar panel (Qty: 24): 400W monocrystalline [Vendor: Acme Solar]"));
    }

    #[test]
    fn test_rendering_prompt_mentions_components_and_photos() {
        let prompt = renderings("- Panels: Acme 400W", 3);
        assert!(prompt.contains("- Panels: Acme 400W"));
        assert!(prompt.contains("3 uploaded site survey"));
    }
}
