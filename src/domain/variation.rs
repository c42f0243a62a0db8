use serde::{Deserialize, Serialize};

/// Label carried by every variation record
pub const VARIATION_PARAMETER_NAME: &str = "7 Day Variation VmSize";

/// Signed change between two averages.
///
/// `None` when either average is zero or negative: such values come from
/// counters that were reset or not yet populated and give no usable delta.
pub fn average_difference(older_average: f64, newer_average: f64) -> Option<f64> {
    if older_average > 0.0 && newer_average > 0.0 {
        Some(newer_average - older_average)
    } else {
        None
    }
}

/// Render a size delta in KB with one decimal, e.g. `-12.3`, `80.0`, `N/A`.
///
/// The magnitude is rounded half away from zero. An exact zero renders `0`.
pub fn format_size(size_in_kb: Option<f64>) -> String {
    let Some(size) = size_in_kb else {
        return "N/A".to_string();
    };

    if size == 0.0 {
        return "0".to_string();
    }

    let sign = if size < 0.0 { "-" } else { "" };
    let rounded = (size.abs() * 10.0).round() / 10.0;

    format!("{}{:.1}", sign, rounded)
}

/// One reported (host, process) variation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariationResult {
    pub parameter_name: String,
    pub display_name: String,
    pub element_name: String,
    pub dma_name: String,
    pub received_value: String,
    pub expected_value: Option<String>,
    pub success: bool,
}

impl VariationResult {
    pub fn new(
        process_name: String,
        element_name: String,
        dma_name: String,
        received_value: String,
    ) -> Self {
        Self {
            parameter_name: VARIATION_PARAMETER_NAME.to_string(),
            display_name: process_name,
            element_name,
            dma_name,
            received_value,
            expected_value: None,
            success: false,
        }
    }
}
