//! JSON output formatter

use crate::error::ScanResult;
use crate::inventory::Inventory;

/// Serialize one or more inventories as pretty JSON
///
/// # Errors
/// Returns an error if serialization fails
pub fn to_json(inventories: &[Inventory]) -> ScanResult<String> {
    match inventories {
        [single] => serde_json::to_string_pretty(single),
        many => serde_json::to_string_pretty(many),
    }
    .map_err(Into::into)
}
