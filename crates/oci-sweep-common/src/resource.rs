//! Resources produced by discovery

use serde::Serialize;

/// A resource found in the scope.
///
/// Produced once by discovery and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredResource {
    /// Provider identifier (OCID)
    pub id: String,
    /// Human-readable name, falls back to the id
    pub display_name: String,
    /// Kind tag, e.g. `Vcn` or `Bucket`
    pub kind: String,
    /// Region the resource lives in
    pub region: String,
    /// Lifecycle state observed during discovery
    pub lifecycle_state: Option<String>,
}

impl DiscoveredResource {
    /// Create a resource with no observed lifecycle state
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind: kind.into(),
            region: region.into(),
            lifecycle_state: None,
        }
    }

    /// Value of the field a descriptor keys deletions on.
    ///
    /// `"name"` selects the display name (buckets are addressed by name),
    /// anything else selects the id.
    pub fn key_for(&self, id_field: &str) -> &str {
        match id_field {
            "name" => &self.display_name,
            _ => &self.id,
        }
    }
}
