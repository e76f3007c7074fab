//! Resource and response fixtures

use oci_sweep_common::DiscoveredResource;
use oci_sweep_common::defaults::DEFAULT_REGION;
use serde_json::{Value, json};

/// Generate a unique scope (compartment) id for a test.
///
/// # Example
///
/// ```
/// use oci_sweep_test_utils::test_scope_id;
///
/// let scope = test_scope_id();
/// assert!(scope.starts_with("ocid1.compartment.oc1..test"));
/// ```
pub fn test_scope_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("ocid1.compartment.oc1..test{counter:04}")
}

/// A discovered resource in the default region, named after its id
pub fn resource(kind: &str, id: &str) -> DiscoveredResource {
    DiscoveredResource::new(id, format!("{id}-name"), kind, DEFAULT_REGION)
}

/// One search result item as the search capability reports it
pub fn search_item(kind: &str, id: &str, name: &str) -> Value {
    json!({
        "identifier": id,
        "displayName": name,
        "resourceType": kind,
        "lifecycleState": "ACTIVE",
    })
}

/// One page of a paginated listing
pub fn page(items: Vec<Value>, next: Option<&str>) -> Value {
    match next {
        Some(token) => json!({ "items": items, "opcNextPage": token }),
        None => json!({ "items": items }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_ids_are_unique() {
        assert_ne!(test_scope_id(), test_scope_id());
    }

    #[test]
    fn page_omits_token_on_last_page() {
        assert!(page(vec![], None).get("opcNextPage").is_none());
        assert_eq!(page(vec![], Some("p2"))["opcNextPage"], "p2");
    }
}
