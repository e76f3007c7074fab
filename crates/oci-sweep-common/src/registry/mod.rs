//! Type Registry: per-kind deletion contracts
//!
//! Each kind the orchestrator knows how to delete has exactly one
//! [`ResourceTypeDescriptor`]. The registry is immutable after construction;
//! the built-in one is assembled once on first use from [`table`].

mod table;

pub use table::BUILTIN_DESCRIPTORS;

use crate::priority::{PRIORITY_TABLE, cleanup_priority};
use std::collections::HashMap;
use std::sync::LazyLock;

/// A named operation on a named service client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationRef {
    /// Client reference, e.g. `core.VirtualNetworkClient`
    pub client: &'static str,
    /// Operation name, e.g. `delete_vcn`
    pub operation: &'static str,
}

impl OperationRef {
    pub const fn new(client: &'static str, operation: &'static str) -> Self {
        Self { client, operation }
    }
}

impl std::fmt::Display for OperationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.client, self.operation)
    }
}

/// Long-running wait contract.
///
/// After the delete call returns, `op` is polled with the resource key until
/// the reported `lifecycleState` is one of `states` (or the resource is gone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitContract {
    pub op: OperationRef,
    pub states: &'static [&'static str],
}

/// How to find the parent management endpoint of a scheduled-deletion kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLookup {
    /// Listing of parent candidates in the scope
    pub list: OperationRef,
    /// Field of a parent item holding the endpoint to pass along
    pub endpoint_field: &'static str,
}

/// Per-kind special handling, dispatched by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialHandling {
    /// Plain delete (optionally followed by a long-running wait)
    #[default]
    None,
    /// Object-storage bucket: empty it, then delete it
    Bucket,
    /// Schedule deletion after the provider's minimum retention
    ScheduledDeletion { parent: Option<ParentLookup> },
    /// Log entry addressed by its owning group
    LogEntry,
    /// Entity addressed by the object-storage namespace plus its id
    Namespaced,
}

/// Where discovery finds resources of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoverySource {
    /// Covered by the search/inventory capability
    #[default]
    Search,
    /// Not indexed by search; enumerated with this listing operation
    List(OperationRef),
}

/// Deletion contract for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTypeDescriptor {
    pub kind: &'static str,
    pub delete_op: OperationRef,
    /// Which resource field keys the delete call (`"id"` or `"name"`)
    pub id_field: &'static str,
    pub wait: Option<WaitContract>,
    /// Kinds this kind relies on. They are deleted strictly after it.
    pub dependencies: &'static [&'static str],
    pub special: SpecialHandling,
    /// Destroyed automatically with its owner; never deleted directly
    pub skip_auto_managed: bool,
    pub discovery: DiscoverySource,
}

impl ResourceTypeDescriptor {
    /// Plain descriptor keyed on the resource id
    pub const fn new(kind: &'static str, client: &'static str, operation: &'static str) -> Self {
        Self {
            kind,
            delete_op: OperationRef::new(client, operation),
            id_field: "id",
            wait: None,
            dependencies: &[],
            special: SpecialHandling::None,
            skip_auto_managed: false,
            discovery: DiscoverySource::Search,
        }
    }

    pub const fn with_dependencies(mut self, dependencies: &'static [&'static str]) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub const fn with_wait(
        mut self,
        operation: &'static str,
        states: &'static [&'static str],
    ) -> Self {
        self.wait = Some(WaitContract {
            op: OperationRef::new(self.delete_op.client, operation),
            states,
        });
        self
    }

    pub const fn with_special(mut self, special: SpecialHandling) -> Self {
        self.special = special;
        self
    }

    pub const fn with_id_field(mut self, id_field: &'static str) -> Self {
        self.id_field = id_field;
        self
    }

    pub const fn listed_by(mut self, client: &'static str, operation: &'static str) -> Self {
        self.discovery = DiscoverySource::List(OperationRef::new(client, operation));
        self
    }

    pub const fn auto_managed(mut self) -> Self {
        self.skip_auto_managed = true;
        self
    }
}

/// Immutable kind → descriptor map plus the priority table
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    descriptors: HashMap<&'static str, ResourceTypeDescriptor>,
    priorities: HashMap<&'static str, u16>,
}

static BUILTIN: LazyLock<TypeRegistry> = LazyLock::new(|| {
    TypeRegistry::new(
        BUILTIN_DESCRIPTORS.iter().copied(),
        PRIORITY_TABLE.iter().copied(),
    )
});

impl TypeRegistry {
    /// Build a registry. Later descriptors for the same kind replace earlier ones.
    pub fn new(
        descriptors: impl IntoIterator<Item = ResourceTypeDescriptor>,
        priorities: impl IntoIterator<Item = (&'static str, u16)>,
    ) -> Self {
        Self {
            descriptors: descriptors.into_iter().map(|d| (d.kind, d)).collect(),
            priorities: priorities.into_iter().collect(),
        }
    }

    /// The registry compiled into the binary
    pub fn builtin() -> &'static TypeRegistry {
        &BUILTIN
    }

    /// Deletion contract for `kind`
    pub fn lookup(&self, kind: &str) -> Option<&ResourceTypeDescriptor> {
        self.descriptors.get(kind)
    }

    /// Whether `kind` is destroyed with its owner and must not be deleted directly
    pub fn is_auto_managed(&self, kind: &str) -> bool {
        self.lookup(kind).is_some_and(|d| d.skip_auto_managed)
    }

    /// Static rank of `kind` (higher = earlier)
    pub fn priority(&self, kind: &str) -> u16 {
        self.priorities
            .get(kind)
            .copied()
            .unwrap_or_else(|| cleanup_priority(kind))
    }

    /// Kinds that search does not index, with the listing that enumerates them
    pub fn listed_kinds(&self) -> impl Iterator<Item = (&'static str, OperationRef)> + '_ {
        let mut listed: Vec<_> = self
            .descriptors
            .values()
            .filter(|d| !d.skip_auto_managed)
            .filter_map(|d| match d.discovery {
                DiscoverySource::List(op) => Some((d.kind, op)),
                DiscoverySource::Search => None,
            })
            .collect();
        listed.sort_by_key(|(kind, _)| *kind);
        listed.into_iter()
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry has no kinds
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
