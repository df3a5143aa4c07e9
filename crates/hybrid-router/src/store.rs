//! Instance lookup for hybrid URLs
//!
//! The session store owns live instances; the codec only asks it questions
//! through [`InstanceStore`]. Writes to one instance's metadata are expected
//! to be serialized by the store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::instance_info::InstanceInfo;
use crate::params::ViewParameters;
use crate::target::ViewClass;

/// A resolved live instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    pub scope_name: Option<String>,
    pub id: u32,
    pub revision: u32,
}

impl InstanceKey {
    /// Instance-info describing this instance
    pub fn info(&self) -> InstanceInfo {
        match &self.scope_name {
            Some(scope) => InstanceInfo::scoped_instance(scope.clone(), self.id, self.revision),
            None => InstanceInfo::instance(self.id, self.revision),
        }
    }
}

/// Whether the redirect to the hybrid URL has been issued for an instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectState {
    /// Rendered in place (initial state)
    #[default]
    Direct,
    /// Client was sent to the hybrid URL
    Redirected,
}

/// Per-instance bookkeeping kept by the store on behalf of the codec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    /// Bookmarkable parameters the instance was built from
    pub parameters: ViewParameters,
    /// Trailing `/` count of the URL that created the instance
    pub trailing_slashes: Option<usize>,
    pub redirect_state: RedirectState,
}

impl InstanceMetadata {
    /// Whether the creating request's parameters and shape were recorded
    pub fn is_recorded(&self) -> bool {
        self.trailing_slashes.is_some()
    }
}

/// Collaborator that resolves and describes live instances
pub trait InstanceStore: Send + Sync {
    /// Looks up a live instance; `None` when it no longer exists
    fn resolve_instance(&self, scope_name: Option<&str>, id: u32, revision: u32)
        -> Option<InstanceKey>;

    fn view_class_of(&self, instance: &InstanceKey) -> Option<ViewClass>;

    /// Whether the instance needs a stable id for later callbacks
    fn is_stateful(&self, instance: &InstanceKey) -> bool;

    fn metadata_of(&self, instance: &InstanceKey) -> Option<InstanceMetadata>;

    fn record_metadata(&self, instance: &InstanceKey, metadata: InstanceMetadata);

    /// Parameters the instance was originally built from
    fn recorded_parameters_of(&self, instance: &InstanceKey) -> ViewParameters {
        self.metadata_of(instance)
            .map(|metadata| metadata.parameters)
            .unwrap_or_default()
    }

    /// Store backend name
    fn name(&self) -> &'static str;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    scope_name: Option<String>,
    view_class: ViewClass,
    stateful: bool,
    revision: u32,
    metadata: InstanceMetadata,
}

#[derive(Debug)]
struct Inner {
    next_id: u32,
    entries: HashMap<u32, Entry>,
}

/// In-memory instance store
///
/// Ids are unique across the store and start at 1. Any revision up to the
/// current one resolves. Non-persistent: everything is lost on restart.
#[derive(Debug, Clone)]
pub struct MemoryInstanceStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_id: 1,
                entries: HashMap::new(),
            })),
        }
    }

    /// Registers a new instance at revision 0
    pub fn create(
        &self,
        view_class: impl Into<ViewClass>,
        scope_name: Option<String>,
        stateful: bool,
    ) -> InstanceKey {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;

        let scope_name = scope_name.filter(|s| !s.is_empty());
        inner.entries.insert(
            id,
            Entry {
                scope_name: scope_name.clone(),
                view_class: view_class.into(),
                stateful,
                revision: 0,
                metadata: InstanceMetadata::default(),
            },
        );

        tracing::debug!("Created instance {} (scope: {:?})", id, scope_name);
        InstanceKey {
            scope_name,
            id,
            revision: 0,
        }
    }

    /// Bumps the instance to its next revision
    pub fn advance_revision(&self, instance: &InstanceKey) -> Option<InstanceKey> {
        let mut inner = self.inner.write();
        let entry = inner.entries.get_mut(&instance.id)?;
        entry.revision += 1;
        Some(InstanceKey {
            scope_name: entry.scope_name.clone(),
            id: instance.id,
            revision: entry.revision,
        })
    }

    /// Drops an instance; later lookups of it fail
    pub fn remove(&self, id: u32) -> bool {
        self.inner.write().entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryInstanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceStore for MemoryInstanceStore {
    fn resolve_instance(
        &self,
        scope_name: Option<&str>,
        id: u32,
        revision: u32,
    ) -> Option<InstanceKey> {
        let inner = self.inner.read();
        let entry = inner.entries.get(&id)?;

        let scope_matches = scope_name.map_or(true, |s| entry.scope_name.as_deref() == Some(s));
        if !scope_matches || revision > entry.revision {
            return None;
        }

        Some(InstanceKey {
            scope_name: entry.scope_name.clone(),
            id,
            revision,
        })
    }

    fn view_class_of(&self, instance: &InstanceKey) -> Option<ViewClass> {
        let inner = self.inner.read();
        inner
            .entries
            .get(&instance.id)
            .map(|entry| entry.view_class.clone())
    }

    fn is_stateful(&self, instance: &InstanceKey) -> bool {
        let inner = self.inner.read();
        inner
            .entries
            .get(&instance.id)
            .map_or(false, |entry| entry.stateful)
    }

    fn metadata_of(&self, instance: &InstanceKey) -> Option<InstanceMetadata> {
        let inner = self.inner.read();
        inner
            .entries
            .get(&instance.id)
            .map(|entry| entry.metadata.clone())
    }

    fn record_metadata(&self, instance: &InstanceKey, metadata: InstanceMetadata) {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.entries.get_mut(&instance.id) {
            entry.metadata = metadata;
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
