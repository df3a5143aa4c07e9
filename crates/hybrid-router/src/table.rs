// File: src/table.rs
// Purpose: Ordered mount table picking the codec for a path or target

use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::RouteError;
use crate::mount::MountCodec;
use crate::store::InstanceStore;
use crate::target::{LogicalTarget, RouteRequest};

/// Mount codecs ordered most-specific first
///
/// Longer mount paths come before shorter ones, so `/shop/cart` wins over
/// `/shop` for `/shop/cart/x`. Equal lengths keep registration order.
///
/// # Examples
///
/// ```
/// use hybrid_router::{MemoryInstanceStore, MountCodec, MountPoint, MountTable, RouteRequest};
///
/// let table = MountTable::new()
///     .with_mount(MountCodec::new(MountPoint::new("/shop", "shop").unwrap()))
///     .with_mount(MountCodec::new(MountPoint::new("/shop/cart", "cart").unwrap()));
///
/// let store = MemoryInstanceStore::new();
/// let target = table.decode(&RouteRequest::new("/shop/cart/item/1"), &store).unwrap();
/// assert_eq!(target.parameters().unwrap().get("item"), Some("1"));
/// assert!(table.decode(&RouteRequest::new("/nowhere"), &store).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    mounts: Vec<MountCodec>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from `[[mounts]]` under the `[routing]` settings
    pub fn from_config(config: &Config) -> Result<Self> {
        config.mounts.iter().try_fold(Self::new(), |table, mount| {
            let codec = MountCodec::from_config(mount, &config.routing)
                .with_context(|| format!("Invalid mount {:?}", mount.path))?;
            Ok(table.with_mount(codec))
        })
    }

    /// Adds a mount (functional builder)
    pub fn with_mount(mut self, codec: MountCodec) -> Self {
        self.mount(codec);
        self
    }

    pub fn mount(&mut self, codec: MountCodec) {
        self.mounts.push(codec);
        // stable sort keeps registration order among equal lengths
        self.mounts
            .sort_by_key(|codec| std::cmp::Reverse(codec.mount().path().len()));
    }

    pub fn mounts(&self) -> &[MountCodec] {
        &self.mounts
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// First mount whose path matches
    pub fn resolve(&self, path: &str) -> Result<&MountCodec, RouteError> {
        self.mounts
            .iter()
            .find(|codec| codec.matches_path(path))
            .ok_or_else(|| RouteError::RouteNotFound {
                path: path.to_string(),
            })
    }

    /// Resolves the mount for `request` and decodes through it
    pub fn decode(
        &self,
        request: &RouteRequest,
        store: &dyn InstanceStore,
    ) -> Result<LogicalTarget, RouteError> {
        let codec = self.resolve(&request.path)?;
        tracing::debug!("{} matched mount {}", request.path, codec.mount().path());
        codec.decode(request, store)
    }

    /// Encodes `target` with the first mount applicable to it
    pub fn encode(
        &self,
        target: &LogicalTarget,
        store: &dyn InstanceStore,
    ) -> Result<String, RouteError> {
        let codec = self
            .mounts
            .iter()
            .find(|codec| codec.is_applicable_to(target, store))
            .ok_or_else(|| RouteError::UnsupportedTarget {
                mount_path: String::new(),
            })?;
        codec.encode(target, store)
    }
}
