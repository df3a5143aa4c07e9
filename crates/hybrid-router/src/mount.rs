//! Mount Codec: encode/decode entry point for one mount point
//!
//! A hybrid URL is the mount path, the bookmarkable parameters and an
//! optional instance-info suffix:
//!
//! ```text
//! /shop/cart/item/42.main.7.3
//! |--------||-------||------|
//!   mount     params   suffix
//! ```
//!
//! Decoding strips the mount path, splits the suffix off the rest, decodes
//! the parameters and asks the [`InstanceStore`] whether the referenced
//! instance is still alive. Encoding goes the other way and restores the
//! trailing-slash shape recorded when the instance was created.

use std::fmt;
use std::sync::Arc;

use crate::config::{ExpiredInstancePolicy, MountConfig, RoutingConfig};
use crate::error::RouteError;
use crate::instance_info::{extract_instance_info, Delimiters, InstanceInfo};
use crate::params::{ParameterCodec, PathPairCodec, ViewParameters};
use crate::redirect::RedirectPolicy;
use crate::store::{InstanceKey, InstanceStore};
use crate::target::{LogicalTarget, RouteRequest, ViewClass};

// ============================================================================
// Mount Point
// ============================================================================

/// A path prefix bound to one view class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    path: String,
    view_class: ViewClass,
}

impl MountPoint {
    /// # Errors
    ///
    /// [`RouteError::InvalidMountPath`] unless `path` is non-empty, starts
    /// with `/` and does not end with `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid_router::MountPoint;
    ///
    /// assert!(MountPoint::new("/shop/cart", "cart").is_ok());
    /// assert!(MountPoint::new("/shop/cart/", "cart").is_err());
    /// assert!(MountPoint::new("shop", "cart").is_err());
    /// ```
    pub fn new(
        path: impl Into<String>,
        view_class: impl Into<ViewClass>,
    ) -> Result<Self, RouteError> {
        let path = path.into();
        let reason = if path.is_empty() {
            Some("mount path must not be empty")
        } else if !path.starts_with('/') {
            Some("mount path must start with '/'")
        } else if path.ends_with('/') {
            Some("mount path must not end with '/'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RouteError::InvalidMountPath { path, reason }),
            None => Ok(Self {
                path,
                view_class: view_class.into(),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn view_class(&self) -> &ViewClass {
        &self.view_class
    }
}

// ============================================================================
// Mount Codec
// ============================================================================

/// Hybrid URL codec bound to one [`MountPoint`]
///
/// Stateless apart from its configuration: every call gets the request and
/// the instance store passed in.
///
/// # Examples
///
/// ```
/// use hybrid_router::{
///     LogicalTarget, MemoryInstanceStore, MountCodec, MountPoint, RouteRequest, ViewParameters,
/// };
///
/// let codec = MountCodec::new(MountPoint::new("/shop/cart", "cart").unwrap());
/// let store = MemoryInstanceStore::new();
///
/// let target = codec
///     .decode(&RouteRequest::new("/shop/cart/item/42"), &store)
///     .unwrap();
/// assert_eq!(
///     target,
///     LogicalTarget::fresh("cart", ViewParameters::new().with("item", "42"))
/// );
/// assert_eq!(codec.encode(&target, &store).unwrap(), "/shop/cart/item/42");
/// ```
#[derive(Clone)]
pub struct MountCodec {
    mount: MountPoint,
    delimiters: Delimiters,
    case_insensitive: bool,
    redirect_on_bookmarkable: bool,
    instance_ids_unique_per_session: bool,
    expired_instance: ExpiredInstancePolicy,
    parameter_codec: Arc<dyn ParameterCodec>,
}

impl fmt::Debug for MountCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountCodec")
            .field("mount", &self.mount)
            .field("delimiters", &self.delimiters)
            .field("case_insensitive", &self.case_insensitive)
            .field("redirect_on_bookmarkable", &self.redirect_on_bookmarkable)
            .field(
                "instance_ids_unique_per_session",
                &self.instance_ids_unique_per_session,
            )
            .field("expired_instance", &self.expired_instance)
            .finish_non_exhaustive()
    }
}

impl MountCodec {
    /// Codec with default settings: `.` delimiters, case-sensitive,
    /// redirect on bookmarkable hits, failing on expired callbacks
    pub fn new(mount: MountPoint) -> Self {
        Self {
            mount,
            delimiters: Delimiters::default(),
            case_insensitive: false,
            redirect_on_bookmarkable: true,
            instance_ids_unique_per_session: false,
            expired_instance: ExpiredInstancePolicy::Fail,
            parameter_codec: Arc::new(PathPairCodec),
        }
    }

    /// Codec for a `[[mounts]]` entry under the given `[routing]` settings
    pub fn from_config(mount: &MountConfig, routing: &RoutingConfig) -> Result<Self, RouteError> {
        let point = MountPoint::new(mount.path.as_str(), mount.view.as_str())?;
        Ok(Self::new(point)
            .with_delimiters(routing.delimiters()?)
            .with_case_sensitivity(routing.case_insensitive)
            .with_redirect(
                mount
                    .redirect_on_bookmarkable
                    .unwrap_or(routing.redirect_on_bookmarkable),
            )
            .with_unique_instance_ids(routing.instance_ids_unique_per_session)
            .with_expired_policy(routing.expired_instance))
    }

    // ========================================================================
    // Functional Builder Methods
    // ========================================================================

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Compare the mount prefix ignoring ASCII case
    pub fn with_case_sensitivity(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Enable or disable the redirect to the hybrid URL after a fresh hit
    pub fn with_redirect(mut self, redirect_on_bookmarkable: bool) -> Self {
        self.redirect_on_bookmarkable = redirect_on_bookmarkable;
        self
    }

    pub fn with_unique_instance_ids(mut self, unique: bool) -> Self {
        self.instance_ids_unique_per_session = unique;
        self
    }

    pub fn with_expired_policy(mut self, policy: ExpiredInstancePolicy) -> Self {
        self.expired_instance = policy;
        self
    }

    pub fn with_parameter_codec(mut self, codec: Arc<dyn ParameterCodec>) -> Self {
        self.parameter_codec = codec;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        RedirectPolicy::new(
            self.redirect_on_bookmarkable,
            self.instance_ids_unique_per_session,
        )
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Whether `path` belongs to this mount
    ///
    /// True for the mount path itself, anything below it, and the mount path
    /// followed directly by an instance-info suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid_router::{MountCodec, MountPoint};
    ///
    /// let codec = MountCodec::new(MountPoint::new("/mount/point", "page").unwrap());
    /// assert!(codec.matches_path("/mount/point"));
    /// assert!(codec.matches_path("/mount/point.3"));
    /// assert!(codec.matches_path("/mount/point/sub"));
    /// assert!(!codec.matches_path("/mount/pointXXX"));
    /// ```
    pub fn matches_path(&self, path: &str) -> bool {
        self.parameters_fragment(path).is_some()
    }

    /// Everything after the mount path, if `path` matches
    fn parameters_fragment<'a>(&self, path: &'a str) -> Option<&'a str> {
        let mount = self.mount.path();
        let head = path.get(..mount.len())?;
        let same = if self.case_insensitive {
            head.eq_ignore_ascii_case(mount)
        } else {
            head == mount
        };
        if !same {
            return None;
        }

        let rest = &path[mount.len()..];
        if rest.is_empty() || rest.starts_with('/') {
            return Some(rest);
        }
        if rest.starts_with(self.delimiters.begin()) {
            let extraction = extract_instance_info(rest, &self.delimiters);
            if extraction.url_remainder.is_empty() && extraction.instance_info.is_some() {
                return Some(rest);
            }
        }
        None
    }

    /// Trailing `/` count of `path` once mount and suffix are removed
    ///
    /// This is the shape the Redirect Policy records for a new instance.
    pub fn original_trailing_slashes(&self, path: &str) -> usize {
        self.parameters_fragment(path)
            .map(|fragment| {
                let remainder = extract_instance_info(fragment, &self.delimiters).url_remainder;
                trailing_slashes(remainder)
            })
            .unwrap_or(0)
    }

    /// Whether this mount can encode `target`
    pub fn is_applicable_to(&self, target: &LogicalTarget, store: &dyn InstanceStore) -> bool {
        match target {
            LogicalTarget::Fresh { view_class, .. } => *view_class == self.mount.view_class,
            LogicalTarget::Resumed { .. } => self.resolve_target(target, store).is_some(),
            LogicalTarget::ExpiredInstance { .. } => false,
        }
    }

    fn resolve_target(
        &self,
        target: &LogicalTarget,
        store: &dyn InstanceStore,
    ) -> Option<InstanceKey> {
        match target {
            LogicalTarget::Resumed {
                instance_id,
                revision,
                scope_name,
                ..
            } => self.resolve(store, scope_name.as_deref(), *instance_id, *revision),
            _ => None,
        }
    }

    /// Live instance of this mount's view class, if any
    fn resolve(
        &self,
        store: &dyn InstanceStore,
        scope_name: Option<&str>,
        id: u32,
        revision: u32,
    ) -> Option<InstanceKey> {
        let key = store.resolve_instance(scope_name, id, revision)?;
        let view_class = store.view_class_of(&key)?;
        (view_class == self.mount.view_class).then_some(key)
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Decodes an inbound request into a logical target
    ///
    /// # Errors
    ///
    /// - [`RouteError::RouteNotFound`] if the path does not belong to this mount
    /// - [`RouteError::MalformedParameter`] from the parameter codec
    /// - [`RouteError::InstanceExpired`] for a listener callback on a dead
    ///   instance under [`ExpiredInstancePolicy::Fail`]
    pub fn decode(
        &self,
        request: &RouteRequest,
        store: &dyn InstanceStore,
    ) -> Result<LogicalTarget, RouteError> {
        let fragment =
            self.parameters_fragment(&request.path)
                .ok_or_else(|| RouteError::RouteNotFound {
                    path: request.path.clone(),
                })?;

        let extraction = extract_instance_info(fragment, &self.delimiters);
        let parameters = self
            .parameter_codec
            .decode(extraction.url_remainder, &request.query)?;

        let info = extraction.instance_info;
        let scope_name = request
            .scope_name
            .clone()
            .or_else(|| info.as_ref().and_then(|i| i.scope_name().map(str::to_string)));

        let instance = match info.as_ref().and_then(InstanceInfo::instance_ref) {
            Some(instance) => instance,
            None => {
                tracing::debug!("{} -> fresh {}", request.path, self.mount.view_class);
                return Ok(self.fresh(parameters, scope_name));
            }
        };

        if let Some(key) = self.resolve(store, scope_name.as_deref(), instance.id, instance.revision)
        {
            tracing::debug!(
                "{} -> resumed instance {} rev {}",
                request.path,
                key.id,
                key.revision
            );
            let parameters = recorded_or(store, &key, parameters);
            return Ok(LogicalTarget::Resumed {
                instance_id: key.id,
                revision: key.revision,
                scope_name: key.scope_name,
                parameters,
            });
        }

        if !request.listener_callback {
            tracing::debug!(
                "{}: instance {} not found, building a fresh {}",
                request.path,
                instance.id,
                self.mount.view_class
            );
            return Ok(self.fresh(parameters, scope_name));
        }

        tracing::warn!(
            "{}: callback for expired instance {} of {} ({:?})",
            request.path,
            instance.id,
            self.mount.view_class,
            self.expired_instance
        );
        match self.expired_instance {
            ExpiredInstancePolicy::Fail => Err(RouteError::InstanceExpired {
                scope_name,
                view_class: self.mount.view_class.clone(),
            }),
            ExpiredInstancePolicy::Report => Ok(LogicalTarget::ExpiredInstance {
                scope_name,
                view_class: self.mount.view_class.clone(),
            }),
            ExpiredInstancePolicy::Rebuild => Ok(self.fresh(parameters, scope_name)),
        }
    }

    fn fresh(&self, parameters: ViewParameters, scope_name: Option<String>) -> LogicalTarget {
        LogicalTarget::Fresh {
            view_class: self.mount.view_class.clone(),
            parameters,
            scope_name,
        }
    }

    /// `Resumed` target for a live instance, with its recorded parameters
    pub fn resumed_target(&self, instance: &InstanceKey, store: &dyn InstanceStore) -> LogicalTarget {
        LogicalTarget::Resumed {
            instance_id: instance.id,
            revision: instance.revision,
            scope_name: instance.scope_name.clone(),
            parameters: store.recorded_parameters_of(instance),
        }
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encodes a logical target into a URL path that matches this mount
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnsupportedTarget`] unless [`is_applicable_to`](Self::is_applicable_to)
    /// - [`RouteError::InvalidScopeName`] for a scope the suffix grammar cannot carry
    /// - [`RouteError::EncodingOverflow`] from the parameter codec
    pub fn encode(
        &self,
        target: &LogicalTarget,
        store: &dyn InstanceStore,
    ) -> Result<String, RouteError> {
        let unsupported = || RouteError::UnsupportedTarget {
            mount_path: self.mount.path.clone(),
        };

        let mut url = self.mount.path.clone();
        match target {
            LogicalTarget::Fresh {
                view_class,
                parameters,
                scope_name,
            } => {
                if *view_class != self.mount.view_class {
                    return Err(unsupported());
                }
                url.push_str(&self.parameter_codec.encode(parameters)?);

                let info = scope_name.as_deref().and_then(|s| InstanceInfo::scoped(s));
                if let Some(info) = info {
                    self.push_info(&mut url, &info)?;
                }
            }
            LogicalTarget::Resumed { parameters, .. } => {
                let key = self.resolve_target(target, store).ok_or_else(unsupported)?;
                let metadata = store.metadata_of(&key).filter(|m| m.is_recorded());

                let parameters = match &metadata {
                    Some(metadata) => &metadata.parameters,
                    None => parameters,
                };
                url.push_str(&self.parameter_codec.encode(parameters)?);

                if let Some(count) = metadata.and_then(|m| m.trailing_slashes) {
                    fix_trailing_slashes(&mut url, count);
                }

                let info = key.info();
                let info = match info.without_scope() {
                    Some(unscoped) if self.instance_ids_unique_per_session => unscoped,
                    _ => info,
                };
                self.push_info(&mut url, &info)?;
            }
            LogicalTarget::ExpiredInstance { .. } => return Err(unsupported()),
        }

        tracing::trace!("Encoded {:?} as {}", target, url);
        Ok(url)
    }

    fn push_info(&self, url: &mut String, info: &InstanceInfo) -> Result<(), RouteError> {
        if !info.is_encodable() {
            return Err(RouteError::InvalidScopeName {
                scope_name: info.scope_name().unwrap_or_default().to_string(),
            });
        }
        url.push_str(&self.delimiters.wrap(info));
        Ok(())
    }
}

/// Recorded parameters of `key`, or `fallback` when nothing was recorded
fn recorded_or(
    store: &dyn InstanceStore,
    key: &InstanceKey,
    fallback: ViewParameters,
) -> ViewParameters {
    store
        .metadata_of(key)
        .filter(|m| m.is_recorded())
        .map(|m| m.parameters)
        .unwrap_or(fallback)
}

fn trailing_slashes(s: &str) -> usize {
    s.len() - s.trim_end_matches('/').len()
}

/// Trims or pads trailing `/` until there are exactly `desired`
fn fix_trailing_slashes(url: &mut String, desired: usize) {
    let current = trailing_slashes(url);
    if current > desired {
        url.truncate(url.len() - (current - desired));
    } else {
        url.extend(std::iter::repeat('/').take(desired - current));
    }
}
