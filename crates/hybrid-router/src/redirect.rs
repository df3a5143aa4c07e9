// File: src/redirect.rs
// Purpose: Decide whether a fresh hit redirects to its hybrid URL

use crate::error::RouteError;
use crate::mount::MountCodec;
use crate::store::{InstanceKey, InstanceMetadata, InstanceStore, RedirectState};
use crate::target::LogicalTarget;

/// What the transport should do with a freshly created instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    /// Render the instance for the current request
    RenderInPlace,
    /// Send the client to this hybrid URL (302)
    Redirect(String),
}

impl RenderDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, RenderDecision::Redirect(_))
    }

    /// Location of the redirect, if any
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            RenderDecision::Redirect(url) => Some(url),
            RenderDecision::RenderInPlace => None,
        }
    }

    /// HTTP status for the redirect, if any
    pub fn redirect_status(&self) -> Option<u16> {
        self.is_redirect().then_some(302)
    }
}

/// Redirect Policy for one mount
///
/// Each instance moves from [`RedirectState::Direct`] to
/// [`RedirectState::Redirected`] at most once, and only when it is
/// stateful. Stateless instances always render in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    redirect_on_bookmarkable: bool,
    instance_ids_unique_per_session: bool,
}

impl RedirectPolicy {
    pub fn new(redirect_on_bookmarkable: bool, instance_ids_unique_per_session: bool) -> Self {
        Self {
            redirect_on_bookmarkable,
            instance_ids_unique_per_session,
        }
    }

    /// Whether a fresh hit addressed to `scope_name` wants a redirect
    ///
    /// With session-unique ids a named scope always redirects, so the scope
    /// drops out of the address bar.
    pub fn wants_redirect(&self, scope_name: Option<&str>) -> bool {
        self.redirect_on_bookmarkable
            || (self.instance_ids_unique_per_session
                && scope_name.map_or(false, |s| !s.is_empty()))
    }

    /// Records the instance's creation shape and decides how to answer
    ///
    /// `inbound_path` is the path that produced `target`; its trailing-slash
    /// count is stored so every later encode of the instance reproduces it.
    /// Targets other than `Fresh` render in place untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid_router::{
    ///     MemoryInstanceStore, MountCodec, MountPoint, RenderDecision, RouteRequest,
    /// };
    ///
    /// let codec = MountCodec::new(MountPoint::new("/mount/point", "page").unwrap());
    /// let store = MemoryInstanceStore::new();
    ///
    /// let path = "/mount/point/x//";
    /// let target = codec.decode(&RouteRequest::new(path), &store).unwrap();
    /// let instance = store.create("page", None, true);
    ///
    /// let decision = codec
    ///     .redirect_policy()
    ///     .on_instance_created(&codec, path, &target, &instance, &store)
    ///     .unwrap();
    /// assert_eq!(decision, RenderDecision::Redirect("/mount/point/x//.1".to_string()));
    /// ```
    pub fn on_instance_created(
        &self,
        codec: &MountCodec,
        inbound_path: &str,
        target: &LogicalTarget,
        instance: &InstanceKey,
        store: &dyn InstanceStore,
    ) -> Result<RenderDecision, RouteError> {
        let (parameters, scope_name) = match target {
            LogicalTarget::Fresh {
                parameters,
                scope_name,
                ..
            } => (parameters, scope_name.as_deref()),
            _ => return Ok(RenderDecision::RenderInPlace),
        };

        let mut metadata = store.metadata_of(instance).unwrap_or_default();
        if !metadata.is_recorded() {
            metadata = InstanceMetadata {
                parameters: parameters.clone(),
                trailing_slashes: Some(codec.original_trailing_slashes(inbound_path)),
                redirect_state: metadata.redirect_state,
            };
            store.record_metadata(instance, metadata.clone());
        }

        if metadata.redirect_state == RedirectState::Redirected
            || !store.is_stateful(instance)
            || !self.wants_redirect(scope_name)
        {
            return Ok(RenderDecision::RenderInPlace);
        }

        let url = codec.encode(&codec.resumed_target(instance, store), store)?;
        metadata.redirect_state = RedirectState::Redirected;
        store.record_metadata(instance, metadata);

        tracing::debug!("Redirecting {} to {}", inbound_path, url);
        Ok(RenderDecision::Redirect(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MountPoint;
    use crate::params::ViewParameters;
    use crate::store::MemoryInstanceStore;
    use crate::target::RouteRequest;
    use pretty_assertions::assert_eq;

    fn codec() -> MountCodec {
        MountCodec::new(MountPoint::new("/mount/point", "page").unwrap())
    }

    fn created(
        codec: &MountCodec,
        store: &MemoryInstanceStore,
        path: &str,
        stateful: bool,
    ) -> (InstanceKey, RenderDecision) {
        let target = codec.decode(&RouteRequest::new(path), store).unwrap();
        let instance = store.create("page", target.scope_name().map(str::to_string), stateful);
        let decision = codec
            .redirect_policy()
            .on_instance_created(codec, path, &target, &instance, store)
            .unwrap();
        (instance, decision)
    }

    #[test]
    fn test_stateful_redirects_once() {
        let codec = codec();
        let store = MemoryInstanceStore::new();
        let (instance, decision) = created(&codec, &store, "/mount/point/a/1", true);

        assert_eq!(decision.redirect_target(), Some("/mount/point/a/1.1"));
        assert_eq!(decision.redirect_status(), Some(302));
        assert_eq!(
            store.metadata_of(&instance).unwrap().redirect_state,
            RedirectState::Redirected
        );

        let target = LogicalTarget::fresh("page", ViewParameters::new().with("a", "1"));
        let again = codec
            .redirect_policy()
            .on_instance_created(&codec, "/mount/point/a/1", &target, &instance, &store)
            .unwrap();
        assert_eq!(again, RenderDecision::RenderInPlace);
    }

    #[test]
    fn test_stateless_renders_in_place() {
        let codec = codec();
        let store = MemoryInstanceStore::new();
        let (instance, decision) = created(&codec, &store, "/mount/point//", false);

        assert_eq!(decision, RenderDecision::RenderInPlace);
        let metadata = store.metadata_of(&instance).unwrap();
        assert_eq!(metadata.redirect_state, RedirectState::Direct);
        assert_eq!(metadata.trailing_slashes, Some(2));
    }

    #[test]
    fn test_disabled_redirect() {
        let codec = codec().with_redirect(false);
        let store = MemoryInstanceStore::new();
        let (instance, decision) = created(&codec, &store, "/mount/point/a/1", true);

        assert!(!decision.is_redirect());
        // Still reachable through an explicit suffix
        assert_eq!(
            codec
                .encode(&codec.resumed_target(&instance, &store), &store)
                .unwrap(),
            "/mount/point/a/1.1"
        );
    }

    #[test]
    fn test_unique_ids_force_redirect_for_scope() {
        let codec = codec().with_redirect(false).with_unique_instance_ids(true);
        let store = MemoryInstanceStore::new();

        let (_, decision) = created(&codec, &store, "/mount/point.main", true);
        assert_eq!(decision.redirect_target(), Some("/mount/point.1"));

        let (_, decision) = created(&codec, &store, "/mount/point", true);
        assert!(!decision.is_redirect());
    }

    #[test]
    fn test_non_fresh_targets_render_in_place() {
        let codec = codec();
        let store = MemoryInstanceStore::new();
        let instance = store.create("page", None, true);
        let target = codec.resumed_target(&instance, &store);

        let decision = codec
            .redirect_policy()
            .on_instance_created(&codec, "/mount/point.1", &target, &instance, &store)
            .unwrap();
        assert_eq!(decision, RenderDecision::RenderInPlace);
        assert!(!store.metadata_of(&instance).unwrap().is_recorded());
    }
}
