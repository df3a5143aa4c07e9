// File: src/target.rs
// Purpose: Logical targets handed to and from the view-resolution layer

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ViewParameters;

/// Identifier of a mountable view class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewClass(String);

impl ViewClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewClass {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ViewClass {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// What a hybrid URL points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogicalTarget {
    /// Build a new instance of `view_class` from its parameters
    Fresh {
        view_class: ViewClass,
        parameters: ViewParameters,
        /// Scope the new instance should live in
        scope_name: Option<String>,
    },
    /// Continue with a live instance
    Resumed {
        instance_id: u32,
        revision: u32,
        scope_name: Option<String>,
        parameters: ViewParameters,
    },
    /// A listener callback referenced an instance that is gone
    ExpiredInstance {
        scope_name: Option<String>,
        view_class: ViewClass,
    },
}

impl LogicalTarget {
    /// Unscoped fresh target
    pub fn fresh(view_class: impl Into<ViewClass>, parameters: ViewParameters) -> Self {
        LogicalTarget::Fresh {
            view_class: view_class.into(),
            parameters,
            scope_name: None,
        }
    }

    pub fn resumed(
        instance_id: u32,
        revision: u32,
        scope_name: Option<String>,
        parameters: ViewParameters,
    ) -> Self {
        LogicalTarget::Resumed {
            instance_id,
            revision,
            scope_name,
            parameters,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, LogicalTarget::Fresh { .. })
    }

    pub fn is_resumed(&self) -> bool {
        matches!(self, LogicalTarget::Resumed { .. })
    }

    pub fn scope_name(&self) -> Option<&str> {
        match self {
            LogicalTarget::Fresh { scope_name, .. }
            | LogicalTarget::Resumed { scope_name, .. }
            | LogicalTarget::ExpiredInstance { scope_name, .. } => scope_name.as_deref(),
        }
    }

    /// Parameters carried by the target (`None` for an expired instance)
    pub fn parameters(&self) -> Option<&ViewParameters> {
        match self {
            LogicalTarget::Fresh { parameters, .. } | LogicalTarget::Resumed { parameters, .. } => {
                Some(parameters)
            }
            LogicalTarget::ExpiredInstance { .. } => None,
        }
    }
}

/// Inbound request as seen by the codec
///
/// Carries everything a decode needs, so no ambient "current request"
/// lookup is ever required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequest {
    /// Raw (still percent-encoded) request path
    pub path: String,
    /// Query parameters, merged after the path parameters
    pub query: ViewParameters,
    /// Decode was triggered by a listener/interface callback, not navigation
    pub listener_callback: bool,
    /// Scope named explicitly by the request; wins over the URL suffix
    pub scope_name: Option<String>,
}

impl RouteRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: ViewParameters) -> Self {
        self.query = query;
        self
    }

    /// Marks the request as a listener callback
    pub fn from_listener(mut self, listener_callback: bool) -> Self {
        self.listener_callback = listener_callback;
        self
    }

    pub fn with_scope(mut self, scope_name: impl Into<String>) -> Self {
        self.scope_name = Some(scope_name.into()).filter(|s| !s.is_empty());
        self
    }
}
