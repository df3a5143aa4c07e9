/// Instance-info grammar for hybrid URLs
///
/// Compact, human-editable encoding of a live instance's identity: its id,
/// its revision and the scope it lives in. All parsing is **pure** and
/// returns `Option`; a string that does not fit the grammar is simply not
/// instance-info.
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod extract;

pub use extract::{extract_instance_info, Delimiters, ExtractionResult};

/// Separator between instance-info fields
pub const FIELD_SEPARATOR: char = '.';

/// Id and revision of a live instance. They only ever travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceRef {
    pub id: u32,
    pub revision: u32,
}

/// Identity of a view instance as carried by a URL suffix
///
/// At least one of the instance reference and the scope name is present.
///
/// # Encoded forms
///
/// | instance        | scope       | encoding       |
/// |-----------------|-------------|----------------|
/// | `id`, rev `0`   | -           | `id`           |
/// | `id`, rev `n`   | -           | `id.n`         |
/// | -               | `name`      | `name`         |
/// | -               | `123`       | `.123`         |
/// | `id`, rev `0`   | `name`      | `name.id`      |
/// | `id`, rev `n`   | any         | `scope.id.n`   |
///
/// # Examples
///
/// ```
/// use hybrid_router::InstanceInfo;
///
/// assert_eq!(InstanceInfo::instance(3, 0).to_string(), "3");
/// assert_eq!(InstanceInfo::instance(3, 2).to_string(), "3.2");
/// assert_eq!(InstanceInfo::scoped("123").unwrap().to_string(), ".123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceInfo {
    instance: Option<InstanceRef>,
    scope_name: Option<String>,
}

impl InstanceInfo {
    /// Instance without a scope name
    pub fn instance(id: u32, revision: u32) -> Self {
        Self {
            instance: Some(InstanceRef { id, revision }),
            scope_name: None,
        }
    }

    /// Scope name only. `None` for an empty name.
    pub fn scoped(scope_name: impl Into<String>) -> Option<Self> {
        Self::new(None, Some(scope_name.into()))
    }

    /// Instance living in a named scope
    pub fn scoped_instance(scope_name: impl Into<String>, id: u32, revision: u32) -> Self {
        Self {
            instance: Some(InstanceRef { id, revision }),
            scope_name: Some(scope_name.into()).filter(|s| !s.is_empty()),
        }
    }

    /// General constructor; an empty scope name counts as absent.
    ///
    /// Returns `None` when neither an instance nor a scope is given.
    pub fn new(instance: Option<InstanceRef>, scope_name: Option<String>) -> Option<Self> {
        let scope_name = scope_name.filter(|s| !s.is_empty());
        if instance.is_none() && scope_name.is_none() {
            return None;
        }
        Some(Self {
            instance,
            scope_name,
        })
    }

    pub fn instance_ref(&self) -> Option<InstanceRef> {
        self.instance
    }

    pub fn instance_id(&self) -> Option<u32> {
        self.instance.map(|i| i.id)
    }

    pub fn revision(&self) -> Option<u32> {
        self.instance.map(|i| i.revision)
    }

    pub fn scope_name(&self) -> Option<&str> {
        self.scope_name.as_deref()
    }

    /// Same info without the scope name, or `None` if nothing would remain
    pub fn without_scope(&self) -> Option<Self> {
        Self::new(self.instance, None)
    }

    /// Whether the encoded form parses back to `self`
    ///
    /// False only for scope names the grammar cannot carry (separators,
    /// slashes, punctuation).
    pub fn is_encodable(&self) -> bool {
        self.scope_name
            .as_deref()
            .map_or(true, |scope| scope.chars().all(is_field_char))
    }

    /// Parses instance-info (without delimiters)
    ///
    /// # Parsing Rules (evaluated in order)
    ///
    /// 1. `id`: one numeric field
    /// 2. `id.revision`: two numeric fields
    /// 3. `scope`: one non-numeric field
    /// 4. `.scope`: two fields, the first empty
    /// 5. `scope.id`: non-numeric then numeric
    /// 6. `scope.id.`: three fields, numeric second, empty third
    /// 7. `scope.id.revision`: three fields, numeric second and third
    ///
    /// Anything else, more than three fields, a character other than a
    /// letter, digit, `-` or `_`, or a number that overflows `u32`, yields
    /// `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid_router::InstanceInfo;
    ///
    /// let info = InstanceInfo::parse("cart.5.1").unwrap();
    /// assert_eq!(info.scope_name(), Some("cart"));
    /// assert_eq!(info.instance_id(), Some(5));
    /// assert_eq!(info.revision(), Some(1));
    ///
    /// assert!(InstanceInfo::parse("a.b.c.d").is_none());
    /// assert!(InstanceInfo::parse("a/b").is_none());
    /// ```
    pub fn parse(src: &str) -> Option<Self> {
        if src.is_empty() {
            return None;
        }

        let fields: Vec<&str> = src.split(FIELD_SEPARATOR).collect();
        if fields.len() > 3 || !fields.iter().all(|f| f.chars().all(is_field_char)) {
            return None;
        }

        match fields.as_slice() {
            [id] if is_numeric(id) => Some(Self::instance(id.parse().ok()?, 0)),
            [id, rev] if is_numeric(id) && is_numeric(rev) => {
                Some(Self::instance(id.parse().ok()?, rev.parse().ok()?))
            }
            [scope] => Self::scoped(*scope),
            ["", scope] => Self::scoped(*scope),
            [scope, id] if is_numeric(id) => {
                Some(Self::scoped_instance(*scope, id.parse().ok()?, 0))
            }
            [scope, id, ""] if is_numeric(id) => {
                Some(Self::scoped_instance(*scope, id.parse().ok()?, 0))
            }
            [scope, id, rev] if is_numeric(id) && is_numeric(rev) => Some(
                Self::scoped_instance(*scope, id.parse().ok()?, rev.parse().ok()?),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = FIELD_SEPARATOR;
        match (self.instance, self.scope_name.as_deref()) {
            (Some(InstanceRef { id, revision: 0 }), None) => write!(f, "{id}"),
            (Some(InstanceRef { id, revision }), None) => write!(f, "{id}{sep}{revision}"),
            (None, Some(scope)) if is_numeric(scope) => write!(f, "{sep}{scope}"),
            (None, Some(scope)) => write!(f, "{scope}"),
            (Some(InstanceRef { id, revision: 0 }), Some(scope)) if !is_numeric(scope) => {
                write!(f, "{scope}{sep}{id}")
            }
            (Some(InstanceRef { id, revision }), Some(scope)) => {
                write!(f, "{scope}{sep}{id}{sep}{revision}")
            }
            // unreachable through the constructors
            (None, None) => Ok(()),
        }
    }
}

/// Letters, digits, `-` and `_`
fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Non-empty and made only of ASCII digits
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
