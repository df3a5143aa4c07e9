// File: src/params.rs
// Purpose: Bookmarkable view parameters and their path encoding

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::escape::{escape_segment, unescape_segment};

/// Ordered mapping of parameter name to one or more values
///
/// Names keep their first-insertion order; values keep theirs. Two sets of
/// parameters are equal only when both orders agree.
///
/// # Examples
///
/// ```
/// use hybrid_router::ViewParameters;
///
/// let params = ViewParameters::new()
///     .with("category", "books")
///     .with("tag", "rust")
///     .with("tag", "web");
///
/// assert_eq!(params.get("category"), Some("books"));
/// assert_eq!(params.get_all("tag"), ["rust", "web"]);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewParameters {
    entries: Vec<(String, Vec<String>)>,
}

impl ViewParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value (builder form of [`insert`](Self::insert))
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Appends a value, keeping any values already stored under `name`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Replaces all values stored under `name`
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, vec![value.into()]));
    }

    /// First value stored under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values stored under `name` (empty slice when absent)
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, values)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Iterates every `(name, value)` pair, names grouped
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(name, values)| {
            values.iter().map(move |value| (name.as_str(), value.as_str()))
        })
    }

    /// Appends every pair of `other` after the existing ones
    pub fn merge(&mut self, other: &ViewParameters) {
        for (name, value) in other.pairs() {
            self.insert(name, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ViewParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ViewParameters::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

// ============================================================================
// Parameter Codec
// ============================================================================

/// Turns [`ViewParameters`] into the path fragment that follows a mount path,
/// and back.
///
/// Implementations must never emit a literal `.`: the instance-info suffix
/// is located by scanning for it.
pub trait ParameterCodec: Send + Sync {
    /// Encodes parameters into a fragment (`""` or starting with `/`)
    fn encode(&self, parameters: &ViewParameters) -> Result<String, RouteError>;

    /// Decodes a fragment, then merges raw query parameters after it
    fn decode(&self, fragment: &str, query: &ViewParameters)
        -> Result<ViewParameters, RouteError>;
}

/// Default codec: `/name/value` pairs, percent-encoded, separators escaped
///
/// # Examples
///
/// ```
/// use hybrid_router::{ParameterCodec, PathPairCodec, ViewParameters};
///
/// let codec = PathPairCodec;
/// let params = ViewParameters::new().with("id", "42").with("q", "a b");
///
/// let fragment = codec.encode(&params).unwrap();
/// assert_eq!(fragment, "/id/42/q/a%20b");
///
/// let decoded = codec.decode(&fragment, &ViewParameters::new()).unwrap();
/// assert_eq!(decoded, params);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPairCodec;

impl PathPairCodec {
    fn encode_component(component: &str) -> Result<String, RouteError> {
        // `urlencoding` keeps `_`, but every escape marker starts with one
        let encoded = urlencoding::encode(component).replace('_', "%5F");
        Ok(escape_segment(&encoded)?.into_owned())
    }

    fn decode_component(segment: &str) -> Result<String, RouteError> {
        let unescaped = unescape_segment(segment);
        urlencoding::decode(&unescaped)
            .map(Cow::into_owned)
            .map_err(|_| RouteError::MalformedParameter {
                segment: segment.to_string(),
            })
    }
}

impl ParameterCodec for PathPairCodec {
    fn encode(&self, parameters: &ViewParameters) -> Result<String, RouteError> {
        parameters
            .pairs()
            .try_fold(String::new(), |mut url, (name, value)| {
                url.push('/');
                url.push_str(&Self::encode_component(name)?);
                url.push('/');
                url.push_str(&Self::encode_component(value)?);
                Ok::<_, RouteError>(url)
            })
    }

    fn decode(
        &self,
        fragment: &str,
        query: &ViewParameters,
    ) -> Result<ViewParameters, RouteError> {
        let trimmed = fragment.strip_prefix('/').unwrap_or(fragment);
        let trimmed = trimmed.trim_end_matches('/');

        let mut parameters = ViewParameters::new();
        if !trimmed.is_empty() {
            let segments: Vec<&str> = trimmed.split('/').collect();
            for pair in segments.chunks(2) {
                let name = Self::decode_component(pair[0])?;
                let value = match pair.get(1) {
                    Some(segment) => Self::decode_component(segment)?,
                    None => String::new(),
                };
                parameters.insert(name, value);
            }
        }

        parameters.merge(query);
        Ok(parameters)
    }
}
