/// Locates the instance-info suffix at the end of a URL
///
/// Mount paths and hand-written parameters may themselves contain the begin
/// delimiter, so the scan runs backward from the end of the string and keeps
/// extending the candidate leftward for as long as the grammar accepts it.
use serde::{Deserialize, Serialize};

use super::InstanceInfo;
use crate::error::RouteError;

/// Markers surrounding an instance-info suffix (`.` and `""` by default)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    begin: String,
    end: String,
}

impl Delimiters {
    /// # Errors
    ///
    /// [`RouteError::InvalidDelimiters`] for an empty begin marker, or one
    /// that parameter values could spell out literally: `/`, `%` and the
    /// characters percent-encoding leaves alone (`.` excepted, it is escaped).
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Result<Self, RouteError> {
        let begin = begin.into();
        let end = end.into();
        if begin.is_empty() {
            return Err(RouteError::InvalidDelimiters {
                reason: "begin separator must not be empty",
            });
        }
        if begin.contains('/') || end.contains('/') {
            return Err(RouteError::InvalidDelimiters {
                reason: "separators must not contain '/'",
            });
        }
        if !begin.chars().chain(end.chars()).all(is_delimiter_char) {
            return Err(RouteError::InvalidDelimiters {
                reason: "separators may only use '.' or characters that are always percent-encoded",
            });
        }
        Ok(Self { begin, end })
    }

    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Parses `candidate` if it is exactly `begin + info + end`
    ///
    /// # Examples
    ///
    /// ```
    /// use hybrid_router::Delimiters;
    ///
    /// let delims = Delimiters::default();
    /// assert!(delims.parse_wrapped(".3.2").is_some());
    /// assert!(delims.parse_wrapped("3.2").is_none());
    /// assert!(delims.parse_wrapped(".").is_none());
    /// ```
    pub fn parse_wrapped(&self, candidate: &str) -> Option<InstanceInfo> {
        if candidate.len() <= self.begin.len() + self.end.len() {
            return None;
        }
        let inner = candidate
            .strip_prefix(self.begin.as_str())?
            .strip_suffix(self.end.as_str())?;
        InstanceInfo::parse(inner)
    }

    /// Wraps encoded instance-info in the delimiters
    pub fn wrap(&self, info: &InstanceInfo) -> String {
        format!("{}{}{}", self.begin, info, self.end)
    }
}

fn is_delimiter_char(c: char) -> bool {
    c == '.' || !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '~' | '%'))
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            begin: ".".to_string(),
            end: String::new(),
        }
    }
}

/// Output of [`extract_instance_info`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult<'a> {
    /// URL with the suffix removed
    pub url_remainder: &'a str,
    /// The parsed suffix, if one was found
    pub instance_info: Option<InstanceInfo>,
}

/// Splits the right-most instance-info suffix off `url`
///
/// Each occurrence of the begin delimiter, from the last one backward,
/// yields a candidate running to the end of the string. Candidates with the
/// right shape are grammar-checked; the longest run of accepted candidates
/// wins and the scan stops at the first rejected one.
///
/// # Examples
///
/// ```
/// use hybrid_router::{extract_instance_info, Delimiters, InstanceInfo};
///
/// let result = extract_instance_info("/a.b/mount.3.2", &Delimiters::default());
/// assert_eq!(result.url_remainder, "/a.b/mount");
/// assert_eq!(result.instance_info, Some(InstanceInfo::instance(3, 2)));
///
/// let result = extract_instance_info("/plain/path", &Delimiters::default());
/// assert_eq!(result.url_remainder, "/plain/path");
/// assert_eq!(result.instance_info, None);
/// ```
pub fn extract_instance_info<'a>(url: &'a str, delimiters: &Delimiters) -> ExtractionResult<'a> {
    let mut best: Option<(usize, InstanceInfo)> = None;
    let mut search_end = url.len();

    while let Some(begin) = url[..search_end].rfind(delimiters.begin()) {
        let candidate = &url[begin..];
        let shaped = candidate.len() > delimiters.begin().len() + delimiters.end().len()
            && candidate.ends_with(delimiters.end());

        if shaped {
            match delimiters.parse_wrapped(candidate) {
                Some(info) => {
                    tracing::trace!("Instance-info candidate accepted: {:?}", candidate);
                    best = Some((begin, info));
                }
                None => break,
            }
        }
        search_end = begin;
    }

    match best {
        Some((begin, info)) => ExtractionResult {
            url_remainder: &url[..begin],
            instance_info: Some(info),
        },
        None => ExtractionResult {
            url_remainder: url,
            instance_info: None,
        },
    }
}
