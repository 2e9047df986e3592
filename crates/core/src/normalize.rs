use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompareError;

/// The raw URL encodings accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convention {
    /// `www_domain_com.path.path.file_ext`
    DottedHost,
    /// `http://www.domain.com/path/path/file.ext`
    FullUrl,
    /// `www.domain.com/path/path/file.ext`
    NoSchemeHost,
    /// `http://www.domain.com/PATH/path/file.ext?query#fragment`
    FullUrlWithQuery,
    /// `/path/path/file.ext?query#fragment`
    PathWithQuery,
    /// `www.domain.com/PATH/path/file.ext?query#fragment`
    NoSchemeHostWithQuery,
}

impl Convention {
    pub const ALL: [Convention; 6] = [
        Convention::DottedHost,
        Convention::FullUrl,
        Convention::NoSchemeHost,
        Convention::FullUrlWithQuery,
        Convention::PathWithQuery,
        Convention::NoSchemeHostWithQuery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Convention::DottedHost => "dotted-host",
            Convention::FullUrl => "full-url",
            Convention::NoSchemeHost => "no-scheme-host",
            Convention::FullUrlWithQuery => "full-url-with-query",
            Convention::PathWithQuery => "path-with-query",
            Convention::NoSchemeHostWithQuery => "no-scheme-host-with-query",
        }
    }

    /// An example of a raw URL written in this convention.
    pub fn sample(self) -> &'static str {
        match self {
            Convention::DottedHost => "www_domain_com.path.path.file_ext",
            Convention::FullUrl => "http://www.domain.com/path/path/file.ext",
            Convention::NoSchemeHost => "www.domain.com/path/path/file.ext",
            Convention::FullUrlWithQuery => {
                "http://www.domain.com/PATH/path/file.ext?query#fragment"
            }
            Convention::PathWithQuery => "/path/path/file.ext?query#fragment",
            Convention::NoSchemeHostWithQuery => {
                "www.domain.com/PATH/path/file.ext?query#fragment"
            }
        }
    }

    /// Canonical path that keeps the file extension.
    pub fn soft_normalize(self, url: &str) -> String {
        let lower = url.to_lowercase();
        match self {
            Convention::DottedHost => {
                let dotted = lower.replace('.', "/").replace('_', ".");
                path_from_first_slash(&dotted)
            }
            Convention::FullUrl => path_from_first_slash(strip_scheme(&lower)),
            Convention::NoSchemeHost => path_from_first_slash(&lower),
            Convention::FullUrlWithQuery => {
                path_from_first_slash(strip_scheme(strip_query(&lower)))
            }
            Convention::PathWithQuery => {
                let path = strip_query(&lower);
                if path.is_empty() {
                    "/".to_string()
                } else {
                    path.to_string()
                }
            }
            Convention::NoSchemeHostWithQuery => path_from_first_slash(strip_query(&lower)),
        }
    }

    /// Canonical path without the file extension.
    pub fn hard_normalize(self, url: &str) -> String {
        strip_extension(&self.soft_normalize(url)).to_string()
    }

    pub fn normalize(self, url: &str, granularity: PathGranularity) -> String {
        match granularity {
            PathGranularity::WithExtension => self.soft_normalize(url),
            PathGranularity::WithoutExtension => self.hard_normalize(url),
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Convention {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('_', "-");
        let convention = match key.as_str() {
            "dotted-host" | "wtkdef" => Convention::DottedHost,
            "full-url" | "urlnorm" => Convention::FullUrl,
            "no-scheme-host" | "noprotnorm" => Convention::NoSchemeHost,
            "full-url-with-query" | "fullurl" => Convention::FullUrlWithQuery,
            "path-with-query" | "goog" => Convention::PathWithQuery,
            "no-scheme-host-with-query" | "noprotfull" => Convention::NoSchemeHostWithQuery,
            _ => return Err(CompareError::UnknownConvention(s.to_string())),
        };
        Ok(convention)
    }
}

/// Whether canonical paths keep their trailing file extension. Fixed per comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathGranularity {
    #[default]
    WithExtension,
    WithoutExtension,
}

impl PathGranularity {
    pub fn as_str(self) -> &'static str {
        match self {
            PathGranularity::WithExtension => "with-extension",
            PathGranularity::WithoutExtension => "without-extension",
        }
    }
}

impl fmt::Display for PathGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathGranularity {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "with-extension" | "soft" => Ok(PathGranularity::WithExtension),
            "without-extension" | "no-extension" | "hard" => Ok(PathGranularity::WithoutExtension),
            _ => Err(CompareError::UnknownGranularity(s.to_string())),
        }
    }
}

/// Drops everything from the last `.` onward, if there is one.
pub fn strip_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(pos) => &path[..pos],
        None => path,
    }
}

fn strip_query(url: &str) -> &str {
    let url = url.split('#').next().unwrap_or_default();
    url.split('?').next().unwrap_or_default()
}

fn strip_scheme(url: &str) -> &str {
    match url.find("://") {
        Some(pos) => &url[pos + 3..],
        None => url,
    }
}

fn path_from_first_slash(url: &str) -> String {
    match url.find('/') {
        Some(pos) => url[pos..].to_string(),
        None => "/".to_string(),
    }
}
