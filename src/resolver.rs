//! Inbound request resolution
//!
//! Turns an already-routed request into the caller's API key and the
//! upstream URL to forward to. Both caller-facing namespaces (`v1` and
//! `v1beta`) map onto the upstream's stable `v1` surface.

use std::fmt;

use axum::http::HeaderMap;
use url::{form_urlencoded, Url};

use crate::error::{AppError, AppResult};

/// Header carrying the caller's Gemini API key
pub const API_KEY_HEADER: &str = "x-api-key";
/// Query parameter carrying the caller's Gemini API key
pub const API_KEY_QUERY_PARAM: &str = "api_key";
/// Query parameter the upstream expects the key in
pub const UPSTREAM_KEY_PARAM: &str = "key";
/// The only upstream API version ever called
pub const UPSTREAM_API_VERSION: &str = "v1";

/// Caller-facing API version namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V1,
    V1Beta,
}

impl ApiVersion {
    /// Parse the `{version}` path segment. Unknown namespaces are not routed.
    pub fn from_path(segment: &str) -> AppResult<Self> {
        match segment {
            "v1" => Ok(ApiVersion::V1),
            "v1beta" => Ok(ApiVersion::V1Beta),
            _ => Err(AppError::NotFound),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1Beta => "v1beta",
        }
    }

    /// Upstream version segment for this namespace.
    ///
    /// Beta requests are bridged onto the stable upstream surface.
    pub fn upstream_segment(self) -> &'static str {
        match self {
            ApiVersion::V1 | ApiVersion::V1Beta => UPSTREAM_API_VERSION,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream operation being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GenerateContent,
    StreamGenerateContent,
    ListModels,
    GetModel,
}

impl Operation {
    /// Parse the `:action` suffix of a `POST /{version}/models/{model}:{action}` path
    pub fn from_action(action: &str) -> AppResult<Self> {
        match action {
            "generateContent" => Ok(Operation::GenerateContent),
            "streamGenerateContent" => Ok(Operation::StreamGenerateContent),
            _ => Err(AppError::NotFound),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GenerateContent => "generateContent",
            Operation::StreamGenerateContent => "streamGenerateContent",
            Operation::ListModels => "listModels",
            Operation::GetModel => "getModel",
        }
    }

    /// Whether the response is relayed chunk by chunk
    pub fn is_streaming(self) -> bool {
        matches!(self, Operation::StreamGenerateContent)
    }

    /// Whether the upstream path names a model
    fn targets_model(self) -> bool {
        !matches!(self, Operation::ListModels)
    }

    /// Path segments below the upstream version segment
    fn upstream_segments(self, model: &str) -> Vec<String> {
        let leaf = match self {
            Operation::GenerateContent => format!("{model}:generateContent"),
            Operation::StreamGenerateContent => format!("{model}:streamGenerateContent"),
            Operation::ListModels => return vec!["models".to_string()],
            Operation::GetModel => model.to_string(),
        };
        vec!["models".to_string(), leaf]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameters the resolver looks at
#[derive(Debug, Default, Clone)]
pub struct CredentialQuery {
    pub api_key: Option<String>,
}

impl CredentialQuery {
    /// Pick `api_key` out of a raw query string.
    ///
    /// Never fails: unrelated or malformed parameters are ignored and a
    /// repeated `api_key` resolves to its last value.
    pub fn from_raw(query: Option<&str>) -> Self {
        let api_key = query
            .into_iter()
            .flat_map(|q| form_urlencoded::parse(q.as_bytes()))
            .filter(|(name, _)| *name == API_KEY_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .last();

        Self { api_key }
    }
}

/// Caller-supplied Gemini API key. Lives for one request and is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Resolve the caller's API key: header first, then query parameter.
///
/// Empty values count as absent.
pub fn resolve_credential(headers: &HeaderMap, query: &CredentialQuery) -> AppResult<Credential> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    if let Some(key) = from_header {
        return Ok(Credential(key.to_string()));
    }

    query
        .api_key
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|key| Credential(key.to_string()))
        .ok_or(AppError::Unauthenticated)
}

/// Fully formed upstream URL, credential included
#[derive(Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    url: Url,
}

impl ForwardTarget {
    /// Build the upstream URL for a routed call.
    ///
    /// Any path prefix on `base` is kept; its query string is replaced by
    /// the `key` parameter. The model id always stays a single encoded path
    /// segment, and dot segments are not routed.
    pub fn resolve(
        base: &Url,
        version: ApiVersion,
        operation: Operation,
        model: &str,
        credential: &Credential,
    ) -> AppResult<Self> {
        if operation.targets_model() && matches!(model, "" | "." | "..") {
            return Err(AppError::NotFound);
        }

        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| AppError::relay_failure("upstream", "upstream URL cannot be a base"))?
            .pop_if_empty()
            .push(version.upstream_segment())
            .extend(operation.upstream_segments(model));
        url.query_pairs_mut()
            .append_pair(UPSTREAM_KEY_PARAM, credential.expose());

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Upstream path without the credential-bearing query string
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl fmt::Debug for ForwardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardTarget")
            .field("host", &self.url.host_str())
            .field("path", &self.url.path())
            .finish_non_exhaustive()
    }
}
