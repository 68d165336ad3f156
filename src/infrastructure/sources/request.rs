//! # Request Builder
//!
//! Turns a postal query and a source into the request one fetch task owns.

use crate::domain::value_objects::PostalQuery;
use crate::infrastructure::sources::deadline::Deadline;
use crate::infrastructure::sources::error::{SourceError, SourceResult};
use crate::infrastructure::sources::registry::SourceDescriptor;
use reqwest::Url;
use std::sync::Arc;

/// Characters that would change the shape of the target URL, including its
/// query string when a template places `{cep}` there.
const RESERVED: &[char] = &['/', '?', '#', '%', '\\', '&', '=', '+'];

/// A request bound for one source, tied to the race's shared deadline.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    source: Arc<SourceDescriptor>,
    url: Url,
    deadline: Deadline,
}

impl OutboundRequest {
    /// Builds the request for `source`.
    ///
    /// The query is substituted into the template verbatim; it is not
    /// validated as a postal code.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedTarget`] if the query contains
    /// reserved, whitespace or control characters, or the rendered template
    /// is not an absolute `http`/`https` URL.
    pub fn build(
        query: &PostalQuery,
        source: Arc<SourceDescriptor>,
        deadline: Deadline,
    ) -> SourceResult<Self> {
        let cep = query.as_str();
        if let Some(bad) = cep
            .chars()
            .find(|c| RESERVED.contains(c) || c.is_whitespace() || c.is_control())
        {
            return Err(SourceError::malformed_target(format!(
                "postal code contains unencodable character {bad:?}"
            )));
        }

        let rendered = source.render(cep);
        let url = Url::parse(&rendered).map_err(|e| {
            SourceError::malformed_target(format!("invalid url {rendered}: {e}"))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::malformed_target(format!(
                "unsupported scheme {} in {rendered}",
                url.scheme()
            )));
        }

        Ok(Self {
            source,
            url,
            deadline,
        })
    }

    /// Returns the source this request targets.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Arc<SourceDescriptor> {
        &self.source
    }

    /// Returns the source name.
    #[inline]
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Returns the target URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the shared deadline.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }
}
