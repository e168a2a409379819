//! URL resolution for description documents
//!
//! Relative URLs inside a device description (`SCPDURL`, `controlURL`,
//! icon `url`...) are resolved against the document's `URLBase` when it has
//! one, otherwise against the directory of the document URL itself.

use url::Url;

use crate::error::Result;

/// Base URL for resolving references found in a description document
///
/// An explicit `URLBase` is treated as a directory even without a trailing
/// slash. Without one, the last path segment of the document URL is stripped.
pub fn base_url(document_url: &Url, url_base: Option<&str>) -> Result<Url> {
    let mut base = match url_base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(explicit) => {
            let mut base = document_url.join(explicit)?;
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            base
        }
        None => {
            let mut base = document_url.clone();
            base.path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .pop()
                .push("");
            base
        }
    };
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

/// Resolve a possibly relative reference against a base URL
pub fn resolve(base: &Url, reference: &str) -> Result<Url> {
    Ok(base.join(reference.trim())?)
}
