//! Clients for the external providers the optimizer depends on.

pub mod nominatim;
pub mod osrm;
pub mod overpass;

use crate::error::{bounded_excerpt, ProviderError};

/// Turn a non-success provider response into a typed error carrying a
/// bounded body excerpt.
pub(crate) async fn response_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Upstream {
        status,
        excerpt: bounded_excerpt(&body),
    }
}
