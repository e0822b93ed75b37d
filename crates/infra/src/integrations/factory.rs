//! Adapter construction from configuration

use std::sync::Arc;

use goldfish_core::SourceAdapter;
use goldfish_domain::{Config, GoldfishError, Result, Source};

use super::canvas::{CanvasAdapter, CanvasClient};
use super::classroom::ClassroomAdapter;
use super::portal::{PortalAdapter, PortalClient};
use crate::http::HttpClient;

/// Create the adapter for a synced source.
///
/// # Errors
/// Returns `GoldfishError::InvalidInput` for [`Source::Manual`].
pub fn create_adapter(
    source: Source,
    config: &Config,
    http: HttpClient,
) -> Result<Box<dyn SourceAdapter>> {
    match source {
        Source::Canvas => {
            Ok(Box::new(CanvasAdapter::new(CanvasClient::new(http, &config.canvas.base_url))))
        }
        Source::GoogleClassroom => {
            Ok(Box::new(ClassroomAdapter::new(http, &config.classroom.base_url)))
        }
        Source::Ustep => Ok(Box::new(PortalAdapter::new(PortalClient::new(
            http,
            &config.portal.base_url,
            config.portal.service.clone(),
        )))),
        Source::Manual => {
            Err(GoldfishError::InvalidInput("manual tasks have no source adapter".into()))
        }
    }
}

/// One adapter per synced source, in default sync order.
pub fn create_all_adapters(config: &Config, http: &HttpClient) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    Source::SYNCED
        .into_iter()
        .map(|source| create_adapter(source, config, http.clone()).map(Arc::from))
        .collect()
}
