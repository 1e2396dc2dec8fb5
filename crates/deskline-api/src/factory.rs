use std::sync::Arc;

use deskline_domain::CoreError;

use crate::interface::HelpdeskBackend;
use crate::providers::demo::DemoHelpdeskBackend;
use crate::providers::http::{HttpBackendConfig, HttpHelpdeskBackend};

pub const HTTP_BACKEND_KEY: &str = "http";
pub const DEMO_BACKEND_KEY: &str = "demo";

const SUPPORTED_BACKEND_KEYS: [&str; 2] = [HTTP_BACKEND_KEY, DEMO_BACKEND_KEY];

#[derive(Debug, Clone)]
pub enum BackendFactoryOutput {
    Http(HttpHelpdeskBackend),
    Demo(DemoHelpdeskBackend),
}

impl BackendFactoryOutput {
    pub fn into_shared(self) -> Arc<dyn HelpdeskBackend> {
        match self {
            Self::Http(backend) => Arc::new(backend),
            Self::Demo(backend) => Arc::new(backend),
        }
    }
}

pub fn supported_backend_keys() -> &'static [&'static str] {
    &SUPPORTED_BACKEND_KEYS
}

pub fn build_backend(
    backend_key: &str,
    http_config: HttpBackendConfig,
) -> Result<BackendFactoryOutput, CoreError> {
    match backend_key {
        HTTP_BACKEND_KEY => Ok(BackendFactoryOutput::Http(HttpHelpdeskBackend::new(
            http_config,
        )?)),
        DEMO_BACKEND_KEY => Ok(BackendFactoryOutput::Demo(DemoHelpdeskBackend::new())),
        other => Err(CoreError::Configuration(format!(
            "unknown backend provider key: {other}"
        ))),
    }
}
