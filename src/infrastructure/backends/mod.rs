mod rest;

use std::sync::Arc;

use anyhow::Result;

pub use rest::*;

use crate::domain::models::GatewayRef;

pub struct BackendManager {}

impl BackendManager {
    /// Builds the gateway described by the loaded config.
    pub fn get() -> Result<GatewayRef> {
        return Ok(Arc::new(RestGateway::from_config()?));
    }
}
