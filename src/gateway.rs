//! Builds every request the camera device understands.
//!
//! All endpoint paths and body shapes live here so the update loop only
//! deals in [`HttpRequest`] values it can hand to the shell.

use serde::Serialize;
use thiserror::Error;

use crate::capabilities::{HttpError, HttpRequest};
use crate::model::{ConnectionConfig, DeviceSettings};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Host or port is blank; no request can be addressed.
    #[error("camera address is not configured")]
    Unconfigured,

    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Serialize)]
struct PushTokenBody<'a> {
    #[serde(rename = "pushToken")]
    push_token: &'a str,
}

/// Request factory bound to a resolved camera address. Construction fails
/// when the address is incomplete, so every method on a live `Gateway` can
/// assume a usable base URL.
pub struct Gateway<'a> {
    config: &'a ConnectionConfig,
}

impl<'a> Gateway<'a> {
    pub fn new(config: &'a ConnectionConfig) -> Result<Self, GatewayError> {
        if !config.is_resolved() {
            return Err(GatewayError::Unconfigured);
        }
        Ok(Self { config })
    }

    pub fn visits_request(&self) -> Result<HttpRequest, GatewayError> {
        Ok(HttpRequest::get(format!("{}/visitsjson", self.config.base_url()))?)
    }

    pub fn settings_request(&self) -> Result<HttpRequest, GatewayError> {
        Ok(HttpRequest::get(format!("{}/settings", self.config.base_url()))?)
    }

    pub fn post_settings_request(
        &self,
        settings: &DeviceSettings,
    ) -> Result<HttpRequest, GatewayError> {
        let request = HttpRequest::post(format!("{}/settings", self.config.base_url()))?
            .with_json(settings)?;
        Ok(request)
    }

    pub fn push_token_request(&self, token: &str) -> Result<HttpRequest, GatewayError> {
        let request = HttpRequest::post(format!("{}/pushToken", self.config.base_url()))?
            .with_json(&PushTokenBody { push_token: token })?;
        Ok(request)
    }

    /// Absolute URL for a capture image, for the shell's image views.
    pub fn image_url(&self, filename: &str) -> String {
        self.config.image_url(filename)
    }
}
