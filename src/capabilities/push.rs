//! Push-notification capability.
//!
//! The shell owns the OS notification service; the core asks it for
//! permission and a push token, and tells it when to start and stop
//! forwarding incoming notifications as events. Start/stop replaces the
//! original client's implicit listener refs with an explicit contract
//! scoped to the visit-list screen's lifetime.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
}

impl PermissionState {
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized | Self::Provisional)
    }

    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum PushOperation {
    RequestPermission,
    GetToken,
    StartListening,
    StopListening,
}

impl Operation for PushOperation {
    type Output = PushResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PushError {
    /// Simulators and web shells have no push service.
    #[error("push notifications not available on this device")]
    NotAvailable,

    #[error("permission denied by user")]
    PermissionDenied,

    #[error("token registration failed: {reason}")]
    RegistrationFailed { reason: String },

    #[error("unknown error: {message}")]
    Unknown { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum PushOutput {
    PermissionStatus(PermissionState),
    Token(String),
    ListeningStarted,
    ListeningStopped,
}

impl PushOutput {
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    #[must_use]
    pub const fn permission_status(&self) -> Option<PermissionState> {
        match self {
            Self::PermissionStatus(state) => Some(*state),
            _ => None,
        }
    }
}

pub type PushResult = Result<PushOutput, PushError>;

/// Payload of a notification delivered while the app is foregrounded, or
/// tapped by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(crux_core::macros::Capability)]
pub struct Push<Ev> {
    context: CapabilityContext<PushOperation, Ev>,
}

impl<Ev> Push<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<PushOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn request_permission<F>(&self, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + Sync + 'static,
    {
        self.request(PushOperation::RequestPermission, make_event);
    }

    pub fn get_token<F>(&self, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + Sync + 'static,
    {
        self.request(PushOperation::GetToken, make_event);
    }

    pub fn start_listening<F>(&self, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + Sync + 'static,
    {
        self.request(PushOperation::StartListening, make_event);
    }

    pub fn stop_listening<F>(&self, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + Sync + 'static,
    {
        self.request(PushOperation::StopListening, make_event);
    }

    fn request<F>(&self, operation: PushOperation, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
