//! Share-sheet and link-opening capability.
//!
//! Wraps the OS share sheet and the platform's `canOpenURL`/`openURL`
//! pair. These are the only operations whose failures the client surfaces
//! as a user-visible alert.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum ShareOperation {
    /// Open the OS share sheet with a plain-text message.
    ShareText { message: String },
    /// Ask the OS whether any installed handler can open the URL.
    CanOpenUrl { url: String },
    /// Hand the URL to the OS to open externally.
    OpenUrl { url: String },
}

impl Operation for ShareOperation {
    type Output = ShareResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShareError {
    #[error("share failed: {reason}")]
    Failed { reason: String },

    #[error("no handler for URL: {url}")]
    UnsupportedUrl { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ShareOutput {
    Shared,
    /// The user closed the share sheet without picking a target.
    Dismissed,
    CanOpen(bool),
    Opened,
}

pub type ShareResult = Result<ShareOutput, ShareError>;

#[derive(crux_core::macros::Capability)]
pub struct Share<Ev> {
    context: CapabilityContext<ShareOperation, Ev>,
}

impl<Ev> Share<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<ShareOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn share_text<F>(&self, message: String, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + Sync + 'static,
    {
        self.request(ShareOperation::ShareText { message }, make_event);
    }

    pub fn can_open_url<F>(&self, url: String, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + Sync + 'static,
    {
        self.request(ShareOperation::CanOpenUrl { url }, make_event);
    }

    pub fn open_url<F>(&self, url: String, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + Sync + 'static,
    {
        self.request(ShareOperation::OpenUrl { url }, make_event);
    }

    fn request<F>(&self, operation: ShareOperation, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
