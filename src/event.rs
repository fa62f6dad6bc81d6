use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult, NotificationPayload, PushResult, ShareResult};
use crate::model::SortColumn;

/// Which locally-persisted connection field an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionField {
    Host,
    Port,
}

/// Everything that can happen to the core: shell-originated events (user
/// actions plus incoming notification deliveries) and the completions of
/// previously requested side effects.
///
/// Completion payloads are boxed to keep the enum small.
#[derive(Debug, Serialize, Deserialize)]
pub enum Event {
    AppStarted,

    // Visit list
    VisitsScreenMounted,
    VisitsScreenUnmounted,
    VisitsRefreshRequested,
    VisitsFetched {
        generation: u64,
        result: Box<HttpResult>,
    },
    SortColumnTapped(SortColumn),

    // Visit detail
    VisitSelected {
        index: usize,
    },
    VisitDetailClosed,
    ShareVisitRequested,
    ShareFinished(Box<ShareResult>),
    OpenImageRequested,
    ImageUrlChecked {
        url: String,
        result: Box<ShareResult>,
    },
    ImageUrlOpened(Box<ShareResult>),
    AlertDismissed,

    // Settings screen
    SettingsScreenMounted,
    ConnectionFieldChanged {
        field: ConnectionField,
        value: String,
    },
    ConnectionFieldLoaded {
        field: ConnectionField,
        result: Box<KvResult>,
    },
    ConnectionSaved(Box<KvResult>),
    DeviceSettingsFetched(Box<HttpResult>),
    ThresholdInputChanged {
        text: String,
    },
    FrameCountInputChanged {
        text: String,
    },
    /// An edited numeric field lost focus; validate and, if valid, post
    /// the full settings document to the device.
    SettingsFieldCommitted,
    DeviceSettingsPosted(Box<HttpResult>),

    // Push notifications
    PushPermissionResult(Box<PushResult>),
    PushListeningChanged(Box<PushResult>),
    PushTokenReceived(Box<PushResult>),
    PushTokenDelivered(Box<HttpResult>),
    NotificationReceived(Box<NotificationPayload>),
    NotificationTapped(Box<NotificationPayload>),
}
