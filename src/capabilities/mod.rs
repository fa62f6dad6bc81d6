mod http;
mod kv;
mod push;
mod share;

pub use self::http::{
    Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse,
    HttpResult, ValidatedUrl, DEFAULT_TIMEOUT_MS,
};
pub use self::kv::{
    KeyValue, KvError, KvKey, KvOperation, KvOutput, KvResult, CAMERA_HOST_KEY, CAMERA_PORT_KEY,
};
pub use self::push::{
    NotificationPayload, PermissionState, Push, PushError, PushOperation, PushOutput, PushResult,
};
pub use self::share::{Share, ShareError, ShareOperation, ShareOutput, ShareResult};

// Crux's built-in Render capability provides everything needed to trigger
// view updates.
pub use crux_core::render::Render;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub push: Push<Event>,
    pub share: Share<Event>,
    pub render: Render<Event>,
}
