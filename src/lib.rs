#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod event;
pub mod gateway;
pub mod model;

use serde::{Deserialize, Serialize};

pub use app::{App, NotificationView, SettingsView, ViewModel, VisitDetailView, VisitListView, VisitRow};
pub use capabilities::{Capabilities, Effect};
pub use event::{ConnectionField, Event};
pub use model::Model;
pub use crux_core::App as CruxApp;

pub const DEFAULT_CAMERA_HOST: &str = "192.168.1.61";
pub const DEFAULT_CAMERA_PORT: &str = "5000";
pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_FRAME_COUNT: i64 = 15;
pub const THRESHOLD_MIN: f64 = 0.0;
pub const THRESHOLD_MAX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Deserialization,
    Validation,
    PermissionDenied,
    UnsupportedUrl,
    Storage,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::UnsupportedUrl => "UNSUPPORTED_URL",
            Self::Storage => "STORAGE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Storage => ErrorSeverity::Transient,
            Self::Validation | Self::PermissionDenied | Self::UnsupportedUrl | Self::Unknown => {
                ErrorSeverity::Permanent
            }
            Self::Deserialization | Self::Internal => ErrorSeverity::Fatal,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Storage)
    }
}

/// An error shaped for the UI: a short user-facing message plus an
/// internal message that only reaches logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        if self.kind.is_retryable() {
            format!("{} Please try again.", self.message)
        } else {
            self.message.clone()
        }
    }
}

pub mod app {
    use super::{
        AppError, ErrorKind, THRESHOLD_MAX, THRESHOLD_MIN,
    };
    use serde::{Deserialize, Serialize};

    use crate::capabilities::{
        Capabilities, HttpError, HttpResult, KvKey, KvOutput, PushOutput, ShareOutput,
        CAMERA_HOST_KEY, CAMERA_PORT_KEY,
    };
    use crate::event::{ConnectionField, Event};
    use crate::gateway::{Gateway, GatewayError};
    use crate::model::{
        DeviceSettings, Model, SortState, VisitListStatus, VisitRecord,
    };

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct VisitRow {
        pub date_time: String,
        pub identification: String,
        /// Confidence normalized to a "0.87"-style fraction.
        pub confidence: String,
        pub image_url: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct VisitListView {
        pub rows: Vec<VisitRow>,
        pub is_loading: bool,
        pub error: Option<String>,
        pub sort: Option<SortState>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct VisitDetailView {
        pub date_time: String,
        pub identification: String,
        pub confidence: String,
        pub image_url: Option<String>,
        pub share_message: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct SettingsView {
        pub host: String,
        pub port: String,
        pub threshold_input: String,
        pub frame_count_input: String,
        pub threshold_error: Option<String>,
        pub frame_count_error: Option<String>,
        pub is_loading: bool,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct NotificationView {
        pub title: String,
        pub body: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ViewModel {
        pub visit_list: VisitListView,
        pub detail: Option<VisitDetailView>,
        pub settings: SettingsView,
        pub alert: Option<String>,
        pub notification_banner: Option<NotificationView>,
    }

    #[derive(Default)]
    pub struct App;

    impl App {
        fn http_error(error: &HttpError) -> AppError {
            match error {
                HttpError::Network { message } => {
                    AppError::new(ErrorKind::Network, "Could not reach the camera.")
                        .with_internal(message.clone())
                }
                HttpError::Timeout { timeout_ms } => {
                    AppError::new(ErrorKind::Timeout, "The camera took too long to respond.")
                        .with_internal(format!("timeout after {timeout_ms}ms"))
                }
                HttpError::InvalidResponse { reason } => {
                    AppError::new(ErrorKind::Deserialization, "The camera sent an unexpected reply.")
                        .with_internal(reason.clone())
                }
                other => AppError::new(ErrorKind::Unknown, "Request failed.")
                    .with_internal(other.to_string()),
            }
        }

        fn gateway_error(error: &GatewayError) -> AppError {
            match error {
                GatewayError::Unconfigured => AppError::new(
                    ErrorKind::Validation,
                    "Set the camera address in Settings first.",
                ),
                GatewayError::Http(e) => Self::http_error(e),
            }
        }

        fn storage_error(error: &crate::capabilities::KvError) -> AppError {
            AppError::new(ErrorKind::Storage, "Could not access saved settings.")
                .with_internal(error.to_string())
        }

        fn share_message(visit: &VisitRecord) -> String {
            format!(
                "Check out this {} I captured on my bird monitor!",
                visit.bird_identification
            )
        }

        /// The well-known storage keys are compile-time valid; a failure
        /// here is a programming error worth a log line, never a crash.
        fn storage_key(name: &str) -> Option<KvKey> {
            match KvKey::new(name) {
                Ok(key) => Some(key),
                Err(e) => {
                    let code = ErrorKind::Internal.code();
                    tracing::error!(code, error = %e, key = name, "invalid storage key");
                    None
                }
            }
        }

        /// The notification listeners live exactly as long as the visit
        /// list screen, and only once permission is granted.
        fn ensure_listening(model: &mut Model, caps: &Capabilities) {
            if model.push_permission.is_authorized()
                && model.visits_screen_active
                && !model.push_listening
            {
                model.push_listening = true;
                caps.push
                    .start_listening(|result| Event::PushListeningChanged(Box::new(result)));
            }
        }

        fn fetch_visits(model: &mut Model, caps: &Capabilities) {
            model.fetch_generation += 1;
            let generation = model.fetch_generation;
            model.list_status = VisitListStatus::Loading;

            match Gateway::new(&model.connection).and_then(|g| g.visits_request()) {
                Ok(request) => {
                    caps.http.send(request, move |result| Event::VisitsFetched {
                        generation,
                        result: Box::new(result),
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "visits fetch not sent");
                    model.list_status = VisitListStatus::Failed {
                        message: Self::gateway_error(&e).user_facing_message(),
                    };
                }
            }
        }

        fn handle_visits_fetched(model: &mut Model, generation: u64, result: &HttpResult) {
            if generation != model.fetch_generation {
                tracing::debug!(generation, current = model.fetch_generation, "stale visits response dropped");
                return;
            }

            let outcome = match result {
                Ok(response) if response.is_success() => {
                    response.json::<Vec<VisitRecord>>().map_err(|e| Self::http_error(&e))
                }
                Ok(response) => Err(AppError::new(
                    ErrorKind::Network,
                    "The camera rejected the request.",
                )
                .with_internal(format!("status {}", response.status()))),
                Err(e) => Err(Self::http_error(e)),
            };

            match outcome {
                Ok(visits) => {
                    model.visits = visits;
                    model.apply_sort();
                    model.list_status = VisitListStatus::Loaded;
                }
                Err(error) => {
                    // The previous list stays on screen alongside the error.
                    tracing::warn!(code = error.kind.code(), internal = ?error.internal_message, "visits fetch failed");
                    model.list_status = VisitListStatus::Failed {
                        message: error.user_facing_message(),
                    };
                }
            }
        }

        fn begin_settings_load(model: &mut Model, caps: &Capabilities) {
            model.settings_loading = true;
            model.threshold_error = None;
            model.frame_count_error = None;

            if let Some(key) = Self::storage_key(CAMERA_HOST_KEY) {
                caps.kv.read(key, |result| Event::ConnectionFieldLoaded {
                    field: ConnectionField::Host,
                    result: Box::new(result),
                });
            }
            if let Some(key) = Self::storage_key(CAMERA_PORT_KEY) {
                caps.kv.read(key, |result| Event::ConnectionFieldLoaded {
                    field: ConnectionField::Port,
                    result: Box::new(result),
                });
            }

            match Gateway::new(&model.connection).and_then(|g| g.settings_request()) {
                Ok(request) => {
                    caps.http.send(request, |result| {
                        Event::DeviceSettingsFetched(Box::new(result))
                    });
                }
                Err(e) => {
                    // Remote fields remain hidden; there is nothing to edit.
                    tracing::warn!(error = %e, "device settings fetch not sent");
                }
            }
        }

        fn persist_connection_field(model: &Model, field: ConnectionField, caps: &Capabilities) {
            let (key_name, value) = match field {
                ConnectionField::Host => (CAMERA_HOST_KEY, model.connection.host.clone()),
                ConnectionField::Port => (CAMERA_PORT_KEY, model.connection.port.clone()),
            };
            if let Some(key) = Self::storage_key(key_name) {
                caps.kv
                    .write(key, value, |result| Event::ConnectionSaved(Box::new(result)));
            }
        }

        /// Returns the validated settings, or records per-field errors on
        /// the model and returns `None`. Nothing invalid ever reaches the
        /// device.
        fn validate_settings_inputs(model: &mut Model) -> Option<DeviceSettings> {
            let threshold = match model.threshold_input.trim().parse::<f64>() {
                Ok(t) if t.is_finite() && (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&t) => {
                    model.threshold_error = None;
                    Some(t)
                }
                _ => {
                    model.threshold_error = Some(
                        AppError::new(
                            ErrorKind::Validation,
                            "Threshold must be a number between 0 and 1",
                        )
                        .user_facing_message(),
                    );
                    None
                }
            };

            let frame_count = match model.frame_count_input.trim().parse::<i64>() {
                Ok(n) if n > 0 => {
                    model.frame_count_error = None;
                    Some(n)
                }
                _ => {
                    model.frame_count_error = Some(
                        AppError::new(
                            ErrorKind::Validation,
                            "Frame count must be a positive whole number",
                        )
                        .user_facing_message(),
                    );
                    None
                }
            };

            match (threshold, frame_count) {
                (Some(threshold), Some(frame_count)) => Some(DeviceSettings {
                    threshold,
                    frame_count,
                }),
                _ => None,
            }
        }

        fn post_device_settings(model: &Model, caps: &Capabilities) {
            match Gateway::new(&model.connection)
                .and_then(|g| g.post_settings_request(&model.device_settings))
            {
                Ok(request) => {
                    caps.http.send(request, |result| {
                        Event::DeviceSettingsPosted(Box::new(result))
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "settings update not sent");
                }
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            tracing::debug!(?event, "handling event");

            match event {
                Event::AppStarted => {
                    // Stored camera address, best effort; defaults stand
                    // until a value arrives.
                    if let Some(key) = Self::storage_key(CAMERA_HOST_KEY) {
                        caps.kv.read(key, |result| Event::ConnectionFieldLoaded {
                            field: ConnectionField::Host,
                            result: Box::new(result),
                        });
                    }
                    if let Some(key) = Self::storage_key(CAMERA_PORT_KEY) {
                        caps.kv.read(key, |result| Event::ConnectionFieldLoaded {
                            field: ConnectionField::Port,
                            result: Box::new(result),
                        });
                    }

                    caps.render.render();
                }

                Event::VisitsScreenMounted => {
                    model.visits_screen_active = true;
                    if !model.push_registration_started {
                        model.push_registration_started = true;
                        caps.push.request_permission(|result| {
                            Event::PushPermissionResult(Box::new(result))
                        });
                    }
                    Self::ensure_listening(model, caps);
                    Self::fetch_visits(model, caps);
                    caps.render.render();
                }

                Event::VisitsRefreshRequested => {
                    Self::fetch_visits(model, caps);
                    caps.render.render();
                }

                Event::VisitsScreenUnmounted => {
                    model.visits_screen_active = false;
                    // Invalidate any in-flight fetch.
                    model.fetch_generation += 1;
                    if model.push_listening {
                        model.push_listening = false;
                        caps.push
                            .stop_listening(|result| Event::PushListeningChanged(Box::new(result)));
                    }
                }

                Event::VisitsFetched { generation, result } => {
                    Self::handle_visits_fetched(model, generation, &result);
                    caps.render.render();
                }

                Event::SortColumnTapped(column) => {
                    model.sort = Some(SortState::tapped(model.sort, column));
                    model.apply_sort();
                    caps.render.render();
                }

                Event::VisitSelected { index } => {
                    match model.visits.get(index) {
                        Some(visit) => {
                            model.selected_visit = Some(visit.clone());
                            caps.render.render();
                        }
                        None => {
                            tracing::warn!(index, len = model.visits.len(), "visit selection out of range");
                        }
                    }
                }

                Event::VisitDetailClosed => {
                    model.selected_visit = None;
                    caps.render.render();
                }

                Event::ShareVisitRequested => {
                    if let Some(visit) = &model.selected_visit {
                        caps.share.share_text(Self::share_message(visit), |result| {
                            Event::ShareFinished(Box::new(result))
                        });
                    }
                }

                Event::ShareFinished(result) => match *result {
                    Ok(_) => {}
                    Err(e) => {
                        model.set_alert(e.to_string());
                        caps.render.render();
                    }
                },

                Event::OpenImageRequested => {
                    let Some(visit) = &model.selected_visit else {
                        return;
                    };
                    let url = Gateway::new(&model.connection)
                        .map(|gateway| gateway.image_url(&visit.bird_image));
                    match url {
                        Ok(url) => {
                            let checked_url = url.clone();
                            caps.share.can_open_url(url, move |result| Event::ImageUrlChecked {
                                url: checked_url,
                                result: Box::new(result),
                            });
                        }
                        Err(e) => {
                            model.set_alert(Self::gateway_error(&e).user_facing_message());
                            caps.render.render();
                        }
                    }
                }

                Event::ImageUrlChecked { url, result } => match *result {
                    Ok(ShareOutput::CanOpen(true)) => {
                        caps.share
                            .open_url(url, |result| Event::ImageUrlOpened(Box::new(result)));
                    }
                    Ok(ShareOutput::CanOpen(false)) | Err(_) => {
                        let error = AppError::new(
                            ErrorKind::UnsupportedUrl,
                            format!("Don't know how to open this URL: {url}"),
                        );
                        model.set_alert(error.user_facing_message());
                        caps.render.render();
                    }
                    Ok(other) => {
                        tracing::warn!(?other, "unexpected reply to URL check");
                    }
                },

                Event::ImageUrlOpened(result) => {
                    if let Err(e) = *result {
                        model.set_alert(e.to_string());
                        caps.render.render();
                    }
                }

                Event::AlertDismissed => {
                    model.active_alert = None;
                    caps.render.render();
                }

                Event::SettingsScreenMounted => {
                    Self::begin_settings_load(model, caps);
                    caps.render.render();
                }

                Event::ConnectionFieldChanged { field, value } => {
                    match field {
                        ConnectionField::Host => model.connection.host = value,
                        ConnectionField::Port => model.connection.port = value,
                    }
                    Self::persist_connection_field(model, field, caps);
                    caps.render.render();
                }

                Event::ConnectionFieldLoaded { field, result } => match *result {
                    Ok(KvOutput::Value(Some(value))) => {
                        match field {
                            ConnectionField::Host => model.connection.host = value,
                            ConnectionField::Port => model.connection.port = value,
                        }
                        caps.render.render();
                    }
                    // No stored value: the defaults stand.
                    Ok(_) => {}
                    Err(e) => {
                        let error = Self::storage_error(&e);
                        tracing::warn!(code = error.kind.code(), internal = ?error.internal_message, ?field, "stored connection field unreadable");
                    }
                },

                Event::ConnectionSaved(result) => {
                    if let Err(e) = *result {
                        let error = Self::storage_error(&e);
                        tracing::warn!(code = error.kind.code(), internal = ?error.internal_message, "connection field not persisted");
                    }
                }

                Event::DeviceSettingsFetched(result) => {
                    let settings = match *result {
                        Ok(ref response) if response.is_success() => {
                            response.json::<DeviceSettings>().map_err(|e| Self::http_error(&e))
                        }
                        Ok(ref response) => Err(AppError::new(
                            ErrorKind::Network,
                            "The camera rejected the request.",
                        )
                        .with_internal(format!("status {}", response.status()))),
                        Err(ref e) => Err(Self::http_error(e)),
                    };

                    match settings {
                        Ok(settings) => {
                            model.settings_loading = false;
                            model.threshold_input = settings.threshold.to_string();
                            model.frame_count_input = settings.frame_count.to_string();
                            model.device_settings = settings;
                        }
                        Err(error) => {
                            // Log-only; the remote fields stay hidden so a
                            // blur cannot post values the device never had.
                            tracing::warn!(code = error.kind.code(), internal = ?error.internal_message, "device settings fetch failed");
                        }
                    }
                    caps.render.render();
                }

                Event::ThresholdInputChanged { text } => {
                    model.threshold_input = text;
                    caps.render.render();
                }

                Event::FrameCountInputChanged { text } => {
                    model.frame_count_input = text;
                    caps.render.render();
                }

                Event::SettingsFieldCommitted => {
                    if let Some(settings) = Self::validate_settings_inputs(model) {
                        model.device_settings = settings;
                        Self::post_device_settings(model, caps);
                    }
                    caps.render.render();
                }

                Event::DeviceSettingsPosted(result) => {
                    let failed = match *result {
                        Ok(ref response) => !response.is_success(),
                        Err(_) => true,
                    };
                    if failed {
                        // Fire-and-forget; the next settings fetch shows the truth.
                        tracing::warn!(?result, "settings update rejected by camera");
                    }
                }

                Event::PushPermissionResult(result) => match *result {
                    Ok(ref output) => {
                        if let Some(state) = output.permission_status() {
                            model.push_permission = state;
                            if state.is_authorized() {
                                caps.push.get_token(|result| {
                                    Event::PushTokenReceived(Box::new(result))
                                });
                                Self::ensure_listening(model, caps);
                            } else {
                                let code = ErrorKind::PermissionDenied.code();
                                tracing::info!(code, ?state, "push notifications declined");
                            }
                        }
                    }
                    Err(ref e) => {
                        tracing::warn!(error = %e, "push permission request failed");
                    }
                },

                Event::PushTokenReceived(result) => match *result {
                    Ok(ref output) => {
                        if let Some(token) = output.token() {
                            match Gateway::new(&model.connection)
                                .and_then(|g| g.push_token_request(token))
                            {
                                Ok(request) => {
                                    caps.http.send(request, |result| {
                                        Event::PushTokenDelivered(Box::new(result))
                                    });
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "push token not delivered");
                                }
                            }
                        }
                    }
                    Err(ref e) => {
                        tracing::warn!(error = %e, "push token unavailable");
                    }
                },

                Event::PushTokenDelivered(result) => {
                    let failed = match *result {
                        Ok(ref response) => !response.is_success(),
                        Err(_) => true,
                    };
                    if failed {
                        tracing::warn!(?result, "camera did not accept push token");
                    }
                }

                Event::PushListeningChanged(result) => match *result {
                    Ok(PushOutput::ListeningStarted) => model.push_listening = true,
                    Ok(PushOutput::ListeningStopped) => model.push_listening = false,
                    Ok(ref other) => {
                        tracing::warn!(?other, "unexpected reply to listening change");
                    }
                    Err(ref e) => {
                        model.push_listening = false;
                        tracing::warn!(error = %e, "notification listener failed");
                    }
                },

                Event::NotificationReceived(payload) => {
                    model.last_notification = Some(*payload);
                    caps.render.render();
                }

                Event::NotificationTapped(_) => {
                    // Tapping a visit notification lands on a fresh list.
                    model.last_notification = None;
                    Self::fetch_visits(model, caps);
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let image_url = |filename: &str| {
                model
                    .connection
                    .is_resolved()
                    .then(|| model.connection.image_url(filename))
            };

            let rows = model
                .visits
                .iter()
                .map(|visit| VisitRow {
                    date_time: visit.date_time.clone(),
                    identification: visit.bird_identification.clone(),
                    confidence: visit.confidence_display(),
                    image_url: image_url(&visit.bird_image),
                })
                .collect();

            let visit_list = VisitListView {
                rows,
                is_loading: model.list_status == VisitListStatus::Loading,
                error: match &model.list_status {
                    VisitListStatus::Failed { message } => Some(message.clone()),
                    _ => None,
                },
                sort: model.sort,
            };

            let detail = model.selected_visit.as_ref().map(|visit| VisitDetailView {
                date_time: visit.date_time.clone(),
                identification: visit.bird_identification.clone(),
                confidence: visit.confidence_display(),
                image_url: image_url(&visit.bird_image),
                share_message: Self::share_message(visit),
            });

            let settings = SettingsView {
                host: model.connection.host.clone(),
                port: model.connection.port.clone(),
                threshold_input: model.threshold_input.clone(),
                frame_count_input: model.frame_count_input.clone(),
                threshold_error: model.threshold_error.clone(),
                frame_count_error: model.frame_count_error.clone(),
                is_loading: model.settings_loading,
            };

            let notification_banner = model.last_notification.as_ref().map(|n| NotificationView {
                title: n.title.clone().unwrap_or_default(),
                body: n.body.clone().unwrap_or_default(),
            });

            ViewModel {
                visit_list,
                detail,
                settings,
                alert: model.active_alert.clone(),
                notification_banner,
            }
        }
    }
}
