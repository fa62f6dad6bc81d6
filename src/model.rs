use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::capabilities::{NotificationPayload, PermissionState};
use crate::{DEFAULT_CAMERA_HOST, DEFAULT_CAMERA_PORT, DEFAULT_FRAME_COUNT, DEFAULT_THRESHOLD};

/// One recorded detection event at the camera. Immutable once fetched;
/// identified only by position in the fetched list (the device assigns no
/// stable ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub date_time: String,
    pub bird_identification: String,
    /// Capture image filename, served from the device's static path.
    pub bird_image: String,
    #[serde(deserialize_with = "coerce_confidence")]
    pub identification_confidence: f64,
}

impl VisitRecord {
    /// The device reports confidence either as a 0..=100 integer derived
    /// from the capture filename or as a 0..=1 float; normalize to a
    /// fraction for display.
    #[must_use]
    pub fn confidence_fraction(&self) -> f64 {
        let c = self.identification_confidence;
        if !c.is_finite() || c < 0.0 {
            return 0.0;
        }
        if c > 1.0 {
            c / 100.0
        } else {
            c
        }
    }

    #[must_use]
    pub fn confidence_display(&self) -> String {
        format!("{:.2}", self.confidence_fraction())
    }
}

/// Accepts the confidence as a JSON number or a numeric string; the device
/// has produced both over its lifetime.
fn coerce_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("confidence is not numeric: {e}"))),
    }
}

/// Remote device configuration, mirrored as-is from `GET /settings` and
/// pushed back by `POST /settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    pub threshold: f64,
    #[serde(rename = "frameCount")]
    pub frame_count: i64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            frame_count: DEFAULT_FRAME_COUNT,
        }
    }
}

/// Where to find the camera device. Persisted locally; never sent to the
/// device itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
}

impl ConnectionConfig {
    /// Both values present; gateway calls require this.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.host.trim().is_empty() && !self.port.trim().is_empty()
    }

    /// Recomputed on every call so a settings edit takes effect on the
    /// next request rather than a cached session.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/static/birdcaptures/{}", self.base_url(), filename)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CAMERA_HOST.to_string(),
            port: DEFAULT_CAMERA_PORT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    Timestamp,
    Identification,
    Image,
}

impl SortColumn {
    pub const ALL: [Self; 3] = [Self::Timestamp, Self::Identification, Self::Image];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::Identification => "Identification",
            Self::Image => "Image",
        }
    }

    #[must_use]
    pub fn key<'a>(self, record: &'a VisitRecord) -> &'a str {
        match self {
            Self::Timestamp => &record.date_time,
            Self::Identification => &record.bird_identification,
            Self::Image => &record.bird_image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortState {
    /// First tap on a column sorts descending (what the original client
    /// lands on); tapping the active column again flips the direction.
    #[must_use]
    pub fn tapped(current: Option<Self>, column: SortColumn) -> Self {
        match current {
            Some(state) if state.column == column => Self {
                column,
                direction: state.direction.flipped(),
            },
            _ => Self {
                column,
                direction: SortDirection::Desc,
            },
        }
    }
}

/// A failed fetch is distinct from "no visits yet"; the last known list is
/// retained in either case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VisitListStatus {
    #[default]
    Loading,
    Loaded,
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub connection: ConnectionConfig,

    // Visit list
    pub visits_screen_active: bool,
    pub visits: Vec<VisitRecord>,
    pub list_status: VisitListStatus,
    pub sort: Option<SortState>,
    /// Bumped on every fetch and on screen unmount; responses carrying a
    /// stale generation are dropped.
    pub fetch_generation: u64,

    // Detail
    pub selected_visit: Option<VisitRecord>,

    // Settings screen
    pub device_settings: DeviceSettings,
    pub settings_loading: bool,
    pub threshold_input: String,
    pub frame_count_input: String,
    pub threshold_error: Option<String>,
    pub frame_count_error: Option<String>,

    // Push
    pub push_permission: PermissionState,
    pub push_registration_started: bool,
    pub push_listening: bool,
    pub last_notification: Option<NotificationPayload>,

    // The single user-visible error surface.
    pub active_alert: Option<String>,
}

impl Model {
    /// Stable re-ordering of the current list under the active sort; ties
    /// keep their relative input order.
    pub fn apply_sort(&mut self) {
        let Some(SortState { column, direction }) = self.sort else {
            return;
        };

        self.visits.sort_by(|a, b| {
            let ordering = column.key(a).cmp(column.key(b));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    pub fn set_alert(&mut self, message: impl Into<String>) {
        self.active_alert = Some(message.into());
    }

    #[must_use]
    pub fn compare_for(sort: SortState, a: &VisitRecord, b: &VisitRecord) -> Ordering {
        let ordering = sort.column.key(a).cmp(sort.column.key(b));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
