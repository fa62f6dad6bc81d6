//! Key-value capability over the shell's persistent string store
//! (AsyncStorage on React Native shells, UserDefaults/SharedPreferences on
//! native ones). The client persists exactly two entries: the camera host
//! and port.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crux_core::capability::{CapabilityContext, Operation};

/// Storage key for the camera host, kept byte-identical to the key the
/// original client wrote so upgrades keep their saved address.
pub const CAMERA_HOST_KEY: &str = "cameraIP";
/// Storage key for the camera port.
pub const CAMERA_PORT_KEY: &str = "cameraPort";

pub const MAX_KEY_LENGTH: usize = 128;
pub const MAX_VALUE_LENGTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvKey(String);

impl KvKey {
    pub fn new(key: impl Into<String>) -> Result<Self, KvError> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(KvError::InvalidKey {
                key,
                reason: "key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(KvError::InvalidKey {
                key: key.chars().take(50).collect(),
                reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
            });
        }

        if key.chars().any(|c| c.is_control()) {
            return Err(KvError::InvalidKey {
                key,
                reason: "key contains control characters".to_string(),
            });
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOperation {
    Read { key: KvKey },
    Write { key: KvKey, value: String },
}

impl Operation for KvOperation {
    type Output = KvResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value exceeds maximum length of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOutput {
    /// `None` when the key has never been written.
    Value(Option<String>),
    Written,
}

pub type KvResult = Result<KvOutput, KvError>;

#[derive(crux_core::macros::Capability)]
pub struct KeyValue<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> KeyValue<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn read<F>(&self, key: KvKey, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(KvOperation::Read { key }).await;
            context.update_app(make_event(result));
        });
    }

    pub fn write<F>(&self, key: KvKey, value: String, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = if value.len() > MAX_VALUE_LENGTH {
                Err(KvError::ValueTooLarge {
                    size: value.len(),
                    max: MAX_VALUE_LENGTH,
                })
            } else {
                context
                    .request_from_shell(KvOperation::Write { key, value })
                    .await
            };
            context.update_app(make_event(result));
        });
    }
}
