//! Configuration structures
//!
//! Slot tables are configuration, not persisted entities: a deployment
//! defines its fixed daily windows once and the engine treats them as
//! immutable input. `Config` is what the infra loader deserializes from
//! environment variables or a config file.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_API_TIMEOUT_SECS, RETRY_BACKOFF_UNIT_MS, RETRY_MAX_ATTEMPTS, SLOT_AFTERNOON_ID,
    SLOT_MORNING_ID,
};
use crate::types::{SlotId, TimeSlot};

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration could not be loaded: {0}")]
    Load(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub slots: SlotCatalog,
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            slots: SlotCatalog::default(),
            retry: RetrySettings::default(),
        }
    }
}

/// Booking-service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            timeout_seconds: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Retry policy settings for transient failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff_unit_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: RETRY_MAX_ATTEMPTS, backoff_unit_ms: RETRY_BACKOFF_UNIT_MS }
    }
}

/// Ordered, validated table of the fixed daily time slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotCatalog {
    slots: Vec<TimeSlot>,
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self {
            slots: vec![
                TimeSlot {
                    id: SlotId::new(SLOT_MORNING_ID),
                    label: "Morning".to_string(),
                    start: hm(9, 0),
                    end: hm(13, 0),
                },
                TimeSlot {
                    id: SlotId::new(SLOT_AFTERNOON_ID),
                    label: "Afternoon".to_string(),
                    start: hm(14, 0),
                    end: hm(18, 0),
                },
            ],
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl SlotCatalog {
    /// Build a catalog from explicit slot definitions, validating them.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a slot has an empty label, a
    /// window where `start >= end`, a duplicate id, or a window overlapping
    /// another slot's.
    pub fn new(slots: Vec<TimeSlot>) -> Result<Self, ConfigError> {
        let catalog = Self { slots };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate the slot table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for slot in &self.slots {
            if slot.label.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("slot {} has an empty label", slot.id)));
            }
            if slot.start >= slot.end {
                return Err(ConfigError::Invalid(format!(
                    "slot {} has a non-positive window ({} >= {})",
                    slot.id, slot.start, slot.end
                )));
            }
        }

        for (i, a) in self.slots.iter().enumerate() {
            for b in &self.slots[i + 1..] {
                if a.id == b.id {
                    return Err(ConfigError::Invalid(format!("duplicate slot id: {}", a.id)));
                }
                // Half-open windows: touching boundaries are fine.
                if a.start < b.end && b.start < a.end {
                    return Err(ConfigError::Invalid(format!(
                        "slots {} and {} overlap",
                        a.id, b.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Look up a slot by id.
    pub fn get(&self, slot_id: &SlotId) -> Option<&TimeSlot> {
        self.slots.iter().find(|s| &s.id == slot_id)
    }

    /// Whether the id references a known slot.
    pub fn contains(&self, slot_id: &SlotId) -> bool {
        self.get(slot_id).is_some()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
