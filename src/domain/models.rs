use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Normal,
    High,
}

/// Identity of one user slot on the scale, plus everything measured for
/// that slot during the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Handle and magic byte both matched
    pub valid: bool,
    /// Scale user slot (1..9)
    pub person_id: u8,
    pub gender: Gender,
    /// Years
    pub age: u8,
    /// Centimetres
    pub height: u8,
    pub activity_level: ActivityLevel,

    // Append-only, arrival order
    pub weight_history: Vec<WeightRecord>,
    pub body_history: Vec<BodyRecord>,
}

impl PersonRecord {
    pub fn latest_weight(&self) -> Option<&WeightRecord> {
        self.weight_history.last()
    }

    pub fn latest_body(&self) -> Option<&BodyRecord> {
        self.body_history.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub valid: bool,
    pub weight_kg: f64,
    /// Unix seconds, 0 when the device sent a value outside `i32` range
    pub timestamp_unix: i64,
    pub person_id: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub valid: bool,
    /// Unix seconds, 0 when the device sent a value outside `i32` range
    pub timestamp_unix: i64,
    pub person_id: u8,
    pub kcal: u16,

    // Percentages, low 12 bits of the raw field / 10
    pub fat_percent: f64,
    pub water_percent: f64,
    pub muscle_percent: f64,
    pub bone_percent: f64,
}

/// One inbound GATT notification as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub handle: u16,
    pub payload: Vec<u8>,
}

impl Notification {
    pub fn new(handle: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            handle,
            payload: payload.into(),
        }
    }
}

/// Events published by the scale service to the application.
#[derive(Debug, Clone)]
pub enum ScaleEvent {
    PersonUpdated(PersonRecord),
    WeightRecorded(WeightRecord),
    BodyRecorded(BodyRecord),
    NotificationRejected { handle: u16, reason: String },
    RefreshSent { now_unix: u32 },
}
