//! Decoder and session state for Medisana BS440 compatible BLE scales.
//!
//! The scale publishes three kinds of GATT notifications: person
//! (identity), weight and body composition. [`NotificationRouter`] decodes
//! each one and files it under the person slot it belongs to. Writing the
//! current time to the control handle ([`build_refresh_payload`]) makes the
//! scale push its stored measurements.
//!
//! The BLE link is not part of this crate. Feed notifications in through
//! [`NotificationRouter::handle_notification`] or [`ScaleService::run`], and
//! implement [`GattTransport`] for the outbound write.

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::models::{
    ActivityLevel, BodyRecord, Gender, Notification, PersonRecord, ScaleEvent, WeightRecord,
};
pub use domain::registry::{HistoryPolicy, PersonRegistry};
pub use domain::settings::{LogSettings, ScaleSettings, SettingsService};
pub use error::{RecordKind, Result, ScaleError};
pub use infrastructure::bluetooth::protocol::{
    build_refresh_payload, current_unix_time, decode_body, decode_person, decode_weight,
    BODY_HANDLE, CONTROL_HANDLE, PERSON_HANDLE, WEIGHT_HANDLE,
};
pub use infrastructure::bluetooth::router::{NotificationRouter, Routed};
pub use infrastructure::bluetooth::{GattTransport, ScaleService};
pub use infrastructure::logging::{init_logger, LoggingGuard};
