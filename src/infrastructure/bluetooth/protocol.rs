//! Medisana BS440 Scale Protocol
//!
//! Handles, magic bytes and payload layouts for the three notification
//! characteristics, plus the refresh command written to the control handle.

use crate::domain::models::{ActivityLevel, BodyRecord, Gender, PersonRecord, WeightRecord};
use crate::error::{RecordKind, Result, ScaleError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Person (identity) notifications
pub const PERSON_HANDLE: u16 = 0x25;

/// Weight notifications
pub const WEIGHT_HANDLE: u16 = 0x1b;

/// Body composition notifications
pub const BODY_HANDLE: u16 = 0x1e;

/// Control characteristic, receives the current time to trigger a sync
pub const CONTROL_HANDLE: u16 = 0x23;

pub const PERSON_MAGIC: u8 = 0x84;
pub const WEIGHT_MAGIC: u8 = 0x1d;
pub const BODY_MAGIC: u8 = 0x6f;

pub const PERSON_PAYLOAD_LEN: usize = 9;
pub const WEIGHT_PAYLOAD_LEN: usize = 14;
pub const BODY_PAYLOAD_LEN: usize = 16;

/// Leading tag byte of the refresh command
pub const REFRESH_TAG: u8 = 0x02;

/// Only the low 12 bits of the body composition fields carry the value
const BODY_FIELD_MASK: u16 = 0x0FFF;

const GENDER_MALE: u8 = 1;
const ACTIVITY_HIGH: u8 = 3;

fn check_len(kind: RecordKind, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(ScaleError::MalformedPayload {
            kind,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Device timestamps are unsigned 32-bit, but the scale firmware and its
/// consumers treat them as a signed 32-bit `time_t`. Anything above
/// `i32::MAX` is reported as 0 (unknown).
pub fn decode_timestamp(raw: u32) -> i64 {
    i32::try_from(raw).map(i64::from).unwrap_or(0)
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn body_percent(raw: u16) -> f64 {
    f64::from(raw & BODY_FIELD_MASK) / 10.0
}

/// Decode a person notification
///
/// # Person Packet Structure (9 bytes)
///
/// ```text
/// [0] : Magic (0x84)
/// [1] : Reserved
/// [2] : Person id (1..9)
/// [3] : Reserved
/// [4] : Gender (1 = male, anything else = female)
/// [5] : Age (years)
/// [6] : Height (cm)
/// [7] : Reserved
/// [8] : Activity (3 = high, anything else = normal)
/// ```
pub fn decode_person(handle: u16, bytes: &[u8]) -> Result<PersonRecord> {
    check_len(RecordKind::Person, bytes, PERSON_PAYLOAD_LEN)?;

    let gender = if bytes[4] == GENDER_MALE {
        Gender::Male
    } else {
        Gender::Female
    };
    let activity_level = if bytes[8] == ACTIVITY_HIGH {
        ActivityLevel::High
    } else {
        ActivityLevel::Normal
    };

    Ok(PersonRecord {
        valid: handle == PERSON_HANDLE && bytes[0] == PERSON_MAGIC,
        person_id: bytes[2],
        gender,
        age: bytes[5],
        height: bytes[6],
        activity_level,
        weight_history: Vec::new(),
        body_history: Vec::new(),
    })
}

/// Decode a weight notification
///
/// # Weight Packet Structure (14 bytes)
///
/// ```text
/// [0]     : Magic (0x1d)
/// [1-2]   : Weight (u16 little-endian, 1/100 kg)
/// [3-4]   : Reserved
/// [5-8]   : Timestamp (u32 little-endian, unix seconds)
/// [9-12]  : Reserved
/// [13]    : Person id
/// ```
pub fn decode_weight(handle: u16, bytes: &[u8]) -> Result<WeightRecord> {
    check_len(RecordKind::Weight, bytes, WEIGHT_PAYLOAD_LEN)?;

    Ok(WeightRecord {
        valid: handle == WEIGHT_HANDLE && bytes[0] == WEIGHT_MAGIC,
        weight_kg: f64::from(read_u16(bytes, 1)) / 100.0,
        timestamp_unix: decode_timestamp(read_u32(bytes, 5)),
        person_id: bytes[13],
    })
}

/// Decode a body composition notification
///
/// # Body Packet Structure (16 bytes)
///
/// ```text
/// [0]     : Magic (0x6f)
/// [1-4]   : Timestamp (u32 little-endian, unix seconds)
/// [5]     : Person id
/// [6-7]   : kcal (u16 little-endian)
/// [8-9]   : Fat    (u16 little-endian, low 12 bits, 1/10 %)
/// [10-11] : Water  (u16 little-endian, low 12 bits, 1/10 %)
/// [12-13] : Muscle (u16 little-endian, low 12 bits, 1/10 %)
/// [14-15] : Bone   (u16 little-endian, low 12 bits, 1/10)
/// ```
pub fn decode_body(handle: u16, bytes: &[u8]) -> Result<BodyRecord> {
    check_len(RecordKind::Body, bytes, BODY_PAYLOAD_LEN)?;

    Ok(BodyRecord {
        valid: handle == BODY_HANDLE && bytes[0] == BODY_MAGIC,
        timestamp_unix: decode_timestamp(read_u32(bytes, 1)),
        person_id: bytes[5],
        kcal: read_u16(bytes, 6),
        fat_percent: body_percent(read_u16(bytes, 8)),
        water_percent: body_percent(read_u16(bytes, 10)),
        muscle_percent: body_percent(read_u16(bytes, 12)),
        bone_percent: body_percent(read_u16(bytes, 14)),
    })
}

/// Build the command that sets the scale clock and makes it push its
/// stored measurements: tag byte followed by `now_unix` little-endian.
pub fn build_refresh_payload(now_unix: u32) -> [u8; 5] {
    let ts = now_unix.to_le_bytes();
    [REFRESH_TAG, ts[0], ts[1], ts[2], ts[3]]
}

/// Current wall clock as unix seconds, saturating at `u32::MAX`.
pub fn current_unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
