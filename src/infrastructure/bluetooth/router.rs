//! Notification Router
//!
//! Single entry point for inbound notifications. Picks the decoder by
//! handle and applies the result to the router's own registry.

use crate::domain::models::PersonRecord;
use crate::domain::registry::{HistoryPolicy, PersonRegistry};
use crate::error::Result;
use crate::infrastructure::bluetooth::protocol::{
    self, BODY_HANDLE, PERSON_HANDLE, WEIGHT_HANDLE,
};
use tracing::{debug, trace, warn};

/// What a notification was applied as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Person(u8),
    Weight(u8),
    Body(u8),
    /// Handle outside the tracked set
    Ignored(u16),
}

#[derive(Debug, Default)]
pub struct NotificationRouter {
    registry: PersonRegistry,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: HistoryPolicy) -> Self {
        Self {
            registry: PersonRegistry::with_policy(policy),
        }
    }

    /// Decode `payload` according to `handle` and update the registry.
    ///
    /// Untrusted (`valid == false`) records are stored like any other.
    /// Decode and lookup failures are returned without touching the
    /// registry.
    pub fn handle_notification(&mut self, handle: u16, payload: &[u8]) -> Result<Routed> {
        trace!("Notification on {:#04x}: {:02X?}", handle, payload);

        match handle {
            PERSON_HANDLE => {
                let record = protocol::decode_person(handle, payload)?;
                let id = record.person_id;
                if !record.valid {
                    warn!("Person record {} failed magic check", id);
                }
                debug!(
                    "Person {}: {:?}, {} y, {} cm, activity {:?}",
                    id, record.gender, record.age, record.height, record.activity_level
                );
                self.registry.upsert_person(record);
                Ok(Routed::Person(id))
            }
            WEIGHT_HANDLE => {
                let record = protocol::decode_weight(handle, payload)?;
                let id = record.person_id;
                if !record.valid {
                    warn!("Weight record for person {} failed magic check", id);
                }
                debug!(
                    "Weight for person {}: {:.2} kg at {}",
                    id, record.weight_kg, record.timestamp_unix
                );
                self.registry.append_weight(record)?;
                Ok(Routed::Weight(id))
            }
            BODY_HANDLE => {
                let record = protocol::decode_body(handle, payload)?;
                let id = record.person_id;
                if !record.valid {
                    warn!("Body record for person {} failed magic check", id);
                }
                debug!(
                    "Body for person {}: fat {:.1}%, water {:.1}%, muscle {:.1}%, bone {:.1}, {} kcal",
                    id,
                    record.fat_percent,
                    record.water_percent,
                    record.muscle_percent,
                    record.bone_percent,
                    record.kcal
                );
                self.registry.append_body(record)?;
                Ok(Routed::Body(id))
            }
            other => {
                debug!("Ignoring notification on untracked handle {:#04x}", other);
                Ok(Routed::Ignored(other))
            }
        }
    }

    pub fn get_person(&self, person_id: u8) -> Option<&PersonRecord> {
        self.registry.get(person_id)
    }

    pub fn registry(&self) -> &PersonRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScaleError;

    fn person_payload(id: u8, age: u8) -> Vec<u8> {
        vec![0x84, 0x00, id, 0x00, 0x02, age, 170, 0x00, 0x00]
    }

    fn weight_payload(id: u8, raw: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; 14];
        bytes[0] = 0x1d;
        bytes[1..3].copy_from_slice(&raw.to_le_bytes());
        bytes[5..9].copy_from_slice(&1_600_000_000u32.to_le_bytes());
        bytes[13] = id;
        bytes
    }

    fn body_payload(id: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; 16];
        bytes[0] = 0x6f;
        bytes[1..5].copy_from_slice(&1_600_000_000u32.to_le_bytes());
        bytes[5] = id;
        bytes[8..10].copy_from_slice(&250u16.to_le_bytes());
        bytes
    }

    #[test]
    fn test_routes_by_handle() {
        let mut router = NotificationRouter::new();
        assert_eq!(
            router.handle_notification(PERSON_HANDLE, &person_payload(3, 40)).unwrap(),
            Routed::Person(3)
        );
        assert_eq!(
            router.handle_notification(WEIGHT_HANDLE, &weight_payload(3, 7250)).unwrap(),
            Routed::Weight(3)
        );
        assert_eq!(
            router.handle_notification(BODY_HANDLE, &body_payload(3)).unwrap(),
            Routed::Body(3)
        );

        let p = router.get_person(3).unwrap();
        assert_eq!(p.age, 40);
        assert_eq!(p.weight_history[0].weight_kg, 72.5);
        assert_eq!(p.body_history[0].fat_percent, 25.0);
    }

    #[test]
    fn test_untracked_handle_ignored() {
        let mut router = NotificationRouter::new();
        let routed = router.handle_notification(0x40, &person_payload(1, 20)).unwrap();
        assert_eq!(routed, Routed::Ignored(0x40));
        assert!(router.registry().is_empty());
    }

    #[test]
    fn test_weight_before_person_is_unknown() {
        let mut router = NotificationRouter::new();
        let err = router
            .handle_notification(WEIGHT_HANDLE, &weight_payload(1, 8000))
            .unwrap_err();
        assert!(matches!(err, ScaleError::UnknownPerson(1)));
        assert!(router.get_person(1).is_none());
    }

    #[test]
    fn test_short_payload_leaves_registry_alone() {
        let mut router = NotificationRouter::new();
        router.handle_notification(PERSON_HANDLE, &person_payload(1, 20)).unwrap();
        let err = router
            .handle_notification(BODY_HANDLE, &body_payload(1)[..10])
            .unwrap_err();
        assert!(matches!(err, ScaleError::MalformedPayload { .. }));
        assert!(router.get_person(1).unwrap().body_history.is_empty());
    }

    #[test]
    fn test_invalid_magic_still_stored() {
        let mut router = NotificationRouter::new();
        router.handle_notification(PERSON_HANDLE, &person_payload(1, 20)).unwrap();
        let mut bytes = weight_payload(1, 6000);
        bytes[0] = 0x1e;
        router.handle_notification(WEIGHT_HANDLE, &bytes).unwrap();

        let w = &router.get_person(1).unwrap().weight_history[0];
        assert!(!w.valid);
        assert_eq!(w.weight_kg, 60.0);
    }

    #[test]
    fn test_resync_discards_history_by_default() {
        let mut router = NotificationRouter::new();
        router.handle_notification(PERSON_HANDLE, &person_payload(1, 20)).unwrap();
        router.handle_notification(WEIGHT_HANDLE, &weight_payload(1, 6000)).unwrap();
        router.handle_notification(PERSON_HANDLE, &person_payload(1, 21)).unwrap();

        let p = router.get_person(1).unwrap();
        assert_eq!(p.age, 21);
        assert!(p.weight_history.is_empty());
    }

    #[test]
    fn test_resync_preserves_history_when_configured() {
        let mut router = NotificationRouter::with_policy(HistoryPolicy::Preserve);
        router.handle_notification(PERSON_HANDLE, &person_payload(1, 20)).unwrap();
        router.handle_notification(WEIGHT_HANDLE, &weight_payload(1, 6000)).unwrap();
        router.handle_notification(PERSON_HANDLE, &person_payload(1, 21)).unwrap();

        let p = router.get_person(1).unwrap();
        assert_eq!(p.age, 21);
        assert_eq!(p.weight_history.len(), 1);
    }
}
