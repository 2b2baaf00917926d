//! End-to-end tests: raw notifications in, accumulated person state out.

use bs440_scale::{
    build_refresh_payload, GattTransport, Notification, NotificationRouter, Routed, ScaleError,
    ScaleEvent, ScaleService, ScaleSettings, BODY_HANDLE, CONTROL_HANDLE, PERSON_HANDLE,
    WEIGHT_HANDLE,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

fn person(id: u8) -> Vec<u8> {
    vec![0x84, 0x00, id, 0x00, 0x01, 42, 178, 0x00, 0x01]
}

fn weight(id: u8, centi_kg: u16, ts: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; 14];
    bytes[0] = 0x1d;
    bytes[1..3].copy_from_slice(&centi_kg.to_le_bytes());
    bytes[5..9].copy_from_slice(&ts.to_le_bytes());
    bytes[13] = id;
    bytes
}

fn body(id: u8, ts: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; 16];
    bytes[0] = 0x6f;
    bytes[1..5].copy_from_slice(&ts.to_le_bytes());
    bytes[5] = id;
    bytes[6..8].copy_from_slice(&2100u16.to_le_bytes());
    bytes[8..10].copy_from_slice(&0xF0C8u16.to_le_bytes()); // 20.0 once masked
    bytes[10..12].copy_from_slice(&560u16.to_le_bytes());
    bytes[12..14].copy_from_slice(&380u16.to_le_bytes());
    bytes[14..16].copy_from_slice(&35u16.to_le_bytes());
    bytes
}

#[test]
fn person_then_measurements_accumulate_in_order() {
    let mut router = NotificationRouter::new();

    router.handle_notification(PERSON_HANDLE, &person(1)).unwrap();
    router
        .handle_notification(WEIGHT_HANDLE, &weight(1, 8150, 1_700_000_000))
        .unwrap();
    router
        .handle_notification(WEIGHT_HANDLE, &weight(1, 8120, 1_700_000_060))
        .unwrap();
    router
        .handle_notification(BODY_HANDLE, &body(1, 1_700_000_060))
        .unwrap();

    let p = router.get_person(1).expect("person 1 registered");
    assert_eq!(p.weight_history.len(), 2);
    assert_eq!(p.weight_history[0].weight_kg, 81.5);
    assert_eq!(p.weight_history[1].weight_kg, 81.2);
    assert_eq!(p.weight_history[1].timestamp_unix, 1_700_000_060);

    assert_eq!(p.body_history.len(), 1);
    let b = &p.body_history[0];
    assert_eq!(b.kcal, 2100);
    assert_eq!(b.fat_percent, 20.0);
    assert_eq!(b.water_percent, 56.0);
    assert_eq!(b.muscle_percent, 38.0);
    assert_eq!(b.bone_percent, 3.5);
}

#[test]
fn persons_are_kept_apart() {
    let mut router = NotificationRouter::new();
    router.handle_notification(PERSON_HANDLE, &person(1)).unwrap();
    router.handle_notification(PERSON_HANDLE, &person(2)).unwrap();
    router
        .handle_notification(WEIGHT_HANDLE, &weight(2, 6000, 1))
        .unwrap();

    assert!(router.get_person(1).unwrap().weight_history.is_empty());
    assert_eq!(router.get_person(2).unwrap().weight_history.len(), 1);
}

#[test]
fn body_for_unknown_person_is_rejected() {
    let mut router = NotificationRouter::new();
    let err = router
        .handle_notification(BODY_HANDLE, &body(7, 1))
        .unwrap_err();
    assert!(matches!(err, ScaleError::UnknownPerson(7)));
    assert!(router.registry().is_empty());
}

#[test]
fn untracked_handles_do_not_touch_state() {
    let mut router = NotificationRouter::new();
    assert_eq!(
        router.handle_notification(CONTROL_HANDLE, &[0x02, 0, 0, 0, 0]).unwrap(),
        Routed::Ignored(CONTROL_HANDLE)
    );
    assert!(router.registry().is_empty());
}

#[test]
fn refresh_payload_layout() {
    assert_eq!(build_refresh_payload(1000), [0x02, 0xE8, 0x03, 0x00, 0x00]);
}

#[derive(Clone, Default)]
struct RecordingTransport {
    writes: Arc<Mutex<Vec<(u16, Vec<u8>)>>>,
}

impl GattTransport for RecordingTransport {
    async fn write_request(&self, handle: u16, payload: &[u8]) -> bs440_scale::Result<()> {
        self.writes.lock().unwrap().push((handle, payload.to_vec()));
        Ok(())
    }

    async fn reconnect(&self) -> bs440_scale::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn service_session_with_refresh_and_stream() {
    let transport = RecordingTransport::default();
    let writes = Arc::clone(&transport.writes);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let service = ScaleService::new(transport, &ScaleSettings::default(), event_tx);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(Notification::new(PERSON_HANDLE, person(3))).unwrap();
    tx.send(Notification::new(WEIGHT_HANDLE, weight(3, 7000, 10)))
        .unwrap();
    tx.send(Notification::new(BODY_HANDLE, body(3, 10))).unwrap();
    drop(tx);

    let (refresh, ()) = tokio::join!(service.update_at(1000), service.run(rx));
    refresh.unwrap();

    assert_eq!(
        writes.lock().unwrap().as_slice(),
        &[(CONTROL_HANDLE, vec![0x02, 0xE8, 0x03, 0x00, 0x00])]
    );

    let p = service.person(3).unwrap().unwrap();
    assert_eq!(p.weight_history.len(), 1);
    assert_eq!(p.body_history.len(), 1);
    assert_eq!(service.persons().unwrap().len(), 1);

    let mut saw_refresh = false;
    let mut records = 0;
    while let Ok(event) = event_rx.try_recv() {
        match event {
            ScaleEvent::RefreshSent { now_unix } => {
                assert_eq!(now_unix, 1000);
                saw_refresh = true;
            }
            ScaleEvent::PersonUpdated(_)
            | ScaleEvent::WeightRecorded(_)
            | ScaleEvent::BodyRecorded(_) => records += 1,
            ScaleEvent::NotificationRejected { reason, .. } => panic!("rejected: {}", reason),
        }
    }
    assert!(saw_refresh);
    assert_eq!(records, 3);
}
