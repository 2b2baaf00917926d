//! Session-scoped store of persons and their measurements, keyed by the
//! scale's user slot.

use crate::domain::models::{BodyRecord, PersonRecord, WeightRecord};
use crate::error::{Result, ScaleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What happens to a person's measurements when the scale announces
/// that person again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Replace the whole record, histories included
    #[default]
    Discard,
    /// Replace identity fields, keep accumulated histories
    Preserve,
}

#[derive(Debug, Default)]
pub struct PersonRegistry {
    persons: BTreeMap<u8, PersonRecord>,
    policy: HistoryPolicy,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: HistoryPolicy) -> Self {
        Self {
            persons: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Insert or replace the entry for `record.person_id`.
    pub fn upsert_person(&mut self, mut record: PersonRecord) {
        let id = record.person_id;
        if let Some(previous) = self.persons.remove(&id) {
            match self.policy {
                HistoryPolicy::Discard => {
                    debug!(
                        "Person {} replaced, dropping {} weight / {} body records",
                        id,
                        previous.weight_history.len(),
                        previous.body_history.len()
                    );
                }
                HistoryPolicy::Preserve => {
                    let mut weights = previous.weight_history;
                    weights.append(&mut record.weight_history);
                    record.weight_history = weights;

                    let mut bodies = previous.body_history;
                    bodies.append(&mut record.body_history);
                    record.body_history = bodies;
                }
            }
        }
        self.persons.insert(id, record);
    }

    /// Fails with `UnknownPerson` and leaves the registry untouched when no
    /// person record exists for the id.
    pub fn append_weight(&mut self, record: WeightRecord) -> Result<()> {
        let person = self
            .persons
            .get_mut(&record.person_id)
            .ok_or(ScaleError::UnknownPerson(record.person_id))?;
        person.weight_history.push(record);
        Ok(())
    }

    pub fn append_body(&mut self, record: BodyRecord) -> Result<()> {
        let person = self
            .persons
            .get_mut(&record.person_id)
            .ok_or(ScaleError::UnknownPerson(record.person_id))?;
        person.body_history.push(record);
        Ok(())
    }

    pub fn get(&self, person_id: u8) -> Option<&PersonRecord> {
        self.persons.get(&person_id)
    }

    /// All known persons in slot order.
    pub fn persons(&self) -> impl Iterator<Item = &PersonRecord> {
        self.persons.values()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
