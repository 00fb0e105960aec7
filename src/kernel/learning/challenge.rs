//! Learning challenges: sets of property values the learner must reach.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::kernel::storage::{KeyValueStore, SetOptions};

const SCOPE: &str = "challenges";
const COMPLETED_KEY: &str = "completed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// `<target>.<property>` path the requirement watches.
    pub property: String,
    pub expected: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hint: String,
    pub requirements: Vec<Requirement>,
}

impl Challenge {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            hint: String::new(),
            requirements: Vec::new(),
        }
    }

    pub fn require(mut self, property: impl Into<String>, expected: Value) -> Self {
        self.requirements.push(Requirement {
            property: property.into(),
            expected,
        });
        self
    }

    fn satisfied(&self, properties: &FxHashMap<String, Value>) -> usize {
        self.requirements
            .iter()
            .filter(|r| properties.get(&r.property) == Some(&r.expected))
            .count()
    }
}

/// Built-in challenges used when the settings file lists none.
pub fn default_challenges() -> Vec<Challenge> {
    vec![
        Challenge::new("rounded-button", "Round the primary button")
            .require("button.border-radius", json!("8px")),
        Challenge::new("centered-flex", "Center a flex container")
            .require("container.display", json!("flex"))
            .require("container.justify-content", json!("center"))
            .require("container.align-items", json!("center")),
        Challenge::new("spacious-card", "Give the card room to breathe")
            .require("card.padding", json!("24px"))
            .require("card.margin", json!("16px")),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub satisfied: usize,
    pub total: usize,
    pub completed: bool,
}

pub struct ChallengeTracker {
    challenges: Vec<Challenge>,
    properties: FxHashMap<String, Value>,
    completed: BTreeSet<String>,
}

impl ChallengeTracker {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        let mut tracker = Self {
            challenges: Vec::with_capacity(challenges.len()),
            properties: FxHashMap::default(),
            completed: BTreeSet::new(),
        };
        for challenge in challenges {
            tracker.register(challenge);
        }
        tracker
    }

    /// Adds a challenge, replacing one with the same id.
    pub fn register(&mut self, challenge: Challenge) {
        match self.challenges.iter_mut().find(|c| c.id == challenge.id) {
            Some(existing) => *existing = challenge,
            None => self.challenges.push(challenge),
        }
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    /// Restores completed ids persisted by an earlier run.
    pub fn load(&mut self, store: &mut KeyValueStore) -> usize {
        let ids: Vec<String> = store
            .scope(SCOPE)
            .get_json(COMPLETED_KEY, None)
            .unwrap_or_default();
        self.completed.extend(ids);
        self.completed.len()
    }

    /// Records the current value of `property` and returns the challenges
    /// completed by it. A challenge is reported once.
    pub fn observe(&mut self, store: &mut KeyValueStore, property: &str, value: Value) -> Vec<String> {
        self.properties.insert(property.to_string(), value);

        let newly: Vec<String> = self
            .challenges
            .iter()
            .filter(|c| !self.completed.contains(&c.id))
            .filter(|c| c.requirements.iter().any(|r| r.property == property))
            .filter(|c| c.satisfied(&self.properties) == c.requirements.len())
            .map(|c| c.id.clone())
            .collect();
        if newly.is_empty() {
            return newly;
        }

        for id in &newly {
            tracing::info!(challenge = %id, "challenge completed");
        }
        self.completed.extend(newly.iter().cloned());
        self.persist(store);
        newly
    }

    pub fn progress(&self, id: &str) -> Option<Progress> {
        let challenge = self.challenges.iter().find(|c| c.id == id)?;
        let completed = self.completed.contains(id);
        let total = challenge.requirements.len();
        Some(Progress {
            satisfied: if completed {
                total
            } else {
                challenge.satisfied(&self.properties)
            },
            total,
            completed,
        })
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Forgets observed values and completions, including the stored ones.
    pub fn reset(&mut self, store: &mut KeyValueStore) {
        self.properties.clear();
        self.completed.clear();
        store.scope(SCOPE).remove(COMPLETED_KEY, None);
    }

    fn persist(&self, store: &mut KeyValueStore) -> bool {
        let ids: Vec<&str> = self.completed().collect();
        let saved = store
            .scope(SCOPE)
            .set_json(COMPLETED_KEY, &ids, SetOptions::new());
        if !saved {
            tracing::warn!("failed to persist completed challenges");
        }
        saved
    }
}
