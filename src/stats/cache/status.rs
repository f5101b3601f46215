//! Storage statuses with EMA-smoothed aliveness
//!
//! Every storage carries two scores: the potential aliveness (as if every
//! observed operation had succeeded) and the actual aliveness. A storage is
//! alive when the actual score reaches `alive_limit` of the potential one.

use super::key::Key;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

// =============================================================================
// EMA Parameters
// =============================================================================

/// Parameters of the exponential moving average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaParams {
    /// Share of the potential aliveness the actual one must reach
    pub alive_limit: f64,
    /// Smoothing factor applied to every operation result
    pub alpha: f64,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self {
            alive_limit: 0.95,
            alpha: 0.04,
        }
    }
}

impl EmaParams {
    /// Both values must lie in the open range (0, 1)
    pub fn validate(&self) -> Result<()> {
        let ensure_between_0_and_1 = |val: f64, param: &str| {
            if val <= 0.0 || val >= 1.0 {
                return Err(Error::Configuration(format!(
                    "{param} is expected to be in range (0, 1), got {val}"
                )));
            }
            Ok(())
        };
        ensure_between_0_and_1(self.alive_limit, "alive limit")?;
        ensure_between_0_and_1(self.alpha, "EMA alpha")
    }
}

fn exp_moving_average(alpha: f64, prev_average: f64, new_value: f64) -> f64 {
    alpha * new_value + (1.0 - alpha) * prev_average
}

// =============================================================================
// Storage Status
// =============================================================================

/// Cached aliveness of a single storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStatus {
    pub potential_aliveness: f64,
    pub actual_aliveness: f64,
    /// Last hard verdict, used while the status has no weighted history
    #[serde(default)]
    pub previous_aliveness: bool,
    pub updated: DateTime<Utc>,
}

impl StorageStatus {
    /// Status right after an explicit check with the given verdict
    pub fn checked(alive: bool, weight: f64, check_time: DateTime<Utc>) -> Self {
        Self {
            potential_aliveness: weight,
            actual_aliveness: if alive { weight } else { 0.0 },
            previous_aliveness: alive,
            updated: check_time,
        }
    }

    /// Check if the status has just been initialized
    pub fn has_no_data(&self) -> bool {
        self.potential_aliveness == 0.0 && self.actual_aliveness == 0.0
    }

    /// Aliveness verdict
    pub fn alive(&self, params: &EmaParams) -> bool {
        if self.has_no_data() {
            return self.previous_aliveness;
        }
        self.actual_aliveness >= params.alive_limit * self.potential_aliveness
    }

    /// Check if the status was updated within `ttl` before `now`
    pub fn is_relevant(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.updated).to_std() {
            Ok(age) => age <= ttl,
            // updated in the future
            Err(_) => true,
        }
    }

    /// Hard reset after an explicit check
    pub fn apply_explicit_check_result(&self, alive: bool, check_time: DateTime<Utc>) -> Self {
        Self {
            potential_aliveness: self.potential_aliveness,
            actual_aliveness: if alive { self.potential_aliveness } else { 0.0 },
            previous_aliveness: alive,
            updated: check_time,
        }
    }

    /// EMA update after an ordinary operation
    pub fn apply_operation_result(
        &self,
        params: &EmaParams,
        alive: bool,
        weight: f64,
        check_time: DateTime<Utc>,
    ) -> Self {
        let alpha = params.alpha;
        let actual_target = if alive { weight } else { 0.0 };
        Self {
            potential_aliveness: exp_moving_average(alpha, self.potential_aliveness, weight),
            actual_aliveness: exp_moving_average(alpha, self.actual_aliveness, actual_target),
            previous_aliveness: self.alive(params),
            updated: check_time,
        }
    }
}

// =============================================================================
// Alive Map
// =============================================================================

/// Storage name -> aliveness verdict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliveMap(HashMap<String, bool>);

impl AliveMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, alive: bool) {
        self.0.insert(name.into(), alive);
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.0.iter()
    }

    /// Names in arbitrary order
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Check if any storage is alive
    pub fn any_alive(&self) -> bool {
        self.0.values().any(|alive| *alive)
    }

    /// First alive name following `order`
    ///
    /// Stops at the first name that is not in the map: an unknown storage
    /// before an alive one must not be skipped.
    pub fn first_alive(&self, order: &[String]) -> Option<String> {
        for name in order {
            match self.0.get(name) {
                Some(true) => return Some(name.clone()),
                Some(false) => continue,
                None => return None,
            }
        }
        None
    }

    /// All alive names following `order`
    pub fn alive_names(&self, order: &[String]) -> Vec<String> {
        order
            .iter()
            .filter(|name| self.get(name) == Some(true))
            .cloned()
            .collect()
    }

    /// Names from `order` that are present in the map
    pub fn present_names(&self, order: &[String]) -> Vec<String> {
        order
            .iter()
            .filter(|name| self.contains(name))
            .cloned()
            .collect()
    }

    /// Overlay another map onto this one
    pub fn extend(&mut self, other: AliveMap) {
        self.0.extend(other.0);
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for AliveMap {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// =============================================================================
// Storage Statuses
// =============================================================================

/// Key -> status, the content of every cache tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageStatuses(HashMap<Key, StorageStatus>);

impl StorageStatuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Key) -> Option<&StorageStatus> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: Key, status: StorageStatus) {
        self.0.insert(key, status);
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &StorageStatus)> {
        self.0.iter()
    }

    /// Status of `key`, a fresh one if it was never seen
    pub fn status_or_default(&self, key: &Key) -> StorageStatus {
        self.0.get(key).cloned().unwrap_or_default()
    }

    /// Check if every key is present and updated within `ttl`
    pub fn is_relevant(&self, ttl: Duration, keys: &[Key], now: DateTime<Utc>) -> bool {
        if self.0.is_empty() {
            return false;
        }
        keys.iter().all(|key| {
            self.0
                .get(key)
                .map(|status| status.is_relevant(ttl, now))
                .unwrap_or(false)
        })
    }

    /// Split `keys` into relevant and outdated statuses
    ///
    /// Keys without a status end up outdated with a fresh status.
    pub fn split_by_relevance(
        &self,
        ttl: Duration,
        keys: &[Key],
        now: DateTime<Utc>,
    ) -> (StorageStatuses, StorageStatuses) {
        let mut relevant = StorageStatuses::new();
        let mut outdated = StorageStatuses::new();
        for key in keys {
            match self.0.get(key) {
                Some(status) if status.is_relevant(ttl, now) => {
                    relevant.insert(key.clone(), status.clone());
                }
                Some(status) => outdated.insert(key.clone(), status.clone()),
                None => outdated.insert(key.clone(), StorageStatus::default()),
            }
        }
        (relevant, outdated)
    }

    /// Keep only the given keys
    pub fn filter(&self, keys: &[Key]) -> StorageStatuses {
        Self(
            keys.iter()
                .filter_map(|key| self.0.get(key).map(|s| (key.clone(), s.clone())))
                .collect(),
        )
    }

    /// Project to name -> verdict
    pub fn alive_map(&self, params: &EmaParams) -> AliveMap {
        self.0
            .iter()
            .map(|(key, status)| (key.name.clone(), status.alive(params)))
            .collect()
    }

    /// Hard-reset the statuses of the checked keys
    pub fn apply_explicit_check_result(
        &mut self,
        check_result: &HashMap<Key, bool>,
        check_time: DateTime<Utc>,
    ) {
        for (key, alive) in check_result {
            let status = self
                .status_or_default(key)
                .apply_explicit_check_result(*alive, check_time);
            self.0.insert(key.clone(), status);
        }
    }

    /// Merge two views, per key the status updated last wins
    pub fn merge_by_relevance(a: &StorageStatuses, b: &StorageStatuses) -> StorageStatuses {
        let mut result = a.clone();
        for (key, status) in &b.0 {
            let newer = match result.0.get(key) {
                Some(existing) => status.updated > existing.updated,
                None => true,
            };
            if newer {
                result.0.insert(key.clone(), status.clone());
            }
        }
        result
    }
}

impl FromIterator<(Key, StorageStatus)> for StorageStatuses {
    fn from_iter<I: IntoIterator<Item = (Key, StorageStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for StorageStatuses {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let sorted: BTreeMap<String, &StorageStatus> =
            self.0.iter().map(|(k, v)| (k.to_string(), v)).collect();
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (key, status) in sorted {
            map.serialize_entry(&key, status)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StorageStatuses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = HashMap::<String, StorageStatus>::deserialize(deserializer)?;
        let mut statuses = StorageStatuses::new();
        for (raw_key, status) in raw {
            match Key::parse(&raw_key) {
                Some(key) => statuses.insert(key, status),
                None => tracing::warn!(key = %raw_key, "Skipping malformed status cache key"),
            }
        }
        Ok(statuses)
    }
}

// =============================================================================
// Tests
// =============================================================================
