//! Live tunable parameters shared between the editing console and bodies.
//!
//! A [`ParameterGroup`] is an ordered list of floats guarded by a mutex and
//! stamped with a version that grows on every effective write. Bodies poll the
//! version once per update and regenerate when it moved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Number of craters to place.
pub const CRATER_COUNT: usize = 0;
/// How many of the first craters may receive a decal.
pub const WANTED_TEXTURES: usize = 1;
/// Minimum angular spacing (radians) between textured craters.
pub const MAX_TEXTURE_RADIUS: usize = 2;
pub const MIN_CRATER_RADIUS: usize = 3;
pub const MAX_CRATER_RADIUS: usize = 4;
pub const CRATER_DEPTH: usize = 5;
pub const RIM_HEIGHT: usize = 6;
pub const NOISE_AMPLITUDE: usize = 7;
pub const NOISE_FREQUENCY: usize = 8;

/// Display names for the well-known indices.
pub const PARAMETER_NAMES: [&str; 9] = [
    "crater count",
    "wanted textures",
    "max texture radius",
    "min crater radius",
    "max crater radius",
    "crater depth",
    "rim height",
    "noise amplitude",
    "noise frequency",
];

/// Upper bound on parameters forwarded to the terrain shader.
pub const MAX_PARAMETERS: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("group '{group}' has {len} parameters, index {index} is out of range")]
    IndexOutOfRange {
        group: String,
        index: usize,
        len: usize,
    },

    #[error("parameter values must be finite, got {0}")]
    NonFinite(f32),

    #[error("a group holds at most {MAX_PARAMETERS} parameters, got {0}")]
    TooMany(usize),
}

/// Consistent copy of a group taken under a single lock acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub values: Vec<f32>,
    pub version: u64,
}

impl ParameterSnapshot {
    /// Value at `index`, or 0.0 when the group is shorter.
    pub fn get(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }
}

#[derive(Debug)]
struct GroupState {
    values: Vec<f32>,
    version: u64,
}

/// Named, mutex-guarded parameter list.
#[derive(Debug)]
pub struct ParameterGroup {
    name: String,
    state: Mutex<GroupState>,
}

impl ParameterGroup {
    pub fn new(name: impl Into<String>, values: Vec<f32>) -> Result<Self, ParameterError> {
        if values.len() > MAX_PARAMETERS {
            return Err(ParameterError::TooMany(values.len()));
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ParameterError::NonFinite(bad));
        }
        Ok(Self {
            name: name.into(),
            state: Mutex::new(GroupState { values, version: 0 }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        let state = self.lock();
        ParameterSnapshot {
            values: state.values.clone(),
            version: state.version,
        }
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.lock().values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Overwrite one value. Returns whether the stored value changed; the
    /// version only advances when it did.
    pub fn set(&self, index: usize, value: f32) -> Result<bool, ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NonFinite(value));
        }
        let mut state = self.lock();
        let len = state.values.len();
        let slot = state
            .values
            .get_mut(index)
            .ok_or_else(|| ParameterError::IndexOutOfRange {
                group: self.name.clone(),
                index,
                len,
            })?;
        if *slot == value {
            return Ok(false);
        }
        *slot = value;
        state.version += 1;
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, GroupState> {
        // Every write leaves the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of parameter groups by name.
#[derive(Debug, Default)]
pub struct ParameterManager {
    groups: Mutex<HashMap<String, Arc<ParameterGroup>>>,
}

impl ParameterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group, replacing any group with the same name.
    pub fn insert(&self, group: ParameterGroup) -> Arc<ParameterGroup> {
        let group = Arc::new(group);
        self.lock()
            .insert(group.name().to_string(), Arc::clone(&group));
        group
    }

    pub fn group(&self, name: &str) -> Option<Arc<ParameterGroup>> {
        self.lock().get(name).cloned()
    }

    /// Group names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<ParameterGroup>>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn moon() -> ParameterGroup {
        ParameterGroup::new("Moon", vec![100.0, 10.0, 0.3]).unwrap()
    }

    #[test]
    fn test_snapshot_reflects_values_and_version() {
        let group = moon();
        let snap = group.snapshot();
        assert_eq!(snap.values, vec![100.0, 10.0, 0.3]);
        assert_eq!(snap.version, 0);
        assert_eq!(snap.get(CRATER_COUNT), 100.0);
        assert_eq!(snap.get(40), 0.0);
    }

    #[test]
    fn test_set_bumps_version_only_on_change() {
        let group = moon();
        assert!(group.set(0, 50.0).unwrap());
        assert_eq!(group.version(), 1);
        assert!(!group.set(0, 50.0).unwrap());
        assert_eq!(group.version(), 1);
        assert_eq!(group.get(0), Some(50.0));
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let group = moon();
        assert!(matches!(
            group.set(3, 1.0),
            Err(ParameterError::IndexOutOfRange { index: 3, len: 3, .. })
        ));
        assert!(matches!(
            group.set(0, f32::NAN),
            Err(ParameterError::NonFinite(v)) if v.is_nan()
        ));
        assert_eq!(group.version(), 0);
    }

    #[test]
    fn test_new_rejects_oversized_and_non_finite() {
        assert!(matches!(
            ParameterGroup::new("big", vec![0.0; MAX_PARAMETERS + 1]),
            Err(ParameterError::TooMany(_))
        ));
        assert!(matches!(
            ParameterGroup::new("inf", vec![f32::INFINITY]),
            Err(ParameterError::NonFinite(_))
        ));
    }

    #[test]
    fn test_concurrent_writers_are_all_counted() {
        let group = Arc::new(ParameterGroup::new("g", vec![0.0; 4]).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let group = Arc::clone(&group);
                thread::spawn(move || {
                    for step in 1..=100 {
                        group.set(i, step as f32).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(group.version(), 400);
        assert_eq!(group.snapshot().values, vec![100.0; 4]);
    }

    #[test]
    fn test_manager_lookup() {
        let manager = ParameterManager::new();
        manager.insert(moon());
        manager.insert(ParameterGroup::new("Planet", vec![1.0]).unwrap());
        assert_eq!(manager.names(), vec!["Moon".to_string(), "Planet".to_string()]);
        assert_eq!(manager.group("Moon").unwrap().get(1), Some(10.0));
        assert!(manager.group("Sun").is_none());
    }

    #[test]
    fn test_manager_hands_out_shared_groups() {
        let manager = ParameterManager::new();
        let held = manager.insert(moon());
        manager.group("Moon").unwrap().set(2, 0.5).unwrap();
        assert_eq!(held.get(2), Some(0.5));
        assert_eq!(held.version(), 1);
    }
}
