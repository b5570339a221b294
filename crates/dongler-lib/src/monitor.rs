//! State monitor — reports feature changes between successive reads.
//!
//! Snapshots are compared over the flat profile encoding, so any change to a
//! stored feature value is detected. Values are reported in their
//! human-readable form where the model describes the key.

use crate::dongle::UsbDongle;
use crate::profile::FlatMap;

/// One feature that changed between two reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub key: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Default)]
pub struct StateMonitor {
    last: Option<UsbDongle>,
}

fn flat(dongle: &UsbDongle) -> FlatMap {
    dongle.current_state_as_profile("").features_flat()
}

fn describe_key(dongle: &UsbDongle, flat: &FlatMap, key: &str) -> String {
    dongle
        .describe()
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .or_else(|| flat.get(key).map(ToString::to_string))
        .unwrap_or_default()
}

impl StateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` and return what changed since the last snapshot.
    ///
    /// The first snapshot, and the first one after the model changes,
    /// reports nothing.
    pub fn update(&mut self, current: UsbDongle) -> Vec<StateChange> {
        let previous = self.last.replace(current);
        let Some(previous) = previous else {
            return Vec::new();
        };
        if previous.model() != current.model() {
            log::info!("now watching {current}");
            return Vec::new();
        }

        let before = flat(&previous);
        let after = flat(&current);
        after
            .iter()
            .filter(|(key, value)| before.get(*key) != Some(*value))
            .map(|(key, _)| StateChange {
                key: key.clone(),
                old: describe_key(&previous, &before, key),
                new: describe_key(&current, &after, key),
            })
            .collect()
    }

    /// Forget the last snapshot, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<&UsbDongle> {
        self.last.as_ref()
    }
}
