//! Tracking of filenames currently owned by a processing attempt.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Concurrency-safe set of filenames being processed.
///
/// Cloning yields another handle to the same set. Membership is only granted
/// through [`InFlightSet::claim`], whose guard releases the name when dropped,
/// so a cancelled or panicking attempt can never leave a name stuck.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    names: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `name`. Returns `None` if it is already claimed.
    pub fn claim(&self, name: &str) -> Option<InFlightGuard> {
        if self.lock().insert(name.to_string()) {
            Some(InFlightGuard {
                set: self.clone(),
                name: name.to_string(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the set half-updated, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.names.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Ownership of one in-flight filename. Released on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    set: InFlightSet,
    name: String,
}

impl InFlightGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.name);
    }
}
