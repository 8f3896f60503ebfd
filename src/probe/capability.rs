use crate::model::ProtocolVersion;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Protocol versions observed as negotiable with one target.
#[derive(Debug, Default)]
pub struct CapabilitySet {
    bits: Mutex<u8>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, protocol: ProtocolVersion) {
        *self.lock() |= protocol.bit();
    }

    pub fn contains(&self, protocol: ProtocolVersion) -> bool {
        *self.lock() & protocol.bit() != 0
    }

    pub fn snapshot(&self) -> Vec<ProtocolVersion> {
        let bits = *self.lock();
        ProtocolVersion::ALL
            .into_iter()
            .filter(|protocol| bits & protocol.bit() != 0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        *self.lock() == 0
    }

    // A panic while holding the lock cannot leave a half-written u8 behind.
    fn lock(&self) -> MutexGuard<'_, u8> {
        self.bits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromIterator<ProtocolVersion> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = ProtocolVersion>>(iter: I) -> Self {
        let set = CapabilitySet::new();
        for protocol in iter {
            set.merge(protocol);
        }
        set
    }
}
