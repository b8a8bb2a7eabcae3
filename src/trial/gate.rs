// Session gate - Trial bookkeeping across launches

use super::store::{KeyValueStore, StoreResult};
use crate::config::TrialConfig;

pub const SESSION_COUNT_KEY: &str = "metronome.session_count";
pub const UPGRADED_KEY: &str = "metronome.has_upgraded";

/// Trial status for the current launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGate {
    pub session_count: u32,
    pub trial_expired: bool,
    pub has_upgraded: bool,
}

impl SessionGate {
    /// Count this launch and read the trial status
    ///
    /// Call once per application start. An unreadable counter counts as zero.
    pub fn register(store: &mut dyn KeyValueStore, trial: &TrialConfig) -> StoreResult<Self> {
        let previous = store
            .get(SESSION_COUNT_KEY)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let session_count = previous.saturating_add(1);
        store.set(SESSION_COUNT_KEY, &session_count.to_string())?;

        let has_upgraded = store.get(UPGRADED_KEY).is_some_and(|value| value == "true");

        let gate = Self {
            session_count,
            trial_expired: session_count > trial.session_limit,
            has_upgraded,
        };
        log::info!(
            "Session {} (trial expired: {}, upgraded: {})",
            gate.session_count,
            gate.trial_expired,
            gate.has_upgraded
        );
        Ok(gate)
    }

    /// Gate for a launch whose counters could not be persisted
    pub fn unrestricted() -> Self {
        Self {
            session_count: 1,
            trial_expired: false,
            has_upgraded: false,
        }
    }

    /// Sessions are limited when the trial ran out and no upgrade was bought
    pub fn is_restricted(&self) -> bool {
        self.trial_expired && !self.has_upgraded
    }

    /// Seconds of play before the slowdown ramp engages, `None` for unlimited
    pub fn slowdown_threshold(&self, trial: &TrialConfig) -> Option<u32> {
        self.is_restricted().then_some(trial.trial_seconds)
    }

    pub fn mark_upgraded(&mut self, store: &mut dyn KeyValueStore) -> StoreResult<()> {
        store.set(UPGRADED_KEY, "true")?;
        self.has_upgraded = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::store::MemoryStore;

    fn trial(limit: u32) -> TrialConfig {
        TrialConfig {
            session_limit: limit,
            trial_seconds: 10,
            slowdown_step: 5,
        }
    }

    #[test]
    fn test_counter_increments_per_register() {
        let mut store = MemoryStore::new();
        let config = trial(3);
        for expected in 1..=3 {
            let gate = SessionGate::register(&mut store, &config).unwrap();
            assert_eq!(gate.session_count, expected);
            assert!(!gate.trial_expired);
        }
        let gate = SessionGate::register(&mut store, &config).unwrap();
        assert_eq!(gate.session_count, 4);
        assert!(gate.trial_expired);
        assert_eq!(gate.slowdown_threshold(&config), Some(10));
    }

    #[test]
    fn test_corrupt_counter_restarts() {
        let mut store = MemoryStore::new();
        store.set(SESSION_COUNT_KEY, "garbage").unwrap();
        let gate = SessionGate::register(&mut store, &trial(3)).unwrap();
        assert_eq!(gate.session_count, 1);
    }

    #[test]
    fn test_upgrade_lifts_restriction() {
        let mut store = MemoryStore::new();
        store.set(SESSION_COUNT_KEY, "10").unwrap();
        let config = trial(3);

        let mut gate = SessionGate::register(&mut store, &config).unwrap();
        assert!(gate.is_restricted());

        gate.mark_upgraded(&mut store).unwrap();
        assert!(!gate.is_restricted());
        assert_eq!(gate.slowdown_threshold(&config), None);

        // The flag survives the next launch
        let gate = SessionGate::register(&mut store, &config).unwrap();
        assert!(gate.has_upgraded);
        assert!(!gate.is_restricted());
    }

    #[test]
    fn test_unrestricted_gate() {
        let gate = SessionGate::unrestricted();
        assert_eq!(gate.slowdown_threshold(&trial(0)), None);
    }
}
