//! Host phases and primary-phase ordering

use super::{LifecycleError, Result};
use strum_macros::{Display, EnumIter};

/// A named stage in the module's lifecycle, driven by the host
///
/// The first three variants are the primary boot phases and are delivered at
/// most once each, in declaration order. The server variants repeat once per
/// server session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum Phase {
    PreInit,
    Init,
    PostInit,
    ServerAboutToStart,
    ServerStarting,
    ServerStopping,
    ServerStopped,
}

impl Phase {
    /// Whether this is one of the three boot phases
    pub fn is_primary(self) -> bool {
        matches!(self, Phase::PreInit | Phase::Init | Phase::PostInit)
    }
}

/// Where the module's boot sequence currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BootState {
    Constructed,
    PreInitialized,
    Initialized,
    PostInitialized,
    /// PreInit aborted; no further primary phase does anything
    Disabled,
}

/// Guards the PreInit → Init → PostInit order
///
/// A call is admitted only when it is the next expected primary phase.
/// Anything else is rejected with a benign [`LifecycleError`] the caller logs
/// and otherwise ignores.
#[derive(Debug)]
pub struct PhaseTracker {
    state: BootState,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            state: BootState::Constructed,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    fn expected(&self) -> Option<Phase> {
        match self.state {
            BootState::Constructed => Some(Phase::PreInit),
            BootState::PreInitialized => Some(Phase::Init),
            BootState::Initialized => Some(Phase::PostInit),
            BootState::PostInitialized | BootState::Disabled => None,
        }
    }

    /// Check that `phase` may run now without changing state
    pub fn admit(&self, phase: Phase) -> Result<()> {
        debug_assert!(phase.is_primary());
        match self.expected() {
            Some(expected) if expected == phase => Ok(()),
            Some(expected) if phase > expected => {
                Err(LifecycleError::OutOfOrder { expected, actual: phase })
            }
            _ => Err(LifecycleError::RedundantLifecycleCall(phase)),
        }
    }

    /// Record that `phase` ran to completion
    pub fn complete(&mut self, phase: Phase) {
        self.state = match phase {
            Phase::PreInit => BootState::PreInitialized,
            Phase::Init => BootState::Initialized,
            Phase::PostInit => BootState::PostInitialized,
            _ => self.state,
        };
    }

    /// Stop all further primary phases
    pub fn disable(&mut self) {
        self.state = BootState::Disabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_phases_are_ordered() {
        let phases: Vec<Phase> = Phase::iter().collect();
        let mut sorted = phases.clone();
        sorted.sort();
        assert_eq!(phases, sorted);
        assert_eq!(Phase::iter().filter(|p| p.is_primary()).count(), 3);
    }

    #[test]
    fn test_tracker_admits_in_order() {
        let mut tracker = PhaseTracker::new();
        for phase in [Phase::PreInit, Phase::Init, Phase::PostInit] {
            tracker.admit(phase).unwrap();
            tracker.complete(phase);
        }
        assert_eq!(tracker.state(), BootState::PostInitialized);
    }

    #[test]
    fn test_tracker_rejects_skips_and_repeats() {
        let mut tracker = PhaseTracker::new();
        assert!(matches!(
            tracker.admit(Phase::Init),
            Err(LifecycleError::OutOfOrder {
                expected: Phase::PreInit,
                actual: Phase::Init
            })
        ));

        tracker.complete(Phase::PreInit);
        assert!(matches!(
            tracker.admit(Phase::PreInit),
            Err(LifecycleError::RedundantLifecycleCall(Phase::PreInit))
        ));
    }

    #[test]
    fn test_disabled_tracker_admits_nothing() {
        let mut tracker = PhaseTracker::new();
        tracker.disable();
        for phase in [Phase::PreInit, Phase::Init, Phase::PostInit] {
            let err = tracker.admit(phase).unwrap_err();
            assert!(err.is_benign());
        }
        assert_eq!(tracker.state(), BootState::Disabled);
    }
}
