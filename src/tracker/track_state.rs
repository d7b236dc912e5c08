/// Track lifecycle state.
///
/// `Deleted` is only ever produced by [`TrackState::transition`]; deleted
/// tracks are dropped from the live set, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not yet confirmed
    #[default]
    Tentative,
    /// Track matched often enough to be reported
    Confirmed,
    /// Track to be removed from the live set
    Deleted,
}

/// Association outcome of a track for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    Missed,
}

/// Thresholds driving the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Hits needed to confirm a track.
    pub n_init: u32,
    /// Frames without a match a track may survive.
    pub max_age: u32,
}

impl TrackState {
    /// State a newly created track starts in.
    pub fn initial(policy: &LifecyclePolicy) -> Self {
        if policy.n_init <= 1 {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        }
    }

    /// Next state given this frame's outcome and the counters after the
    /// outcome has been applied.
    ///
    /// A tentative track dies on its first miss; a confirmed track survives
    /// until `time_since_update` exceeds `max_age`. Confirmation is one-way.
    pub fn transition(
        self,
        outcome: MatchOutcome,
        hits: u32,
        time_since_update: u32,
        policy: &LifecyclePolicy,
    ) -> Self {
        match (self, outcome) {
            (TrackState::Deleted, _) => TrackState::Deleted,
            (TrackState::Tentative, MatchOutcome::Matched) if hits >= policy.n_init => {
                TrackState::Confirmed
            }
            (state, MatchOutcome::Matched) => state,
            (_, MatchOutcome::Missed) if time_since_update > policy.max_age => TrackState::Deleted,
            (TrackState::Tentative, MatchOutcome::Missed) => TrackState::Deleted,
            (TrackState::Confirmed, MatchOutcome::Missed) => TrackState::Confirmed,
        }
    }
}
