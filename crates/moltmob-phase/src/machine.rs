//! Transition rules and bookkeeping
//!
//! The machine mutates a `Pod` in place and returns the audit event for the
//! caller to persist. Illegal transitions are invariant violations; the
//! orchestrator freezes the pod when it sees one.

use chrono::{DateTime, Duration, Utc};
use moltmob_core::{GameConfig, MobError, Phase, Pod, PodStatus, Result, Team};
use tracing::{debug, info};

use crate::events::{ControlAction, ControlEvent, PhaseEvent, TransitionReason};

/// Whether `from -> to` appears in the phase cycle
///
/// Night can exit straight to boil or completed: a night elimination can
/// reach team parity, and a quiet night can push the meter over the
/// threshold, without waiting for a vote.
pub fn is_legal_transition(from: Phase, to: Phase) -> bool {
    matches!(
        (from, to),
        (Phase::Lobby, Phase::Night)
            | (Phase::Night, Phase::Day)
            | (Phase::Night, Phase::Boil)
            | (Phase::Night, Phase::Completed)
            | (Phase::Day, Phase::Vote)
            | (Phase::Vote, Phase::Night)
            | (Phase::Vote, Phase::Boil)
            | (Phase::Vote, Phase::Completed)
            | (Phase::Boil, Phase::Completed)
    )
}

/// The pod lifecycle state machine
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    config: GameConfig,
}

impl PhaseMachine {
    /// Create a machine with the given phase durations
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    /// The configured length of a phase, if it has a timer
    pub fn phase_duration(&self, phase: Phase) -> Option<Duration> {
        let secs = match phase {
            Phase::Lobby => self.config.lobby_duration_secs,
            Phase::Night => self.config.night_duration_secs,
            Phase::Day => self.config.day_duration_secs,
            Phase::Vote => self.config.vote_duration_secs,
            // Boil resolves within the same tick; completed has no timer.
            Phase::Boil | Phase::Completed => return None,
        };
        Some(Duration::seconds(secs))
    }

    /// Advance the pod to a new phase
    ///
    /// Applies round/boil/deadline bookkeeping and returns the transition
    /// event. Rejects illegal jumps, terminal pods, and paused pods.
    pub fn advance(
        &self,
        pod: &mut Pod,
        to: Phase,
        reason: TransitionReason,
        now: DateTime<Utc>,
    ) -> Result<PhaseEvent> {
        if pod.is_terminal() {
            return Err(MobError::invariant(format!(
                "pod {} is terminal ({})",
                pod.id, pod.status
            )));
        }
        if pod.status == PodStatus::Paused {
            return Err(MobError::invariant(format!(
                "pod {} is paused; resume before advancing",
                pod.id
            )));
        }
        let from = pod.phase;
        if !is_legal_transition(from, to) {
            return Err(MobError::invariant(format!(
                "illegal phase transition {from} -> {to} for pod {}",
                pod.id
            )));
        }

        match (from, to) {
            (Phase::Lobby, Phase::Night) => {
                pod.status = PodStatus::Active;
                pod.round = 1;
            }
            (Phase::Vote, Phase::Night) => {
                // Round increments only on the vote -> night wraparound.
                pod.round += 1;
                pod.boil_meter = 0;
            }
            _ => {}
        }

        pod.phase = to;
        pod.phase_deadline = self.phase_duration(to).map(|d| now + d);

        let event = PhaseEvent {
            pod_id: pod.id,
            from,
            to,
            round: pod.round,
            reason,
            at: now,
        };
        info!(pod = %pod.id, %from, %to, round = pod.round, ?reason, "phase transition");
        Ok(event)
    }

    /// Complete the game with a winning side
    pub fn complete(
        &self,
        pod: &mut Pod,
        winner: Team,
        reason: TransitionReason,
        now: DateTime<Utc>,
    ) -> Result<PhaseEvent> {
        let event = self.advance(pod, Phase::Completed, reason, now)?;
        pod.winning_side = Some(winner);
        Ok(event)
    }

    /// Cancel a lobby that failed to fill
    pub fn cancel(&self, pod: &mut Pod, now: DateTime<Utc>) -> Result<ControlEvent> {
        if pod.status != PodStatus::Lobby {
            return Err(MobError::invariant(format!(
                "only lobby pods can be cancelled; pod {} is {}",
                pod.id, pod.status
            )));
        }
        pod.status = PodStatus::Cancelled;
        pod.phase_deadline = None;
        info!(pod = %pod.id, "lobby cancelled");
        Ok(ControlEvent {
            pod_id: pod.id,
            action: ControlAction::Cancel,
            phase: pod.phase,
            round: pod.round,
            at: now,
        })
    }

    /// Suspend deadline evaluation
    ///
    /// Phase and round are untouched; the pause moment is recorded so
    /// resume can re-arm the deadline with the remaining time.
    pub fn pause(&self, pod: &mut Pod, now: DateTime<Utc>) -> Result<ControlEvent> {
        if pod.status != PodStatus::Active && pod.status != PodStatus::Lobby {
            return Err(MobError::invariant(format!(
                "cannot pause pod {} in status {}",
                pod.id, pod.status
            )));
        }
        pod.paused_at = Some(now);
        pod.status = PodStatus::Paused;
        debug!(pod = %pod.id, phase = %pod.phase, "paused");
        Ok(ControlEvent {
            pod_id: pod.id,
            action: ControlAction::Pause,
            phase: pod.phase,
            round: pod.round,
            at: now,
        })
    }

    /// Resume a paused pod, preserving the remaining phase time
    pub fn resume(&self, pod: &mut Pod, now: DateTime<Utc>) -> Result<ControlEvent> {
        if pod.status != PodStatus::Paused {
            return Err(MobError::invariant(format!(
                "cannot resume pod {} in status {}",
                pod.id, pod.status
            )));
        }
        if let (Some(deadline), Some(paused_at)) = (pod.phase_deadline, pod.paused_at) {
            let remaining = (deadline - paused_at).max(Duration::zero());
            pod.phase_deadline = Some(now + remaining);
        }
        pod.paused_at = None;
        pod.status = if pod.phase == Phase::Lobby {
            PodStatus::Lobby
        } else {
            PodStatus::Active
        };
        debug!(pod = %pod.id, phase = %pod.phase, "resumed");
        Ok(ControlEvent {
            pod_id: pod.id,
            action: ControlAction::Resume,
            phase: pod.phase,
            round: pod.round,
            at: now,
        })
    }

    /// Freeze a pod after an invariant violation
    ///
    /// No further automatic transitions run until an operator clears the
    /// flag out of band.
    pub fn freeze(&self, pod: &mut Pod, now: DateTime<Utc>) -> ControlEvent {
        pod.frozen = true;
        ControlEvent {
            pod_id: pod.id,
            action: ControlAction::Freeze,
            phase: pod.phase,
            round: pod.round,
            at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn machine() -> PhaseMachine {
        PhaseMachine::new(GameConfig::default())
    }

    fn lobby_pod(now: DateTime<Utc>) -> Pod {
        Pod::new(1, 100, now + Duration::seconds(3600), now)
    }

    #[test]
    fn full_cycle_is_legal() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);

        m.advance(&mut pod, Phase::Night, TransitionReason::LobbyQuorum, now)
            .unwrap();
        assert_eq!(pod.status, PodStatus::Active);
        assert_eq!(pod.round, 1);

        m.advance(&mut pod, Phase::Day, TransitionReason::AllActionsIn, now)
            .unwrap();
        m.advance(&mut pod, Phase::Vote, TransitionReason::TimerElapsed, now)
            .unwrap();
        let wrap = m
            .advance(&mut pod, Phase::Night, TransitionReason::Resolution, now)
            .unwrap();
        assert_eq!(pod.round, 2);
        assert_eq!(wrap.round, 2);
    }

    #[test]
    fn illegal_jump_is_invariant_violation() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);

        assert_matches!(
            m.advance(&mut pod, Phase::Vote, TransitionReason::Operator, now),
            Err(MobError::Invariant { .. })
        );
        // Pod untouched by the failed transition.
        assert_eq!(pod.phase, Phase::Lobby);
    }

    #[test]
    fn no_backward_transitions() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);
        m.advance(&mut pod, Phase::Night, TransitionReason::LobbyQuorum, now)
            .unwrap();
        m.advance(&mut pod, Phase::Day, TransitionReason::TimerElapsed, now)
            .unwrap();

        assert!(!is_legal_transition(Phase::Day, Phase::Night));
        assert_matches!(
            m.advance(&mut pod, Phase::Night, TransitionReason::Operator, now),
            Err(MobError::Invariant { .. })
        );
    }

    #[test]
    fn vote_round_wrap_resets_boil_meter() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);
        m.advance(&mut pod, Phase::Night, TransitionReason::LobbyQuorum, now)
            .unwrap();
        m.advance(&mut pod, Phase::Day, TransitionReason::TimerElapsed, now)
            .unwrap();
        m.advance(&mut pod, Phase::Vote, TransitionReason::TimerElapsed, now)
            .unwrap();
        pod.boil_meter = 2;
        m.advance(&mut pod, Phase::Night, TransitionReason::Resolution, now)
            .unwrap();
        assert_eq!(pod.boil_meter, 0);
    }

    #[test]
    fn pause_preserves_remaining_time() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);
        m.advance(&mut pod, Phase::Night, TransitionReason::LobbyQuorum, now)
            .unwrap();
        let deadline = pod.phase_deadline.unwrap();

        // Pause halfway through the night.
        let pause_at = deadline - Duration::seconds(900);
        m.pause(&mut pod, pause_at).unwrap();
        assert_eq!(pod.phase, Phase::Night);
        assert!(!pod.deadline_elapsed(deadline + Duration::seconds(1)));

        // Resume much later; 900 seconds remain on the clock.
        let resume_at = deadline + Duration::seconds(10_000);
        m.resume(&mut pod, resume_at).unwrap();
        assert_eq!(pod.status, PodStatus::Active);
        assert_eq!(pod.phase_deadline, Some(resume_at + Duration::seconds(900)));
    }

    #[test]
    fn terminal_pods_reject_everything() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);
        m.cancel(&mut pod, now).unwrap();

        assert_matches!(
            m.advance(&mut pod, Phase::Night, TransitionReason::Operator, now),
            Err(MobError::Invariant { .. })
        );
        assert_matches!(m.pause(&mut pod, now), Err(MobError::Invariant { .. }));
    }

    #[test]
    fn completion_records_winner() {
        let now = Utc::now();
        let m = machine();
        let mut pod = lobby_pod(now);
        m.advance(&mut pod, Phase::Night, TransitionReason::LobbyQuorum, now)
            .unwrap();
        m.advance(&mut pod, Phase::Day, TransitionReason::TimerElapsed, now)
            .unwrap();
        m.advance(&mut pod, Phase::Vote, TransitionReason::TimerElapsed, now)
            .unwrap();
        m.complete(&mut pod, Team::Moltbreaker, TransitionReason::Resolution, now)
            .unwrap();
        assert_eq!(pod.phase, Phase::Completed);
        assert_eq!(pod.winning_side, Some(Team::Moltbreaker));
        assert_eq!(pod.phase_deadline, None);
    }
}
