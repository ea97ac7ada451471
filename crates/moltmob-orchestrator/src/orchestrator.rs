//! The GM orchestrator
//!
//! One logical `tick` per pod: ingest feed messages since the checkpoint,
//! evaluate deadlines, resolve the phase, settle money, checkpoint. Every
//! step is idempotent, so a tick that dies anywhere can be replayed from the
//! checkpoint without double-paying or double-eliminating. Ledger writes
//! land before the phase transitions they justify; a crash between the two
//! is healed by re-deriving the transition from confirmed ledger state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moltmob_core::{
    Checkpoint, GameConfig, MobError, Phase, Player, Pod, PodId, PodStatus, Result, Role, Team,
    WalletRef,
};
use moltmob_crypto::keys::verifying_key_from_hex;
use moltmob_crypto::{ChannelError, ChannelKeyPair, EnvelopeToken, EventPayload, SecureChannel};
use moltmob_ledger::Ledger;
use moltmob_phase::{ControlEvent, PhaseEvent, PhaseMachine, TransitionReason};
use moltmob_resolution::narration;
use moltmob_resolution::{ResolutionEngine, RoundActions, SubmittedAction, SubmittedVote};
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::feed::{Feed, FeedPost};
use crate::store::PodStore;

/// Feed posts and audit rows produced during one tick
///
/// Buffered until `save`, so a tick that dies mid-resolution leaves no
/// narration or transition rows behind for the replayed tick to duplicate.
#[derive(Debug, Default)]
struct TickOutput {
    posts: Vec<String>,
    phase_events: Vec<PhaseEvent>,
    control_events: Vec<ControlEvent>,
}

/// The asynchronous game master
///
/// Holds the GM wallet keypair for the encrypted channels, the escrow
/// ledger, and the phase machinery. All external effects go through the
/// `Feed`, `PodStore`, and payment backend collaborators.
pub struct Orchestrator {
    store: Arc<dyn PodStore>,
    feed: Arc<dyn Feed>,
    ledger: Ledger,
    channel: SecureChannel,
    machine: PhaseMachine,
    engine: ResolutionEngine,
    config: GameConfig,
}

impl Orchestrator {
    /// Wire up an orchestrator
    pub fn new(
        store: Arc<dyn PodStore>,
        feed: Arc<dyn Feed>,
        ledger: Ledger,
        gm_keys: ChannelKeyPair,
        config: GameConfig,
    ) -> Self {
        Self {
            store,
            feed,
            ledger,
            channel: SecureChannel::new(gm_keys),
            machine: PhaseMachine::new(config.clone()),
            engine: ResolutionEngine::new(config.boil),
            config,
        }
    }

    /// The GM's channel endpoint, for sealing test traffic and client tools
    pub fn channel(&self) -> &SecureChannel {
        &self.channel
    }

    /// Open a new lobby pod
    pub async fn open_lobby(&self, seq: u64, now: DateTime<Utc>) -> Result<Pod> {
        let deadline = now + chrono::Duration::seconds(self.config.lobby_duration_secs);
        let pod = Pod::new(seq, self.config.entry_fee, deadline, now);
        self.store.insert_pod(pod.clone()).await?;
        self.store
            .put_checkpoint(Checkpoint::new(pod.id, now))
            .await?;
        info!(pod = %pod.id, seq, entry_fee = pod.entry_fee, "lobby opened");
        Ok(pod)
    }

    /// Run one tick for every known pod
    ///
    /// Pod failures are isolated: one pod's error is logged (and, for
    /// invariant violations, freezes that pod) without touching the rest.
    pub async fn tick_all(&self, now: DateTime<Utc>) -> Result<()> {
        for pod_id in self.store.list_pods().await? {
            if let Err(err) = self.tick(pod_id, now).await {
                error!(pod = %pod_id, %err, "tick failed; other pods unaffected");
            }
        }
        Ok(())
    }

    /// Run one logical tick for a pod
    ///
    /// An invariant violation freezes the pod before the error is returned;
    /// frozen pods take no further automatic transitions.
    pub async fn tick(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        match self.tick_inner(pod_id, now).await {
            Err(err) if err.is_invariant() => {
                error!(pod = %pod_id, %err, "invariant violation; freezing pod");
                self.freeze_pod(pod_id, now).await?;
                Err(err)
            }
            other => other,
        }
    }

    async fn tick_inner(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        let mut pod = self
            .store
            .get_pod(pod_id)
            .await?
            .ok_or_else(|| MobError::not_found(format!("pod {pod_id}")))?;

        // Cancelled pods still drive their refunds to a terminal status.
        if pod.status == PodStatus::Cancelled {
            if !self.ledger.all_payouts_resolved(pod.id).await? {
                self.drive_settlement(&mut pod).await?;
            }
            return Ok(());
        }
        if pod.is_inert() {
            debug!(pod = %pod.id, status = %pod.status, "skipping inert pod");
            return Ok(());
        }

        let mut checkpoint = self
            .store
            .get_checkpoint(pod_id)
            .await?
            .unwrap_or_else(|| Checkpoint::new(pod_id, now));
        if checkpoint.in_flight_since.is_some() {
            if !checkpoint.is_stale_in_flight(now, self.config.tick_stale_secs) {
                debug!(pod = %pod.id, "tick already in flight");
                return Ok(());
            }
            warn!(pod = %pod.id, "recovering from a tick that died in flight");
        }
        checkpoint.in_flight_since = Some(now);
        checkpoint.updated_at = now;
        self.store.put_checkpoint(checkpoint.clone()).await?;

        let mut actions: RoundActions = if checkpoint.snapshot.is_empty() {
            RoundActions::default()
        } else {
            bincode::deserialize(&checkpoint.snapshot)
                .map_err(|e| MobError::serialization(format!("checkpoint snapshot: {e}")))?
        };

        let mut players = self.store.players(pod_id).await?;
        let mut out = TickOutput::default();

        // Heal a crash that landed payouts but not the completing
        // transition: outbound rows imply a decided game.
        if pod.status == PodStatus::Active
            && !pod.phase.is_terminal()
            && self.ledger.has_outbound(pod.id).await?
        {
            if let Some(winner) = self.engine.check_win(&players, pod.boil_meter) {
                warn!(pod = %pod.id, %winner, "resuming an interrupted completion");
                let via_boil = pod.phase == Phase::Boil;
                self.finish_game(&mut pod, &players, winner, via_boil, &mut out, now)
                    .await?;
                return self.save(pod, checkpoint, &actions, out, now).await;
            }
        }

        for post in self.feed.list_since(pod_id, checkpoint.last_message).await? {
            self.ingest_post(&mut pod, &mut players, &mut actions, &post)
                .await?;
            checkpoint.last_message = Some(post.id);
        }

        match pod.phase {
            Phase::Lobby => {
                if pod.deadline_elapsed(now) {
                    if players.len() >= self.config.min_players {
                        self.begin_game(
                            &mut pod,
                            &mut players,
                            TransitionReason::LobbyQuorum,
                            &mut out,
                            now,
                        )
                        .await?;
                    } else {
                        self.cancel_lobby(&mut pod, &mut out, now).await?;
                    }
                }
            }
            Phase::Night => {
                if self.engine.all_night_actions_in(&players, &actions) {
                    self.resolve_night_phase(
                        &mut pod,
                        &mut players,
                        &actions,
                        TransitionReason::AllActionsIn,
                        &mut out,
                        now,
                    )
                    .await?;
                } else if pod.deadline_elapsed(now) {
                    self.resolve_night_phase(
                        &mut pod,
                        &mut players,
                        &actions,
                        TransitionReason::TimerElapsed,
                        &mut out,
                        now,
                    )
                    .await?;
                }
            }
            Phase::Day => {
                if pod.deadline_elapsed(now) {
                    let event =
                        self.machine
                            .advance(&mut pod, Phase::Vote, TransitionReason::TimerElapsed, now)?;
                    out.phase_events.push(event);
                }
            }
            Phase::Vote => {
                if self.engine.all_votes_in(&players, &actions) {
                    self.resolve_vote_phase(
                        &mut pod,
                        &mut players,
                        &mut actions,
                        TransitionReason::AllActionsIn,
                        &mut out,
                        now,
                    )
                    .await?;
                } else if pod.deadline_elapsed(now) {
                    self.resolve_vote_phase(
                        &mut pod,
                        &mut players,
                        &mut actions,
                        TransitionReason::TimerElapsed,
                        &mut out,
                        now,
                    )
                    .await?;
                }
            }
            // Boil resolves in the tick that entered it; nothing periodic.
            Phase::Boil => {}
            Phase::Completed => {
                self.drive_settlement(&mut pod).await?;
            }
        }

        self.save(pod, checkpoint, &actions, out, now).await
    }

    /// Persist the tick's outcome and clear the in-flight marker
    ///
    /// Buffered audit rows and feed posts land first, immediately before
    /// the checkpoint and pod writes that make the tick's transitions
    /// visible to the next replay.
    async fn save(
        &self,
        pod: Pod,
        mut checkpoint: Checkpoint,
        actions: &RoundActions,
        out: TickOutput,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.flush(pod.id, out).await?;
        checkpoint.snapshot = bincode::serialize(actions)
            .map_err(|e| MobError::serialization(format!("checkpoint snapshot: {e}")))?;
        checkpoint.in_flight_since = None;
        checkpoint.updated_at = now;
        self.store.put_checkpoint(checkpoint).await?;
        self.store.update_pod(pod).await?;
        Ok(())
    }

    /// Write out buffered audit rows and publish buffered posts
    async fn flush(&self, pod_id: PodId, out: TickOutput) -> Result<()> {
        for event in out.phase_events {
            self.store.record_phase_event(event).await?;
        }
        for event in out.control_events {
            self.store.record_control_event(event).await?;
        }
        for post in out.posts {
            self.feed.publish(pod_id, &post).await?;
        }
        Ok(())
    }

    /// Decrypt, parse, and route one feed post
    ///
    /// Protocol failures (malformed tokens, authentication failures, wrong
    /// phase, unknown senders) are logged and skipped; they never abort the
    /// tick.
    async fn ingest_post(
        &self,
        pod: &mut Pod,
        players: &mut Vec<Player>,
        actions: &mut RoundActions,
        post: &FeedPost,
    ) -> Result<()> {
        let Some(token_result) = EnvelopeToken::extract(&post.text) else {
            // Ordinary discussion.
            return Ok(());
        };
        let token = match token_result {
            Ok(token) => token,
            Err(err) => {
                warn!(pod = %pod.id, msg = %post.id, %err, "skipping malformed envelope");
                return Ok(());
            }
        };
        if token.sender == self.channel.keypair().verifying_key() {
            // Our own role deals echo back through the feed.
            return Ok(());
        }

        let plaintext = match self
            .channel
            .open(&token.sender, pod.id, token.round, &token.sealed)
        {
            Ok(plaintext) => plaintext,
            Err(ChannelError::AuthFailure) => {
                warn!(pod = %pod.id, msg = %post.id, "authentication failure; skipping message");
                return Ok(());
            }
            Err(err) => {
                warn!(pod = %pod.id, msg = %post.id, %err, "undecryptable message; skipping");
                return Ok(());
            }
        };
        let payload = match EventPayload::from_bytes(&plaintext) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(pod = %pod.id, msg = %post.id, %err, "unparseable payload; skipping");
                return Ok(());
            }
        };

        let sender_hex = hex::encode(token.sender.as_bytes());
        match payload {
            EventPayload::Join {
                wallet,
                payment_authorization,
            } => {
                self.handle_join(pod, players, sender_hex, wallet, &payment_authorization, post.at)
                    .await?;
            }
            EventPayload::NightAction { target } => {
                if pod.phase != Phase::Night {
                    warn!(pod = %pod.id, msg = %post.id, phase = %pod.phase, "night action outside the night phase");
                } else if token.round != pod.round {
                    warn!(pod = %pod.id, msg = %post.id, token_round = token.round, "night action for a stale round");
                } else if !players.iter().any(|p| p.id == target && p.is_alive()) {
                    // Agent-supplied target; anything but a living player of
                    // this pod is skipped.
                    warn!(pod = %pod.id, msg = %post.id, %target, "night action on an invalid target");
                } else {
                    match players.iter().find(|p| p.agent_key == sender_hex) {
                        Some(actor) if actor.is_alive() && actor.team() == Team::Moltbreaker => {
                            actions.record_night_action(SubmittedAction {
                                actor: actor.id,
                                target,
                                at: post.at,
                            });
                        }
                        Some(actor) => {
                            warn!(pod = %pod.id, actor = %actor.id, "night action from an ineligible player");
                        }
                        None => {
                            warn!(pod = %pod.id, msg = %post.id, "night action from an unknown sender");
                        }
                    }
                }
            }
            EventPayload::Vote { target } => {
                if pod.phase != Phase::Vote {
                    warn!(pod = %pod.id, msg = %post.id, phase = %pod.phase, "vote outside the vote phase");
                } else if token.round != pod.round {
                    warn!(pod = %pod.id, msg = %post.id, token_round = token.round, "vote for a stale round");
                } else if !players.iter().any(|p| p.id == target && p.is_alive()) {
                    warn!(pod = %pod.id, msg = %post.id, %target, "vote for an invalid target");
                } else {
                    match players.iter().find(|p| p.agent_key == sender_hex) {
                        Some(voter) if voter.is_alive() => {
                            actions.record_vote(SubmittedVote {
                                voter: voter.id,
                                target,
                                at: post.at,
                            });
                        }
                        Some(voter) => {
                            warn!(pod = %pod.id, voter = %voter.id, "vote from an eliminated player");
                        }
                        None => {
                            warn!(pod = %pod.id, msg = %post.id, "vote from an unknown sender");
                        }
                    }
                }
            }
            EventPayload::RoleAssignment { .. } => {
                warn!(pod = %pod.id, msg = %post.id, "role assignment from a non-GM sender; skipping");
            }
            EventPayload::Unrecognized { raw } => {
                warn!(pod = %pod.id, msg = %post.id, kind = %raw["kind"], "unrecognized event kind; skipping");
            }
        }
        Ok(())
    }

    /// Admit a lobby join after verifying and collecting the entry fee
    async fn handle_join(
        &self,
        pod: &mut Pod,
        players: &mut Vec<Player>,
        sender_hex: String,
        wallet: String,
        authorization: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if pod.phase != Phase::Lobby {
            warn!(pod = %pod.id, "join outside the lobby; skipping");
            return Ok(());
        }
        if players.iter().any(|p| p.agent_key == sender_hex) {
            warn!(pod = %pod.id, "duplicate join; skipping");
            return Ok(());
        }

        let wallet = WalletRef::from(wallet);
        let collected = self
            .ledger
            .collect_entry_fee(pod.id, &wallet, pod.entry_fee, authorization, pod.round, at)
            .await?;
        if collected.is_none() {
            return Ok(());
        }
        pod.pot = self.ledger.compute_pot(pod.id).await?;

        let player = Player::new(pod.id, sender_hex, wallet, Role::Loyalist, at);
        self.store.insert_player(player.clone()).await?;
        info!(pod = %pod.id, player = %player.id, joined = players.len() + 1, "player joined");
        players.push(player);
        Ok(())
    }

    /// Deal roles and move the lobby into the first night
    async fn begin_game(
        &self,
        pod: &mut Pod,
        players: &mut [Player],
        reason: TransitionReason,
        out: &mut TickOutput,
        now: DateTime<Utc>,
    ) -> Result<()> {
        // One moltbreaker per four players, at least one.
        let minority = (players.len() / 4).max(1);
        let mut order: Vec<usize> = (0..players.len()).collect();
        order.shuffle(&mut rand::thread_rng());
        for (rank, idx) in order.into_iter().enumerate() {
            players[idx].role = if rank < minority {
                Role::Moltbreaker
            } else {
                Role::Loyalist
            };
        }

        let event = self.machine.advance(pod, Phase::Night, reason, now)?;
        out.phase_events.push(event);

        // Each deal is sealed for exactly one recipient; every other agent
        // sees only an opaque token on the public feed.
        for player in players.iter() {
            self.store.update_player(player.clone()).await?;
            let peer = verifying_key_from_hex(&player.agent_key)?;
            let bytes = EventPayload::RoleAssignment { role: player.role }.to_bytes()?;
            let sealed = self.channel.seal(&peer, pod.id, pod.round, &bytes)?;
            let token = EnvelopeToken::new(
                self.channel.keypair().verifying_key(),
                sealed,
                pod.round,
                pod.phase,
            );
            out.posts.push(token.encode());
        }
        info!(pod = %pod.id, players = players.len(), minority, "game started; roles dealt");
        Ok(())
    }

    /// Cancel a lobby that failed to fill and refund every entry fee
    async fn cancel_lobby(
        &self,
        pod: &mut Pod,
        out: &mut TickOutput,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ledger.record_refunds(pod.id, pod.round, now).await?;
        let event = self.machine.cancel(pod, now)?;
        out.control_events.push(event);
        out.posts.push(narration::lobby_cancelled());
        self.drive_settlement(pod).await
    }

    async fn resolve_night_phase(
        &self,
        pod: &mut Pod,
        players: &mut [Player],
        actions: &RoundActions,
        reason: TransitionReason,
        out: &mut TickOutput,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let outcome = self.engine.resolve_night(players, actions, pod.round)?;
        if let Some(victim_id) = outcome.eliminated {
            if let Some(victim) = players.iter().find(|p| p.id == victim_id) {
                self.store.update_player(victim.clone()).await?;
            }
        }
        pod.boil_meter += outcome.boil_increment;
        out.posts.push(outcome.narration);

        if let Some(winner) = self.engine.check_win(players, pod.boil_meter) {
            let via_boil = winner == Team::Moltbreaker
                && pod.boil_meter >= self.engine.boil_policy().threshold;
            return self.finish_game(pod, players, winner, via_boil, out, now).await;
        }

        let event = self.machine.advance(pod, Phase::Day, reason, now)?;
        out.phase_events.push(event);
        Ok(())
    }

    async fn resolve_vote_phase(
        &self,
        pod: &mut Pod,
        players: &mut [Player],
        actions: &mut RoundActions,
        reason: TransitionReason,
        out: &mut TickOutput,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let outcome = self.engine.resolve_vote(players, actions, pod.round)?;
        if let Some(victim_id) = outcome.eliminated {
            if let Some(victim) = players.iter().find(|p| p.id == victim_id) {
                self.store.update_player(victim.clone()).await?;
            }
        }
        pod.boil_meter += outcome.boil_increment;
        out.posts.push(outcome.narration);

        if let Some(winner) = self.engine.check_win(players, pod.boil_meter) {
            let via_boil = winner == Team::Moltbreaker
                && pod.boil_meter >= self.engine.boil_policy().threshold;
            return self.finish_game(pod, players, winner, via_boil, out, now).await;
        }

        // Next round: actions cleared, round bumped, boil meter reset.
        actions.reset();
        let event = self.machine.advance(pod, Phase::Night, reason, now)?;
        out.phase_events.push(event);
        Ok(())
    }

    /// Record payouts, complete the game, and start settlement
    ///
    /// Payout rows land before the completing transition, so a crash in
    /// between is healed on the next tick from the outbound rows.
    async fn finish_game(
        &self,
        pod: &mut Pod,
        players: &[Player],
        winner: Team,
        via_boil: bool,
        out: &mut TickOutput,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if via_boil && pod.phase != Phase::Boil {
            let event = self
                .machine
                .advance(pod, Phase::Boil, TransitionReason::Resolution, now)?;
            out.phase_events.push(event);
            out.posts.push(narration::boil_over(pod.round));
        }

        let winners: Vec<WalletRef> = players
            .iter()
            .filter(|p| p.is_alive() && p.team() == winner)
            .map(|p| p.wallet.clone())
            .collect();
        let report = self
            .ledger
            .settle_payouts(pod.id, &winners, self.config.rake_bps, pod.round, now)
            .await?;

        let event = self
            .machine
            .complete(pod, winner, TransitionReason::Resolution, now)?;
        out.phase_events.push(event);
        pod.pot = self.ledger.compute_pot(pod.id).await?;
        out.posts.push(narration::game_over(winner, pod.pot));

        if !report.failed.is_empty() {
            warn!(pod = %pod.id, failed = report.failed.len(), "payouts abandoned; operator review required");
            out.posts.push(narration::payout_incident(report.failed.len()));
        }
        if self.ledger.all_payouts_resolved(pod.id).await? {
            pod.status = PodStatus::Completed;
            info!(pod = %pod.id, %winner, pot = pod.pot, "pod settled and closed");
        }
        Ok(())
    }

    /// Push pending outbound rows forward; close the pod when all resolve
    ///
    /// A pod is held out of its terminal status until every payout row is
    /// confirmed or failed. Rows that fail publish a public incident notice.
    async fn drive_settlement(&self, pod: &mut Pod) -> Result<()> {
        let report = self.ledger.settle_pending(pod.id).await?;
        if !report.failed.is_empty() {
            warn!(pod = %pod.id, failed = report.failed.len(), "payouts abandoned; operator review required");
            self.feed
                .publish(pod.id, &narration::payout_incident(report.failed.len()))
                .await?;
        }
        if self.ledger.all_payouts_resolved(pod.id).await? && pod.status == PodStatus::Active {
            pod.status = PodStatus::Completed;
            info!(pod = %pod.id, winner = ?pod.winning_side, pot = pod.pot, "pod settled and closed");
        }
        Ok(())
    }

    async fn freeze_pod(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        if let Some(mut pod) = self.store.get_pod(pod_id).await? {
            let event = self.machine.freeze(&mut pod, now);
            self.store.record_control_event(event).await?;
            self.store.update_pod(pod).await?;
        }
        Ok(())
    }

    // Operator surface. Each action is audited distinctly from the
    // timer-driven path.

    /// Force-start a lobby that has reached quorum
    pub async fn start(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        let mut pod = self.load(pod_id).await?;
        if pod.phase != Phase::Lobby {
            return Err(MobError::invalid(format!(
                "pod {pod_id} is not in the lobby"
            )));
        }
        let mut players = self.store.players(pod_id).await?;
        if players.len() < self.config.min_players {
            return Err(MobError::invalid(format!(
                "pod {pod_id} has {} of {} required players",
                players.len(),
                self.config.min_players
            )));
        }
        let mut out = TickOutput::default();
        self.begin_game(&mut pod, &mut players, TransitionReason::Operator, &mut out, now)
            .await?;
        let pod_id = pod.id;
        self.store.update_pod(pod).await?;
        self.flush(pod_id, out).await?;
        Ok(())
    }

    /// Suspend deadline evaluation for a pod
    pub async fn pause(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        let mut pod = self.load(pod_id).await?;
        let event = self.machine.pause(&mut pod, now)?;
        self.store.record_control_event(event).await?;
        self.store.update_pod(pod).await?;
        Ok(())
    }

    /// Resume a paused pod with its remaining phase time re-armed
    pub async fn resume(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        let mut pod = self.load(pod_id).await?;
        let event = self.machine.resume(&mut pod, now)?;
        self.store.record_control_event(event).await?;
        self.store.update_pod(pod).await?;
        Ok(())
    }

    /// Manually advance a pod along a legal transition
    pub async fn force_advance(&self, pod_id: PodId, to: Phase, now: DateTime<Utc>) -> Result<()> {
        let mut pod = self.load(pod_id).await?;
        let event = self
            .machine
            .advance(&mut pod, to, TransitionReason::Operator, now)?;
        self.store.record_phase_event(event).await?;
        self.store.update_pod(pod).await?;
        Ok(())
    }

    /// Cancel a lobby and refund every collected entry fee
    pub async fn cancel(&self, pod_id: PodId, now: DateTime<Utc>) -> Result<()> {
        let mut pod = self.load(pod_id).await?;
        let mut out = TickOutput::default();
        self.cancel_lobby(&mut pod, &mut out, now).await?;
        self.store.update_pod(pod).await?;
        self.flush(pod_id, out).await?;
        Ok(())
    }

    async fn load(&self, pod_id: PodId) -> Result<Pod> {
        self.store
            .get_pod(pod_id)
            .await?
            .ok_or_else(|| MobError::not_found(format!("pod {pod_id}")))
    }
}
