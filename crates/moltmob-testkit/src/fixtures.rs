//! Agent fixtures and the full orchestrator harness

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::VerifyingKey;
use moltmob_core::{
    Checkpoint, GameConfig, Phase, Player, PlayerId, Pod, PodId, PodStatus, Result, Role, TxKind,
    WalletRef,
};
use moltmob_crypto::{ChannelKeyPair, EnvelopeToken, EventPayload, SecureChannel};
use moltmob_ledger::{Ledger, LedgerConfig};
use moltmob_orchestrator::{FeedPost, Orchestrator, PodStore};
use rand_core::OsRng;

use crate::feed::MemoryFeed;
use crate::payments::ScriptedBackend;
use crate::store::{MemoryPodStore, MemoryTxStore};

/// A simulated agent: a wallet keypair plus its channel endpoint
pub struct Agent {
    keys: ChannelKeyPair,
    channel: SecureChannel,
    /// The agent's wallet address
    pub wallet: WalletRef,
}

impl Agent {
    /// Create an agent with a fresh keypair and a named wallet
    pub fn new(name: &str) -> Self {
        let keys = ChannelKeyPair::generate(&mut OsRng);
        Self {
            channel: SecureChannel::new(keys.clone()),
            keys,
            wallet: WalletRef::new(format!("wallet-{name}")),
        }
    }

    /// Hex encoding of the agent's verifying key
    pub fn public_hex(&self) -> String {
        self.keys.public_hex()
    }

    /// The agent's verifying key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.keys.verifying_key()
    }

    fn seal_token(
        &self,
        gm: &VerifyingKey,
        pod: PodId,
        round: u32,
        phase: Phase,
        payload: &EventPayload,
    ) -> String {
        let bytes = payload.to_bytes().expect("payload serializes");
        let sealed = self
            .channel
            .seal(gm, pod, round, &bytes)
            .expect("sealing for the GM succeeds");
        EnvelopeToken::new(self.keys.verifying_key(), sealed, round, phase).encode()
    }

    /// Feed text for joining a lobby
    pub fn join_text(&self, gm: &VerifyingKey, pod: PodId, authorization: &str) -> String {
        self.seal_token(
            gm,
            pod,
            0,
            Phase::Lobby,
            &EventPayload::Join {
                wallet: self.wallet.as_str().to_string(),
                payment_authorization: authorization.to_string(),
            },
        )
    }

    /// Feed text for a night action
    pub fn night_action_text(
        &self,
        gm: &VerifyingKey,
        pod: PodId,
        round: u32,
        target: PlayerId,
    ) -> String {
        self.seal_token(gm, pod, round, Phase::Night, &EventPayload::NightAction { target })
    }

    /// Feed text for a vote
    pub fn vote_text(&self, gm: &VerifyingKey, pod: PodId, round: u32, target: PlayerId) -> String {
        self.seal_token(gm, pod, round, Phase::Vote, &EventPayload::Vote { target })
    }

    /// Scan feed posts for this agent's sealed role deal
    ///
    /// Deals sealed for other recipients fail authentication and are
    /// skipped, which is exactly the privacy property under test.
    pub fn role_deal(&self, gm: &VerifyingKey, pod: PodId, posts: &[FeedPost]) -> Option<Role> {
        for post in posts {
            let Some(Ok(token)) = EnvelopeToken::extract(&post.text) else {
                continue;
            };
            if token.sender != *gm {
                continue;
            }
            let Ok(bytes) = self.channel.open(gm, pod, token.round, &token.sealed) else {
                continue;
            };
            if let Ok(EventPayload::RoleAssignment { role }) = EventPayload::from_bytes(&bytes) {
                return Some(role);
            }
        }
        None
    }
}

/// A fully wired orchestrator over in-memory collaborators
pub struct Harness {
    /// The orchestrator under test
    pub orchestrator: Orchestrator,
    /// A second ledger handle over the same store, for assertions
    pub ledger: Ledger,
    /// Pod persistence
    pub store: Arc<MemoryPodStore>,
    /// The public feed
    pub feed: Arc<MemoryFeed>,
    /// Transaction rows
    pub tx_store: Arc<MemoryTxStore>,
    /// The scriptable payment backend
    pub backend: Arc<ScriptedBackend>,
    /// The GM's verifying key, for sealing agent traffic
    pub gm_key: VerifyingKey,
    /// The configuration in force
    pub config: GameConfig,
}

impl Harness {
    /// Wire up a harness with the given configuration
    pub fn new(config: GameConfig) -> Self {
        let store = Arc::new(MemoryPodStore::new());
        let feed = Arc::new(MemoryFeed::new());
        let tx_store = Arc::new(MemoryTxStore::new());
        let backend = Arc::new(ScriptedBackend::new());
        let ledger_config = LedgerConfig {
            escrow_wallet: WalletRef::new("escrow"),
            rake_wallet: WalletRef::new("rake"),
            network: "testnet".into(),
            authorization: "gm-escrow-auth".into(),
            settlement: config.settlement,
        };
        let gm_keys = ChannelKeyPair::generate(&mut OsRng);
        let gm_key = gm_keys.verifying_key();

        let orchestrator = Orchestrator::new(
            store.clone(),
            feed.clone(),
            Ledger::new(tx_store.clone(), backend.clone(), ledger_config.clone()),
            gm_keys,
            config.clone(),
        );
        let ledger = Ledger::new(tx_store.clone(), backend.clone(), ledger_config);

        Self {
            orchestrator,
            ledger,
            store,
            feed,
            tx_store,
            backend,
            gm_key,
            config,
        }
    }

    /// A harness with default configuration
    pub fn with_defaults() -> Self {
        Self::new(GameConfig::default())
    }

    /// A batch of named agents
    pub fn agents(count: usize) -> Vec<Agent> {
        (0..count).map(|i| Agent::new(&format!("agent-{i}"))).collect()
    }

    /// Seed a pod mid-game: active, first night, roles dealt, fees confirmed
    ///
    /// Bypasses the lobby so resolution scenarios can start from a known
    /// team split. Entry fees are recorded and confirmed, keeping the pot
    /// invariant intact.
    pub async fn seeded_active_pod(
        &self,
        moltbreakers: &[Agent],
        loyalists: &[Agent],
        now: DateTime<Utc>,
    ) -> Result<Pod> {
        let mut pod = Pod::new(
            1,
            self.config.entry_fee,
            now + Duration::seconds(self.config.lobby_duration_secs),
            now,
        );
        pod.status = PodStatus::Active;
        pod.phase = Phase::Night;
        pod.round = 1;
        pod.phase_deadline = Some(now + Duration::seconds(self.config.night_duration_secs));

        let cast = moltbreakers
            .iter()
            .map(|a| (a, Role::Moltbreaker))
            .chain(loyalists.iter().map(|a| (a, Role::Loyalist)));
        for (agent, role) in cast {
            let player = Player::new(pod.id, agent.public_hex(), agent.wallet.clone(), role, now);
            self.store.insert_player(player).await?;
            let fee = self
                .ledger
                .record_pending(
                    pod.id,
                    TxKind::EntryFee,
                    pod.entry_fee,
                    agent.wallet.clone(),
                    WalletRef::new("escrow"),
                    0,
                    now,
                )
                .await?;
            self.ledger
                .confirm(fee, &format!("auth-{}", agent.public_hex()))
                .await?;
        }

        pod.pot = self.ledger.compute_pot(pod.id).await?;
        self.store.insert_pod(pod.clone()).await?;
        self.store.put_checkpoint(Checkpoint::new(pod.id, now)).await?;
        Ok(pod)
    }

    /// Look up the player record backing an agent
    pub async fn player_of(&self, pod_id: PodId, agent: &Agent) -> Option<Player> {
        self.store
            .players(pod_id)
            .await
            .ok()?
            .into_iter()
            .find(|p| p.agent_key == agent.public_hex())
    }
}
