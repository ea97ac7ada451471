//! Hostile and malformed feed traffic
//!
//! Protocol failures are expected outcomes: the tick logs, skips, and keeps
//! going. Nothing an agent can post may abort processing for the pod.

use chrono::{Duration, Utc};
use moltmob_core::{Checkpoint, Phase, PlayerId};
use moltmob_crypto::{EnvelopeToken, EventPayload, SecureChannel};
use moltmob_orchestrator::PodStore;
use moltmob_testkit::{Agent, Harness};

#[tokio::test]
async fn wrong_recipient_message_is_skipped_and_tick_continues() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(2);
    let loys: Vec<Agent> = (0..4).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();
    let victim = harness.player_of(pod.id, &loys[0]).await.unwrap();

    // A message sealed for another agent, not the GM: it authenticates
    // under a different channel key and must fail to open.
    let misdirected = {
        let bytes = EventPayload::NightAction { target: victim.id }
            .to_bytes()
            .unwrap();
        let channel = SecureChannel::new(
            moltmob_crypto::ChannelKeyPair::generate(&mut rand_core::OsRng),
        );
        let sealed = channel
            .seal(&loys[1].verifying_key(), pod.id, 1, &bytes)
            .unwrap();
        EnvelopeToken::new(channel.keypair().verifying_key(), sealed, 1, Phase::Night).encode()
    };
    harness.feed.post_at(pod.id, misdirected, t0 + Duration::seconds(5));

    // A legitimate action arrives afterwards.
    let action = mbs[0].night_action_text(&harness.gm_key, pod.id, 1, victim.id);
    harness.feed.post_at(pod.id, action, t0 + Duration::seconds(10));

    let after_deadline = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, after_deadline).await.unwrap();

    // The bad message was skipped, the good one was applied.
    assert!(!harness
        .player_of(pod.id, &loys[0])
        .await
        .unwrap()
        .is_alive());
    let checkpoint = harness.store.get_checkpoint(pod.id).await.unwrap().unwrap();
    assert!(checkpoint.last_message.is_some());
    assert!(checkpoint.in_flight_since.is_none());
}

#[tokio::test]
async fn malformed_tokens_and_chatter_are_ignored() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(1);
    let loys: Vec<Agent> = (0..3).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();

    harness
        .feed
        .post_at(pod.id, "the water feels warm tonight", t0 + Duration::seconds(1));
    harness
        .feed
        .post_at(pod.id, "mm1:not:nearly:enough:fields", t0 + Duration::seconds(2));

    harness
        .orchestrator
        .tick(pod.id, t0 + Duration::seconds(30))
        .await
        .unwrap();

    let players = harness.store.players(pod.id).await.unwrap();
    assert!(players.iter().all(|p| p.is_alive()));
}

#[tokio::test]
async fn stale_round_action_is_discarded() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(1);
    let loys: Vec<Agent> = (0..3).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();
    let victim = harness.player_of(pod.id, &loys[0]).await.unwrap();

    // Sealed and tagged for round 2 while the pod is in round 1.
    let stale = mbs[0].night_action_text(&harness.gm_key, pod.id, 2, victim.id);
    harness.feed.post_at(pod.id, stale, t0 + Duration::seconds(5));

    let after_deadline = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, after_deadline).await.unwrap();

    // The action never registered; the night was quiet.
    assert!(harness.player_of(pod.id, &loys[0]).await.unwrap().is_alive());
    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert_eq!(pod_row.boil_meter, 1);
}

#[tokio::test]
async fn actions_from_strangers_and_loyalists_are_rejected() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(1);
    let loys: Vec<Agent> = (0..3).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();
    let victim = harness.player_of(pod.id, &loys[0]).await.unwrap();

    // A stranger who never joined.
    let stranger = Agent::new("stranger");
    let text = stranger.night_action_text(&harness.gm_key, pod.id, 1, victim.id);
    harness.feed.post_at(pod.id, text, t0 + Duration::seconds(1));

    // A loyalist has no night action to submit.
    let text = loys[1].night_action_text(&harness.gm_key, pod.id, 1, victim.id);
    harness.feed.post_at(pod.id, text, t0 + Duration::seconds(2));

    let after_deadline = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, after_deadline).await.unwrap();

    assert!(harness.player_of(pod.id, &loys[0]).await.unwrap().is_alive());
}

#[tokio::test]
async fn vote_for_a_fabricated_target_is_skipped() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(1);
    let loys: Vec<Agent> = (0..3).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();

    // A quiet night, then the day timer.
    let t1 = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, t1).await.unwrap();
    let t2 = t1 + Duration::seconds(harness.config.day_duration_secs + 1);
    harness.orchestrator.tick(pod.id, t2).await.unwrap();

    // One voter names a player that does not exist.
    let text = loys[0].vote_text(&harness.gm_key, pod.id, 1, PlayerId::new());
    harness.feed.post_at(pod.id, text, t2 + Duration::seconds(5));

    let t3 = t2 + Duration::seconds(harness.config.vote_duration_secs + 1);
    harness.orchestrator.tick(pod.id, t3).await.unwrap();

    // The vote carried no weight; the pod moved on intact.
    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert!(!pod_row.frozen);
    assert_eq!(pod_row.phase, Phase::Night);
    assert_eq!(pod_row.round, 2);
    let players = harness.store.players(pod.id).await.unwrap();
    assert!(players.iter().all(|p| p.is_alive()));
}

#[tokio::test]
async fn night_action_on_a_fabricated_target_is_skipped() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(1);
    let loys: Vec<Agent> = (0..3).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();

    let text = mbs[0].night_action_text(&harness.gm_key, pod.id, 1, PlayerId::new());
    harness.feed.post_at(pod.id, text, t0 + Duration::seconds(5));

    let after_deadline = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, after_deadline).await.unwrap();

    // Nothing registered: the night was quiet and nobody is frozen out.
    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert!(!pod_row.frozen);
    assert_eq!(pod_row.phase, Phase::Day);
    assert_eq!(pod_row.boil_meter, 1);
    let players = harness.store.players(pod.id).await.unwrap();
    assert!(players.iter().all(|p| p.is_alive()));
}

#[tokio::test]
async fn fresh_in_flight_marker_blocks_a_second_tick() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let pod = harness.orchestrator.open_lobby(1, t0).await.unwrap();
    let agent = Agent::new("joiner");
    harness.feed.post_at(
        pod.id,
        agent.join_text(&harness.gm_key, pod.id, "auth-1"),
        t0,
    );

    // Another orchestrator's tick started moments ago.
    let mut checkpoint = Checkpoint::new(pod.id, t0);
    checkpoint.in_flight_since = Some(t0 - Duration::seconds(10));
    harness.store.put_checkpoint(checkpoint).await.unwrap();

    harness.orchestrator.tick(pod.id, t0).await.unwrap();
    assert!(harness.store.players(pod.id).await.unwrap().is_empty());

    // Once the marker is stale, the tick recovers and processes.
    let later = t0 + Duration::seconds(harness.config.tick_stale_secs);
    harness.orchestrator.tick(pod.id, later).await.unwrap();
    assert_eq!(harness.store.players(pod.id).await.unwrap().len(), 1);
}
