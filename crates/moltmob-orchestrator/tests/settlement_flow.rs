//! Money paths: completion gating, incidents, refunds, crash recovery

use chrono::{Duration, Utc};
use moltmob_core::{GameConfig, Phase, PodStatus, Team, TxKind, TxStatus, WalletRef};
use moltmob_orchestrator::PodStore;
use moltmob_testkit::{Agent, Harness, SettleScript};

#[tokio::test]
async fn pod_is_held_open_until_payouts_resolve() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(1);
    let loys: Vec<Agent> = (0..3).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();

    // Quiet night, then the day passes.
    let t1 = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, t1).await.unwrap();
    let t2 = t1 + Duration::seconds(harness.config.day_duration_secs + 1);
    harness.orchestrator.tick(pod.id, t2).await.unwrap();

    // Everyone votes out the moltbreaker; loyalists win.
    let target = harness.player_of(pod.id, &mbs[0]).await.unwrap();
    for (i, voter) in mbs.iter().chain(loys.iter()).enumerate() {
        let text = voter.vote_text(&harness.gm_key, pod.id, 1, target.id);
        harness.feed.post_at(pod.id, text, t2 + Duration::seconds(10 + i as i64));
    }

    // The backend is down for the first settlement pass: three winner
    // shares plus the rake row all fail transiently.
    harness.backend.script([SettleScript::FailTransient; 4]);

    let t3 = t2 + Duration::seconds(120);
    harness.orchestrator.tick(pod.id, t3).await.unwrap();

    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert_eq!(pod_row.phase, Phase::Completed);
    assert_eq!(pod_row.winning_side, Some(Team::Loyalist));
    // Payouts still pending, so the pod is not closed.
    assert_eq!(pod_row.status, PodStatus::Active);

    // The backend recovers; the next tick settles and closes the pod.
    let t4 = t3 + Duration::seconds(60);
    harness.orchestrator.tick(pod.id, t4).await.unwrap();
    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert_eq!(pod_row.status, PodStatus::Completed);

    let rows = harness.tx_store.all_rows();
    assert!(rows
        .iter()
        .filter(|tx| tx.kind != TxKind::EntryFee)
        .all(|tx| tx.status == TxStatus::Confirmed));
}

#[tokio::test]
async fn abandoned_payouts_publish_an_incident_notice() {
    let mut config = GameConfig::default();
    config.settlement.max_attempts = 1;
    let harness = Harness::new(config);
    let t0 = Utc::now();
    let mbs = Harness::agents(2);
    let loys: Vec<Agent> = (0..2).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();

    // A quiet night leaves 2v2 parity standing, so the minority wins at
    // resolution. The backend rejects every transfer (two winner shares
    // plus the rake) and the single permitted attempt abandons each row.
    harness.backend.script([SettleScript::Reject; 3]);
    let past_night = t0 + Duration::seconds(harness.config.night_duration_secs + 1);
    harness.orchestrator.tick(pod.id, past_night).await.unwrap();

    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert_eq!(pod_row.phase, Phase::Completed);
    // Failed is a resolved status; the pod closes with an incident on
    // the public record.
    assert_eq!(pod_row.status, PodStatus::Completed);
    assert!(harness.feed.contains(pod.id, "Settlement incident"));

    let rows = harness.tx_store.all_rows();
    assert!(rows
        .iter()
        .filter(|tx| tx.kind != TxKind::EntryFee)
        .all(|tx| tx.status == TxStatus::Failed));
}

#[tokio::test]
async fn empty_lobby_cancels_and_refunds_entry_fees() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let pod = harness.orchestrator.open_lobby(1, t0).await.unwrap();

    // Two joins; quorum is four.
    for (i, agent) in Harness::agents(2).iter().enumerate() {
        let text = agent.join_text(&harness.gm_key, pod.id, &format!("auth-{i}"));
        harness.feed.post_at(pod.id, text, t0 + Duration::seconds(i as i64));
    }
    harness
        .orchestrator
        .tick(pod.id, t0 + Duration::seconds(10))
        .await
        .unwrap();
    assert_eq!(harness.store.players(pod.id).await.unwrap().len(), 2);

    let past_deadline = t0 + Duration::seconds(harness.config.lobby_duration_secs + 1);
    harness.orchestrator.tick(pod.id, past_deadline).await.unwrap();

    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert_eq!(pod_row.status, PodStatus::Cancelled);
    assert!(harness.feed.contains(pod.id, "never formed"));

    let refunds: Vec<_> = harness
        .tx_store
        .all_rows()
        .into_iter()
        .filter(|tx| tx.kind == TxKind::PayoutRefund)
        .collect();
    assert_eq!(refunds.len(), 2);
    assert!(refunds
        .iter()
        .all(|tx| tx.amount == harness.config.entry_fee && tx.status == TxStatus::Confirmed));
}

#[tokio::test]
async fn interrupted_completion_is_resumed_from_ledger_state() {
    let harness = Harness::with_defaults();
    let t0 = Utc::now();
    let mbs = Harness::agents(2);
    let loys: Vec<Agent> = (0..2).map(|i| Agent::new(&format!("loy-{i}"))).collect();
    let pod = harness.seeded_active_pod(&mbs, &loys, t0).await.unwrap();

    // Simulate a crash after payouts were recorded but before the
    // completing transition: the rows exist, the pod is still mid-night.
    let winners: Vec<WalletRef> = mbs.iter().map(|a| a.wallet.clone()).collect();
    harness
        .ledger
        .settle_payouts(pod.id, &winners, harness.config.rake_bps, 1, t0)
        .await
        .unwrap();

    harness
        .orchestrator
        .tick(pod.id, t0 + Duration::seconds(1))
        .await
        .unwrap();

    let pod_row = harness.store.get_pod(pod.id).await.unwrap().unwrap();
    assert_eq!(pod_row.phase, Phase::Completed);
    assert_eq!(pod_row.status, PodStatus::Completed);
    assert_eq!(pod_row.winning_side, Some(Team::Moltbreaker));

    // Recovery reused the recorded rows instead of paying twice.
    let winner_rows: Vec<_> = harness
        .tx_store
        .all_rows()
        .into_iter()
        .filter(|tx| tx.kind == TxKind::PayoutWinner)
        .collect();
    assert_eq!(winner_rows.len(), 2);
}
