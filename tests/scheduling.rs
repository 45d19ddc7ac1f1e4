//! Integration tests for the scheduling assistant.
//!
//! These tests drive the assistant through the app container:
//! - in-memory stores for fast, deterministic runs
//! - the MessagePack store for persistence across invocations

mod common;

use common::{USER, at, challenge_days, date, linear_history};
use nudge::{
    adapters::{InMemoryStore, MsgPackStore, StoreSnapshot},
    app::{App, AssistantConfig},
    assistant::{DayState, IdleReason, ScheduleOutcome},
    challenge::ChallengeLayout,
    ports::ChallengeStore,
};
use tempfile::TempDir;

fn seeded_store(config: &AssistantConfig, n_days: usize) -> InMemoryStore {
    let store = InMemoryStore::new();
    let discretizer = config.discretizer().unwrap();
    store.add_challenges(
        USER,
        challenge_days(&config.layout, &discretizer, date(2024, 4, 1), n_days),
    );
    store
}

#[test]
fn second_call_on_the_same_day_is_a_noop() {
    let config = AssistantConfig::default();
    let store = seeded_store(&config, 1);
    let app = App::for_testing()
        .with_store(store.clone())
        .with_config(config)
        .build();
    let assistant = app.assistant().unwrap();

    let first = assistant
        .update_beliefs(USER, &at("2024-04-01T06:00:00+00:00"))
        .unwrap();
    let decision = first.decision().unwrap();
    assert_eq!(decision.n_candidates, 2);
    assert_eq!(decision.t_idx, 6);
    let scheduled = store.challenges(USER).unwrap();
    let begin_t = assistant.discretizer().timestep_of(&scheduled[0].begin);
    assert!((8..10).contains(&begin_t));
    assert_eq!(scheduled[0].server_tag, Some(decision.server_tag));

    let second = assistant
        .update_beliefs(USER, &at("2024-04-01T06:30:00+00:00"))
        .unwrap();
    assert_eq!(second, ScheduleOutcome::Idle(IdleReason::AlreadyDecided));
    assert_eq!(store.challenges(USER).unwrap(), scheduled);
    assert_eq!(store.decision_count(), 1);
}

#[test]
fn every_day_gets_its_own_decision() {
    let config = AssistantConfig::default();
    let store = seeded_store(&config, 3);
    let assistant = App::for_testing()
        .with_store(store.clone())
        .with_config(config)
        .build()
        .assistant()
        .unwrap();

    for day in 1..=3 {
        let now = at(&format!("2024-04-0{day}T05:00:00+00:00"));
        assert!(assistant.update_beliefs(USER, &now).unwrap().is_scheduled());
    }
    assert_eq!(store.decision_count(), 3);
    assert_eq!(
        assistant
            .day_state(USER, &at("2024-04-04T05:00:00+00:00"))
            .unwrap(),
        DayState::Idle(IdleReason::NoChallengesToday)
    );
}

#[test]
fn past_days_are_counted_as_observations() {
    let config = AssistantConfig::default();
    let store = InMemoryStore::new();
    let discretizer = config.discretizer().unwrap();
    store.add_challenges(
        USER,
        challenge_days(&config.layout, &discretizer, date(2024, 4, 4), 1),
    );
    store.add_step_records(USER, linear_history(&discretizer, date(2024, 4, 1), 3, 7200));
    let assistant = App::for_testing()
        .with_store(store)
        .with_config(config)
        .build()
        .assistant()
        .unwrap();

    let now = at("2024-04-04T02:00:00+00:00");
    let counts = assistant.pseudo_counts(USER, &now).unwrap();
    assert_eq!(counts.observation_count(), 3 * 24);
    let outcome = assistant.update_beliefs(USER, &now).unwrap();
    assert_eq!(outcome.decision().unwrap().n_observations, 3 * 24);
}

#[test]
fn opened_offers_keep_their_times() {
    let layout = ChallengeLayout {
        challenges_per_day: 2,
        ..ChallengeLayout::default()
    };
    let config = AssistantConfig::default().with_layout(layout);
    let store = seeded_store(&config, 1);
    let before = store.challenges(USER).unwrap();
    let assistant = App::for_testing()
        .with_store(store.clone())
        .with_config(config)
        .build()
        .assistant()
        .unwrap();

    let outcome = assistant
        .update_beliefs(USER, &at("2024-04-01T07:30:00+00:00"))
        .unwrap();
    let ScheduleOutcome::Scheduled { decision, updates } = outcome else {
        panic!("expected a schedule");
    };
    assert_eq!(decision.n_candidates, 2);
    assert_eq!(decision.action_plan[8], 1);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, before[1].id);

    let after = store.challenges(USER).unwrap();
    assert_eq!(after[0], before[0]);
    let begin_t = assistant.discretizer().timestep_of(&after[1].begin);
    assert!((11..13).contains(&begin_t));
}

#[test]
fn schedule_persists_in_msgpack_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.msgpack");
    let config = AssistantConfig::default();
    let discretizer = config.discretizer().unwrap();

    let mut snapshot = StoreSnapshot::default();
    snapshot.ensure_user(USER).challenges =
        challenge_days(&config.layout, &discretizer, date(2024, 4, 1), 1);
    MsgPackStore::new(&path).save(&snapshot).unwrap();

    let app = App::with_store_file(&path, config);
    let now = at("2024-04-01T03:00:00+00:00");
    let outcome = app.assistant().unwrap().update_beliefs(USER, &now).unwrap();
    assert!(outcome.is_scheduled());

    let reloaded = MsgPackStore::new(&path).load().unwrap();
    let record = reloaded.user(USER).unwrap();
    assert_eq!(record.decisions.len(), 1);
    assert!(record.challenges[0].server_tag.is_some());

    let again = app.assistant().unwrap().update_beliefs(USER, &now).unwrap();
    assert_eq!(again, ScheduleOutcome::Idle(IdleReason::AlreadyDecided));
}
