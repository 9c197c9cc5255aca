use obsnav_navigator::Position;
use obsnav_navigator::ResortPolicy;
use obsnav_protocol::Direction;
use obsnav_protocol::Observation;
use pretty_assertions::assert_eq;

use crate::suite::support::Call;
use crate::suite::support::FakeSource;
use crate::suite::support::Harness;
use crate::suite::support::oid;

#[tokio::test]
async fn load_count_shows_the_first_record() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);

    navigator.load_count().await;

    assert_eq!(navigator.position(), Position::new(0, 5));
    assert_eq!(navigator.position().label().as_deref(), Some("1 of 5"));
    let record = navigator.record();
    assert_eq!(record.id, Some(oid(0)));
    assert_eq!(record.tags, vec!["fresh".to_string()]);
    assert_eq!(record.attributes_pre.as_deref(), Some("attributes of obs-0"));
    assert!(!navigator.is_loading());
    assert!(!navigator.has_query_error());
    assert_eq!(harness.attributes.managed(), Some(oid(0)));
    assert_eq!(harness.tags.managed(), Some(oid(0)));
}

#[tokio::test]
async fn stepping_wraps_around_both_ends() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;

    navigator.previous().await;
    assert_eq!(navigator.position().index(), 4);
    assert_eq!(navigator.record().id, Some(oid(4)));

    navigator.next().await;
    assert_eq!(navigator.position().index(), 0);
    assert_eq!(navigator.record().id, Some(oid(0)));

    navigator.last().await;
    navigator.previous().await;
    assert_eq!(navigator.position().index(), 3);

    navigator.first().await;
    assert_eq!(navigator.record().id, Some(oid(0)));
    assert_eq!(harness.tags.managed(), Some(oid(0)));
}

#[tokio::test]
async fn random_stays_inside_the_set() {
    let harness = Harness::new(FakeSource::with_records(3));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;

    for _ in 0..20 {
        navigator.random().await;
        let position = navigator.position();
        assert!(position.index() < 3);
        assert_eq!(navigator.record().id, Some(oid(position.index())));
    }
}

#[tokio::test]
async fn empty_set_clears_the_record_and_ignores_movement() {
    let harness = Harness::new(FakeSource::with_records(0));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);

    navigator.load_count().await;
    assert_eq!(navigator.position(), Position::default());
    assert_eq!(navigator.record(), &Observation::default());
    assert!(!navigator.is_loading());

    harness.source.clear_calls();
    navigator.next().await;
    navigator.previous().await;
    navigator.first().await;
    navigator.last().await;
    navigator.random().await;
    assert_eq!(harness.source.calls(), Vec::new());
}

#[tokio::test]
async fn filter_matching_nothing_clears_a_shown_record() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    assert_eq!(navigator.record().id, Some(oid(0)));

    harness.query.set_search("no-such-record");
    navigator.load_count().await;

    assert_eq!(navigator.position().count(), 0);
    assert_eq!(navigator.record(), &Observation::default());
    // The collaborators stay attached until the navigator is disposed.
    assert_eq!(harness.tags.managed(), Some(oid(0)));
}

#[tokio::test]
async fn shrunken_set_recovers_with_one_recount() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    navigator.last().await;
    assert_eq!(navigator.position(), Position::new(4, 5));

    harness.source.truncate(3);
    harness.source.clear_calls();
    navigator.lookup_id().await;

    assert_eq!(navigator.position(), Position::new(2, 3));
    assert_eq!(navigator.record().id, Some(oid(2)));
    assert!(!navigator.has_query_error());
    let calls = harness.source.calls();
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, Call::Count { .. }))
            .count(),
        1
    );
    assert_eq!(calls[0], Call::IdentifierAt(4));
    assert!(calls.contains(&Call::IdentifierAt(2)));
}

#[tokio::test]
async fn set_emptied_under_the_cursor_clears_the_record() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    navigator.last().await;

    harness.source.truncate(0);
    harness.source.clear_calls();
    navigator.lookup_id().await;

    assert_eq!(navigator.position(), Position::default());
    assert_eq!(navigator.record(), &Observation::default());
    assert!(!navigator.is_loading());
    assert!(!navigator.has_query_error());
    assert_eq!(
        harness.source.calls(),
        vec![
            Call::IdentifierAt(4),
            Call::Count {
                session: navigator.session(),
                search: String::new(),
            },
        ]
    );
}

#[tokio::test]
async fn persistent_out_of_range_flags_the_query_instead_of_looping() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    navigator.last().await;

    // The server keeps claiming five records but only three resolve.
    harness.source.truncate(3);
    harness.source.report_count(Some(5));
    harness.source.clear_calls();
    navigator.lookup_id().await;

    assert!(navigator.has_query_error());
    assert!(!navigator.is_loading());
    assert_eq!(navigator.record().id, Some(oid(4)));
    assert_eq!(
        harness.source.calls(),
        vec![
            Call::IdentifierAt(4),
            Call::Count {
                session: navigator.session(),
                search: String::new(),
            },
            Call::IndexOf(oid(4)),
            Call::IdentifierAt(4),
        ]
    );
}

#[tokio::test]
async fn failed_count_raises_the_query_error_until_a_count_succeeds() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;

    harness.source.fail_count(true);
    navigator.load_count().await;
    assert!(navigator.has_query_error());
    assert!(!navigator.is_loading());
    assert_eq!(navigator.record().id, Some(oid(0)));

    harness.source.fail_count(false);
    navigator.load_count().await;
    assert!(!navigator.has_query_error());
}

#[tokio::test]
async fn keep_index_shows_whatever_now_occupies_the_position() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    navigator.next().await;
    assert_eq!(navigator.record().id, Some(oid(1)));

    harness.source.clear_calls();
    harness.query.set_direction(Direction::Descending);
    navigator.adjust_index().await;

    // The server is still asked where the record went; the answer is unused.
    let calls = harness.source.calls();
    assert_eq!(calls.first(), Some(&Call::IndexOf(oid(1))));
    assert!(calls.contains(&Call::IdentifierAt(1)));
    assert_eq!(navigator.position().index(), 1);
    assert_eq!(navigator.record().id, Some(oid(3)));
}

#[tokio::test]
async fn follow_record_moves_the_cursor_with_the_record() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::FollowRecord, None);
    navigator.load_count().await;
    navigator.next().await;

    harness.query.set_direction(Direction::Descending);
    navigator.adjust_index().await;

    assert_eq!(navigator.position().index(), 3);
    assert_eq!(navigator.record().id, Some(oid(1)));
}

#[tokio::test]
async fn initial_record_is_located_on_the_first_count() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, Some(oid(2)));
    assert_eq!(navigator.record().id, Some(oid(2)));

    navigator.load_count().await;
    assert_eq!(navigator.position().index(), 2);
    assert_eq!(navigator.record().id, Some(oid(2)));

    // Later ordering changes keep the index again.
    harness.query.set_direction(Direction::Descending);
    navigator.adjust_index().await;
    assert_eq!(navigator.position().index(), 2);
}

#[tokio::test]
async fn initial_record_survives_an_empty_first_count() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, Some(oid(3)));

    harness.query.set_search("no-such-record");
    navigator.load_count().await;
    assert_eq!(navigator.position(), Position::default());

    harness.query.set_search("");
    navigator.load_count().await;
    assert_eq!(navigator.position(), Position::new(3, 5));
    assert_eq!(navigator.record().id, Some(oid(3)));
}

#[tokio::test]
async fn dispose_releases_the_collaborators() {
    let harness = Harness::new(FakeSource::with_records(5));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    navigator.next().await;

    navigator.dispose();

    assert_eq!(harness.attributes.managed(), None);
    assert_eq!(harness.tags.managed(), None);
    assert_eq!(harness.tags.log().last(), Some(&("release", oid(1))));
    assert_eq!(navigator.record(), &Observation::default());
}

#[tokio::test]
async fn activate_reacquires_the_current_record() {
    let harness = Harness::new(FakeSource::with_records(2));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    navigator.load_count().await;
    let before = harness.attributes.log().len();

    navigator.activate();

    let log = harness.attributes.log();
    assert_eq!(log.len(), before + 1);
    assert_eq!(log.last(), Some(&("manage", oid(0))));
}

#[tokio::test]
async fn export_sends_the_current_search() {
    let harness = Harness::new(FakeSource::with_records(2));
    let navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    harness.query.set_search("obs");

    navigator.export_observations().await.unwrap();

    assert_eq!(harness.source.calls(), vec![Call::Export("obs".to_string())]);
}

#[tokio::test]
async fn snapshots_follow_the_cursor() {
    let harness = Harness::new(FakeSource::with_records(3));
    let mut navigator = harness.navigator(ResortPolicy::KeepIndex, None);
    let updates = navigator.subscribe();

    navigator.load_count().await;
    navigator.next().await;

    let snapshot = updates.borrow().clone();
    assert_eq!(snapshot, navigator.snapshot());
    assert_eq!(snapshot.position, Position::new(1, 3));
    assert_eq!(snapshot.record.id, Some(oid(1)));
}
