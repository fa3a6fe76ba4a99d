mod common;

use std::collections::BTreeSet;

use dashboard::{
    DashboardConfig, DashboardError, DashboardSession, LegendToggle, SessionCommand, SessionResponse, SourceFilter,
    TraceVisibility, VisibilityState,
};

use common::{config_for, fixture_dir, fixture_store};

fn run(session: &mut DashboardSession<'_>, line: &str) -> dashboard::Result<SessionResponse> {
    session.handle(SessionCommand::parse(line).unwrap())
}

fn config() -> DashboardConfig {
    // Only the bubble and tooltip settings matter once the store is loaded.
    DashboardConfig::default()
}

#[test]
fn opens_on_default_model_with_first_topic_visible() {
    let store = fixture_store();
    let session = DashboardSession::new(&store, &config()).unwrap();

    assert_eq!(session.num_topics(), 10);
    assert_eq!(session.visibility(), &VisibilityState::new(10));
    let table = session.topic_table().unwrap();
    assert_eq!(table.rows.len(), 10);
    assert_eq!(table.highlighted, vec![1]);
}

#[test]
fn missing_default_model_is_fatal() {
    let store = fixture_store();
    let config = DashboardConfig { default_num_topics: 20, ..config() };
    let err = DashboardSession::new(&store, &config).err().unwrap();
    assert!(matches!(err, DashboardError::DataNotFound { num_topics: 20 }));
}

#[test]
fn legend_toggles_drive_table_highlighting() {
    let store = fixture_store();
    let mut session = DashboardSession::new(&store, &config()).unwrap();

    session
        .toggle_legend(&[
            LegendToggle::new(2, TraceVisibility::Visible),
            LegendToggle::new(5, TraceVisibility::Muted),
        ])
        .unwrap();
    assert_eq!(session.visibility().visible_topic_indices(), BTreeSet::from([0, 2]));
    assert_eq!(session.topic_table().unwrap().highlighted, vec![1, 3]);
}

#[test]
fn model_change_discards_toggles() {
    let store = fixture_store();
    let mut session = DashboardSession::new(&store, &config()).unwrap();

    session.toggle_legend(&[LegendToggle::new(7, TraceVisibility::Visible)]).unwrap();
    session.select_model(5).unwrap();
    assert_eq!(session.visibility(), &VisibilityState::new(5));
    assert_eq!(session.topic_table().unwrap().rows.len(), 5);
}

#[test]
fn unknown_model_keeps_session_state() {
    let store = fixture_store();
    let mut session = DashboardSession::new(&store, &config()).unwrap();
    session.toggle_legend(&[LegendToggle::new(3, TraceVisibility::Visible)]).unwrap();
    let before = session.snapshot();

    let err = session.select_model(42).unwrap_err();
    assert!(matches!(err, DashboardError::DataNotFound { num_topics: 42 }));
    assert_eq!(session.snapshot(), before);
}

#[test]
fn commands_round_trip_through_handle() {
    let store = fixture_store();
    let mut session = DashboardSession::new(&store, &config()).unwrap();

    let SessionResponse::State(state) = run(&mut session, "model 5").unwrap() else {
        panic!("model change answers with the session state");
    };
    assert_eq!(state.num_topics, 5);

    run(&mut session, "toggle 2=on 1=off").unwrap();
    let SessionResponse::State(state) = run(&mut session, r#"restyle [{"visible": [true]}, [4]]"#).unwrap() else {
        panic!("restyle answers with the session state");
    };
    assert_eq!(state.visible_topic_indices, BTreeSet::from([1, 4]));

    let SessionResponse::Table(table) = run(&mut session, "table").unwrap() else {
        panic!("table command answers with the topic table");
    };
    assert_eq!(table.highlighted, vec![2, 5]);

    run(&mut session, "sources none").unwrap();
    let SessionResponse::View(payload) = run(&mut session, "view").unwrap() else {
        panic!("view command answers with a payload");
    };
    assert!(payload.is_insufficient_selection());

    run(&mut session, "sources BBC Health|CNN Health").unwrap();
    run(&mut session, "years 2019 2020").unwrap();
    let SessionResponse::View(payload) = run(&mut session, "view").unwrap() else {
        panic!("view command answers with a payload");
    };
    let view = payload.view().unwrap();
    assert_eq!(view.sources, SourceFilter::only(["BBC Health", "CNN Health"]));
    assert_eq!(view.year_by_topic.rows, vec![2019, 2020]);
    assert_eq!(view.tweet_count, 14);
}

#[test]
fn bad_toggle_batch_changes_nothing() {
    let store = fixture_store();
    let mut session = DashboardSession::new(&store, &config()).unwrap();

    let err = session
        .handle(SessionCommand::parse("toggle 2=on 11=on").unwrap())
        .unwrap_err();
    assert!(matches!(err, DashboardError::UnknownTopic { topic_index: 10, num_topics: 10 }));
    assert_eq!(session.visibility(), &VisibilityState::new(10));
}

#[test]
fn domains_come_from_the_store() {
    let dir = fixture_dir();
    let store = dashboard::DatasetStore::load(&config_for(dir.path())).unwrap();
    let mut session = DashboardSession::new(&store, &config()).unwrap();

    let SessionResponse::Domains(domains) = session.handle(SessionCommand::Domains).unwrap() else {
        panic!("domains command answers with the filter domains");
    };
    assert_eq!(domains.model_sizes, vec![5, 10]);
    assert_eq!(domains.years, (2014..=2020).collect::<Vec<_>>());
    assert!(domains.sources.contains("CNN Health"));
}
