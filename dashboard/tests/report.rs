mod common;

use std::collections::BTreeSet;

use dashboard::report;
use dashboard::session::Domains;
use dashboard::table::TopicTable;
use dashboard::{AggregationEngine, BubbleConfig, SourceFilter, YearRange};

use common::{fixture_store, FIRST_YEAR, LAST_YEAR};

#[test]
fn prints_domains_and_ready_views() {
    let store = fixture_store();
    report::print_domains(&Domains::from_store(&store));

    let engine = AggregationEngine::new(&store, BubbleConfig::default());
    let payload = engine
        .compute_view(10, &SourceFilter::All, YearRange::new(FIRST_YEAR, LAST_YEAR))
        .unwrap();
    report::print_payload(&payload);
    report::print_view(payload.view().unwrap());
}

#[test]
fn prints_empty_pivots_and_insufficient_selection() {
    let store = fixture_store();
    let engine = AggregationEngine::new(&store, BubbleConfig::default());

    let no_matches = engine.compute_view(5, &SourceFilter::All, YearRange::new(1990, 1991)).unwrap();
    assert!(no_matches.view().unwrap().source_by_topic.is_empty());
    report::print_payload(&no_matches);

    let no_sources = engine
        .compute_view(5, &SourceFilter::only(Vec::<String>::new()), YearRange::new(FIRST_YEAR, LAST_YEAR))
        .unwrap();
    assert!(no_sources.is_insufficient_selection());
    report::print_payload(&no_sources);
}

#[test]
fn prints_topic_table_with_and_without_highlights() {
    let store = fixture_store();
    let model = store.load_model(5).unwrap();

    let highlighted = TopicTable::build(model, &BTreeSet::from([0, 3]), 5);
    assert!(highlighted.is_highlighted(4));
    report::print_topic_table(&highlighted);

    report::print_topic_table(&TopicTable::build(model, &BTreeSet::new(), 5));
}
