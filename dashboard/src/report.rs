//! Plain-text rendering of payloads for the terminal.

use std::fmt::Display;

use crate::aggregate::{format_share, PivotTable, TopicView, ViewPayload};
use crate::session::Domains;
use crate::table::TopicTable;

pub fn print_domains(domains: &Domains) {
    println!("Model sizes: {:?}", domains.model_sizes);
    if let (Some(first), Some(last)) = (domains.years.first(), domains.years.last()) {
        println!("Years: {first}-{last} ({} years with data)", domains.years.len());
    }
    println!("News sources ({}):", domains.sources.len());
    for source in &domains.sources {
        println!("  {source}");
    }
}

pub fn print_payload(payload: &ViewPayload) {
    match payload {
        ViewPayload::Ready(view) => print_view(view),
        ViewPayload::InsufficientSelection { message, .. } => println!("{message}"),
    }
}

pub fn print_view(view: &TopicView) {
    println!(
        "{}-topic model, {} tweets between {} and {}",
        view.num_topics, view.tweet_count, view.years.min, view.years.max
    );

    println!("\n=== Topic share by source ===");
    print_pivot(&view.source_by_topic, |v| format_share(*v));

    println!("\n=== Tweets by year ===");
    print_pivot(&view.year_by_topic, |v| v.to_string());

    println!("\n=== Top words per topic ===");
    for series in &view.bubbles.series {
        println!("Topic {}: {} (size_ref {:.4})", series.name, series.label, series.size_ref);
        for point in &series.points {
            println!(
                "   {:<15} tweets: {:>6}  importance: {:.4}  shared by: {:>2}  radius: {:.1}",
                point.word, point.doc_count, point.importance, point.occurrence_count, point.radius
            );
        }
    }
}

fn print_pivot<R: Display, T>(pivot: &PivotTable<R, T>, fmt: impl Fn(&T) -> String) {
    if pivot.is_empty() {
        println!("(no tweets match the current filters)");
        return;
    }
    let row_width = pivot.rows.iter().map(|r| r.to_string().len()).max().unwrap_or(0).max(6);
    print!("{:<row_width$}", "");
    for column in &pivot.columns {
        print!(" {column:>9}");
    }
    println!();
    for (row, values) in pivot.rows.iter().zip(&pivot.cells) {
        print!("{:<row_width$}", row.to_string());
        for value in values {
            print!(" {:>9}", fmt(value));
        }
        println!();
    }
}

pub fn print_topic_table(table: &TopicTable) {
    for row in &table.rows {
        let marker = if table.is_highlighted(row.topic) { "*" } else { " " };
        println!("{marker} {:>3}  {}", row.topic, row.description);
        println!("        {}", row.tooltip);
    }
}
