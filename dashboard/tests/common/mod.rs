#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use dashboard::{DashboardConfig, DatasetStore};
use serde_json::json;
use tempfile::TempDir;

pub const SOURCES: [(&str, &str); 3] = [
    ("bbchealth", "BBC Health"),
    ("cnnhealth", "CNN Health"),
    ("nprhealth", "NPR Health"),
];
pub const MODEL_SIZES: [usize; 2] = [5, 10];
pub const FIRST_YEAR: i32 = 2014;
pub const LAST_YEAR: i32 = 2020;

pub fn assignments_csv(model_sizes: &[usize]) -> String {
    let mut csv = String::from("id,date,username,name,dominant_topic,num_topics\n");
    let mut id = 0;
    for &num_topics in model_sizes {
        for year in FIRST_YEAR..=LAST_YEAR {
            for (si, (username, name)) in SOURCES.iter().enumerate() {
                for k in 0..(3 + si) {
                    let topic = (year as usize + si * 3 + k) % num_topics;
                    id += 1;
                    writeln!(
                        csv,
                        "{id},{year}-03-{:02} 10:00:00,{username},{name},{topic},{num_topics}",
                        k + 1
                    )
                    .unwrap();
                }
            }
        }
        // Dropped from every year-based aggregate.
        id += 1;
        writeln!(csv, "{id},not a date,bbchealth,BBC Health,0,{num_topics}").unwrap();
    }
    csv
}

/// Uses the pipeline's original column names.
pub fn topic_words_json(model_sizes: &[usize]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = model_sizes
        .iter()
        .flat_map(|&num_topics| {
            (0..num_topics).map(move |topic| {
                json!({
                    "num_clusters": num_topics,
                    "topic_num": topic,
                    "top_words": (0..10).map(|j| format!("w{topic}_{j}")).collect::<Vec<_>>(),
                    "word_importance": (0..10).map(|j| 0.1 - j as f64 * 0.005).collect::<Vec<_>>(),
                    "doc_count": (0..10).map(|j| 100 - j * 7 + topic).collect::<Vec<_>>(),
                    "num_topic_occurence": (0..10).map(|j| j % 4).collect::<Vec<_>>(),
                })
            })
        })
        .collect();
    serde_json::Value::Array(rows)
}

pub fn topic_names_json(model_sizes: &[usize]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = model_sizes
        .iter()
        .map(|&num_topics| {
            let names: serde_json::Map<String, serde_json::Value> = (0..num_topics)
                .map(|t| (t.to_string(), json!(format!("Theme {t}"))))
                .collect();
            json!({"num_topics": num_topics, "topic_names": names})
        })
        .collect();
    serde_json::Value::Array(rows)
}

pub fn write_artifacts(dir: &Path, assignments: &str, words: &serde_json::Value, names: &serde_json::Value) {
    fs::write(dir.join("sttm_all_topics.csv"), assignments).unwrap();
    fs::write(dir.join("topic_words.json"), words.to_string()).unwrap();
    fs::write(dir.join("topic_names.json"), names.to_string()).unwrap();
}

pub fn fixture_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(
        dir.path(),
        &assignments_csv(&MODEL_SIZES),
        &topic_words_json(&MODEL_SIZES),
        &topic_names_json(&MODEL_SIZES),
    );
    dir
}

pub fn config_for(dir: &Path) -> DashboardConfig {
    DashboardConfig { data_dir: dir.to_path_buf(), ..DashboardConfig::default() }
}

pub fn fixture_store() -> DatasetStore {
    let dir = fixture_dir();
    DatasetStore::load(&config_for(dir.path())).unwrap()
}
