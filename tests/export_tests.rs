use predicates::str::contains;
use std::fs;

mod common;
use common::{book, book_one, clubcal, setup_test_db, temp_out};

#[test]
fn test_export_csv_range() {
    let db_path = setup_test_db("export_csv_range");
    book_one(&db_path, "2030-09-01", "10:00", "ath-1");
    book_one(&db_path, "2030-10-01", "10:00", "ath-2");

    let out = temp_out("export_csv_range", "csv");
    clubcal()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", &out, "--range", "2030-09",
            "--force",
        ])
        .assert()
        .success()
        .stdout(contains("CSV export completed: 1 appointment(s)"));

    let content = fs::read_to_string(&out).expect("read csv");
    assert!(content.lines().next().unwrap_or_default().contains("starts_at"));
    assert!(content.contains("ath-1"));
    assert!(!content.contains("ath-2"));
}

#[test]
fn test_export_json_includes_series_rule() {
    let db_path = setup_test_db("export_json_all");
    book(
        &db_path,
        &[
            "2030-09-02", "--in", "18:00", "--athlete", "ath-1", "--staff", "staff-1", "--repeat",
            "weekly", "--count", "2",
        ],
    );

    let out = temp_out("export_json_all", "json");
    clubcal()
        .args(["--db", &db_path, "export", "--format", "json", "--file", &out, "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(&out).expect("read json");
    let rows: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(rows.as_array().map(Vec::len), Some(2));
    assert!(content.contains("series_id"));
}

#[test]
fn test_export_requires_absolute_path() {
    let db_path = setup_test_db("export_relative");
    book_one(&db_path, "2030-09-03", "10:00", "ath-1");

    clubcal()
        .args(["--db", &db_path, "export", "--file", "relative.csv", "--force"])
        .assert()
        .failure()
        .stderr(contains("must be absolute"));
}
