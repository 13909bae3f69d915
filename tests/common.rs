#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn clubcal() -> Command {
    cargo_bin_cmd!("clubcal")
}

/// Fresh, initialized test DB inside the system temp dir.
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{name}_clubcal.sqlite"));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();

    clubcal()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();

    db_path
}

/// Output file path inside the temp dir, removed if it already exists.
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{name}_clubcal_out.{ext}"));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Run `add` with `args` and return the ids it printed, in order.
pub fn book(db_path: &str, args: &[&str]) -> Vec<String> {
    let out = clubcal()
        .args(["--db", db_path, "add"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    String::from_utf8_lossy(&out)
        .lines()
        .filter(|l| l.trim_start().starts_with('#'))
        .filter_map(|l| l.split_whitespace().last().map(str::to_string))
        .collect()
}

/// One-hour training for `athlete` with `staff-1` on `date` at `start`.
pub fn book_one(db_path: &str, date: &str, start: &str, athlete: &str) -> String {
    let ids = book(
        db_path,
        &[date, "--in", start, "--duration", "60", "--athlete", athlete, "--staff", "staff-1"],
    );
    assert_eq!(ids.len(), 1);
    ids[0].clone()
}
