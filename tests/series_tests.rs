use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{book, book_one, clubcal, setup_test_db};

fn daily_series(db_path: &str) -> Vec<String> {
    let ids = book(
        db_path,
        &[
            "2030-06-03", "--in", "07:00", "--duration", "60", "--athlete", "ath-1", "--staff",
            "staff-1", "--repeat", "daily", "--count", "5",
        ],
    );
    assert_eq!(ids.len(), 5);
    ids
}

#[test]
fn test_cancel_future_keeps_earlier_occurrences() {
    let db_path = setup_test_db("cancel_future");
    let ids = daily_series(&db_path);

    clubcal()
        .args(["--db", &db_path, "cancel", &ids[2], "--scope", "future"])
        .assert()
        .success()
        .stdout(contains("3 appointment(s) cancelled."));

    clubcal()
        .args(["--db", &db_path, "list", "--period", "2030-06"])
        .assert()
        .success()
        .stdout(contains("2030-06-04"))
        .stdout(contains("2030-06-05").not())
        .stdout(contains("2 appointment(s)"));

    clubcal()
        .args(["--db", &db_path, "list", "--period", "2030-06", "--all"])
        .assert()
        .success()
        .stdout(contains("cancelled"))
        .stdout(contains("5 appointment(s)"));
}

#[test]
fn test_cancelled_slot_can_be_booked_again() {
    let db_path = setup_test_db("cancel_rebook");
    let id = book_one(&db_path, "2030-06-10", "09:00", "ath-1");

    clubcal()
        .args(["--db", &db_path, "cancel", &id])
        .assert()
        .success();

    book_one(&db_path, "2030-06-10", "09:00", "ath-2");

    clubcal()
        .args(["--db", &db_path, "cancel", &id])
        .assert()
        .failure()
        .stderr(contains("already cancelled"));
}

#[test]
fn test_edit_whole_series() {
    let db_path = setup_test_db("edit_all");
    let ids = daily_series(&db_path);

    clubcal()
        .args(["--db", &db_path, "edit", &ids[0], "--scope", "all", "--location", "Pool"])
        .assert()
        .success()
        .stdout(contains("5 appointment(s) updated"));

    clubcal()
        .args(["--db", &db_path, "show", &ids[4]])
        .assert()
        .success()
        .stdout(contains("Location:  Pool"));
}

#[test]
fn test_move_keeps_duration_and_checks_overlap() {
    let db_path = setup_test_db("move");
    let first = book_one(&db_path, "2030-07-01", "09:00", "ath-1");
    book_one(&db_path, "2030-07-01", "12:00", "ath-2");

    clubcal()
        .args(["--db", &db_path, "move", &first, "2030-07-01", "--in", "11:30"])
        .assert()
        .failure()
        .stderr(contains("Overlap"));

    clubcal()
        .args(["--db", &db_path, "move", &first, "2030-07-02", "--in", "14:00"])
        .assert()
        .success()
        .stdout(contains("2030-07-02 14:00 → 15:00"));
}

#[test]
fn test_status_change() {
    let db_path = setup_test_db("status");
    let id = book_one(&db_path, "2030-07-03", "08:00", "ath-1");

    clubcal()
        .args(["--db", &db_path, "status", &id, "completed"])
        .assert()
        .success()
        .stdout(contains("is now completed"));

    clubcal()
        .args(["--db", &db_path, "status", &id, "postponed"])
        .assert()
        .failure()
        .stderr(contains("Invalid appointment status"));
}

#[test]
fn test_delete_series_with_yes() {
    let db_path = setup_test_db("del_series");
    let ids = daily_series(&db_path);

    clubcal()
        .args(["--db", &db_path, "del", &ids[1], "--series", "--yes"])
        .assert()
        .success()
        .stdout(contains("5 appointment(s) deleted."));

    clubcal()
        .args(["--db", &db_path, "show", &ids[0]])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn test_delete_without_confirmation_keeps_the_row() {
    let db_path = setup_test_db("del_declined");
    let id = book_one(&db_path, "2030-07-04", "08:00", "ath-1");

    clubcal()
        .args(["--db", &db_path, "del", &id])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Operation cancelled."));

    clubcal()
        .args(["--db", &db_path, "show", &id])
        .assert()
        .success();
}
