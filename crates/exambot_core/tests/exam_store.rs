use chrono::{DateTime, Duration, TimeZone, Utc};
use exambot_core::db::open_db_in_memory;
use exambot_core::{
    time_left, Countdown, ExamError, ExamRepository, ExamStore, FixedClock, SqliteExamRepository,
    ZoneResolver,
};
use rusqlite::Connection;

// 10:00 CET on 10 Jan 2027.
fn winter_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2027, 1, 10, 9, 0, 0).unwrap()
}

fn store<'a>(
    conn: &'a Connection,
    clock: &'a FixedClock,
) -> ExamStore<SqliteExamRepository<'a>, &'a FixedClock> {
    let repo = SqliteExamRepository::try_new(conn).unwrap();
    ExamStore::new(repo, clock, ZoneResolver::default())
}

#[test]
fn add_then_get_returns_the_same_display_date() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    for (name, date) in [("midterm", "20.01.2027"), ("summer", "15.07.2027"), ("leap", "29.02.2028")] {
        store.add(name, date).unwrap();
        let loaded = store.get(name).unwrap();
        assert_eq!(loaded.name, name);
        assert_eq!(loaded.display_date(), date);
    }
}

#[test]
fn stored_date_is_local_midnight_in_canonical_form() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    store.add("summer", "15.07.2027").unwrap();
    store.add("winter", "15.12.2027").unwrap();

    let raw: Vec<(String, String)> = conn
        .prepare("SELECT name, date FROM exams ORDER BY name;")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        raw,
        vec![
            ("summer".to_string(), "2027-07-15T00:00:00+02:00".to_string()),
            ("winter".to_string(), "2027-12-15T00:00:00+01:00".to_string()),
        ]
    );
}

#[test]
fn duplicate_add_fails_and_keeps_original() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    store.add("final", "01.03.2027").unwrap();
    let err = store.add("final", "05.05.2027").unwrap_err();
    assert!(matches!(err, ExamError::AlreadyExists(ref name) if name == "final"));

    assert_eq!(store.get("final").unwrap().display_date(), "01.03.2027");
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn past_dates_are_rejected_for_add_and_update() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    // Today's midnight already lies behind 10:00.
    for date in ["10.01.2027", "09.01.2027", "01.01.1999"] {
        let err = store.add("old", date).unwrap_err();
        assert!(matches!(err, ExamError::PastDate(_)), "{date} should be past");
    }
    assert!(store.list().unwrap().is_empty());

    store.add("final", "01.03.2027").unwrap();
    let err = store.update("final", "01.01.2027").unwrap_err();
    assert!(matches!(err, ExamError::PastDate(_)));
    assert_eq!(store.get("final").unwrap().display_date(), "01.03.2027");
}

#[test]
fn exam_at_exactly_now_is_accepted_and_one_second_later_is_not() {
    let conn = open_db_in_memory().unwrap();
    // 00:00 CET on 20 Jan 2027.
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2027, 1, 19, 23, 0, 0).unwrap());
    let store = store(&conn, &clock);

    store.add("boundary", "20.01.2027").unwrap();

    clock.advance(Duration::seconds(1));
    let err = store.add("late", "20.01.2027").unwrap_err();
    assert!(matches!(err, ExamError::PastDate(_)));
}

#[test]
fn malformed_dates_fail_with_invalid_format() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);
    store.add("final", "01.03.2027").unwrap();

    for date in ["2027-03-01", "1.3.2027", "01/03/2027", "aa.bb.cccc", "31.04.2027", "01.03.27"] {
        assert!(
            matches!(store.add("other", date), Err(ExamError::InvalidFormat(_))),
            "add with {date}"
        );
        assert!(
            matches!(store.update("final", date), Err(ExamError::InvalidFormat(_))),
            "update with {date}"
        );
    }
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn update_moves_existing_exam_and_missing_name_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    let err = store.update("ghost", "01.03.2027").unwrap_err();
    assert!(matches!(err, ExamError::NotFound(ref name) if name == "ghost"));
    assert!(store.list().unwrap().is_empty());

    store.add("final", "01.03.2027").unwrap();
    let updated = store.update("final", "15.07.2027").unwrap();
    assert_eq!(updated.display_date(), "15.07.2027");
    assert_eq!(store.get("final").unwrap(), updated);
}

#[test]
fn delete_removes_record_and_missing_name_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    assert!(matches!(store.delete("ghost"), Err(ExamError::NotFound(_))));

    store.add("final", "01.03.2027").unwrap();
    store.delete("final").unwrap();
    assert!(matches!(store.get("final"), Err(ExamError::NotFound(_))));
    assert!(matches!(store.delete("final"), Err(ExamError::NotFound(_))));
}

#[test]
fn list_returns_every_added_name_once_in_date_order() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);
    assert!(store.list().unwrap().is_empty());

    store.add("physics", "15.07.2027").unwrap();
    store.add("algebra", "01.02.2027").unwrap();
    store.add("biology", "01.02.2027").unwrap();

    let names: Vec<String> = store.list().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["algebra", "biology", "physics"]);
}

#[test]
fn corrupt_persisted_date_is_store_unavailable() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO exams (name, date) VALUES ('broken', '01.03.2027');",
        [],
    )
    .unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);

    assert!(matches!(store.get("broken"), Err(ExamError::StoreUnavailable(_))));
    assert!(matches!(store.list(), Err(ExamError::StoreUnavailable(_))));
}

#[test]
fn countdown_from_store_reports_days_hours_minutes() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);
    let exam = store.add("midterm", "20.01.2027").unwrap();

    // Exam starts at 2027-01-19T23:00Z; leave 1d 2h 3m 30s.
    clock.set(Utc.with_ymd_and_hms(2027, 1, 18, 20, 56, 30).unwrap());
    let (now, _) = store.now();
    assert_eq!(
        time_left(&exam.date, &now),
        Countdown::Remaining {
            days: 1,
            hours: 2,
            minutes: 3
        }
    );

    clock.set(Utc.with_ymd_and_hms(2027, 1, 20, 8, 0, 0).unwrap());
    let (now, _) = store.now();
    assert_eq!(time_left(&exam.date, &now), Countdown::Passed);
}

#[test]
fn unknown_zone_uses_fixed_fallback_for_new_records() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let repo = SqliteExamRepository::try_new(&conn).unwrap();
    let store = ExamStore::new(repo, &clock, ZoneResolver::new("Not/A_Zone"));

    let (now, zone) = store.now();
    assert!(zone.is_fallback());
    assert_eq!(now.offset().local_minus_utc(), 3600);

    let exam = store.add("final", "01.03.2027").unwrap();
    assert_eq!(exam.date.to_rfc3339(), "2027-03-01T00:00:00+01:00");
}

#[test]
fn repository_insert_is_atomic_on_conflict() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(winter_morning());
    let store = store(&conn, &clock);
    let first = store.add("final", "01.03.2027").unwrap();

    let repo = SqliteExamRepository::try_new(&conn).unwrap();
    let mut clash = first.clone();
    clash.date = clash.date + Duration::days(3);
    assert!(repo.insert_if_absent(&clash).is_err());
    assert_eq!(repo.get("final").unwrap(), Some(first));
}
