//! End-to-end tests over file-backed `SQLite` databases.
//!
//! Each test provisions a scratch database from the reference DDL, seeds it
//! the way the shop application would, and drives the export and import
//! services against it.

// Integration tests use unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{NaiveDate, NaiveDateTime};
use footfall::io::{ExportService, ImportOptions, ImportService, TimeWindow};
use footfall::storage::{ReportStore, SqliteStore};
use footfall::{Error, FieldValue, Record, ReportKind};
use std::path::Path;
use tempfile::TempDir;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn at(day: u32, h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
    date(day).and_hms_micro_opt(h, m, s, micro).unwrap()
}

fn scratch_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::create(dir.path().join("db.sqlite3")).unwrap()
}

fn common(record: Record, time: NaiveDateTime, deleted: bool) -> Record {
    record
        .with("time", FieldValue::Timestamp(time))
        .with("created", FieldValue::Timestamp(time))
        .with("updated", FieldValue::Timestamp(time))
        .with("is_deleted", FieldValue::Boolean(deleted))
        .with(
            "deleted_time",
            if deleted {
                FieldValue::Timestamp(time)
            } else {
                FieldValue::Null
            },
        )
}

fn heat(id: &str, time: NaiveDateTime, hot: i64) -> Record {
    let record = Record::new(ReportKind::Heatmap)
        .with("id", FieldValue::Text(id.to_string()))
        .with("rect", FieldValue::Text("rect-1".to_string()))
        .with("x", FieldValue::Integer(12))
        .with("y", FieldValue::Integer(-4))
        .with("hot", FieldValue::Integer(hot));
    // Catalog order puts `time` before `hot`; rebuild in that order.
    reorder(common(record, time, false))
}

fn stay(id: &str, time: NaiveDateTime) -> Record {
    let record = Record::new(ReportKind::Staymap)
        .with("id", FieldValue::Text(id.to_string()))
        .with("rect", FieldValue::Text("rect-2".to_string()))
        .with("x", FieldValue::Integer(0))
        .with("y", FieldValue::Integer(7))
        .with("stay", FieldValue::Integer(95));
    reorder(common(record, time, true))
}

fn flow(id: &str, time: NaiveDateTime) -> Record {
    let record = Record::new(ReportKind::Flow)
        .with("id", FieldValue::Text(id.to_string()))
        .with("area", FieldValue::Text("area, \"north\"".to_string()))
        .with("flow_in", FieldValue::Integer(14))
        .with("flow_out", FieldValue::Integer(9));
    reorder(common(record, time, false))
}

fn person(id: &str, time: NaiveDateTime) -> Record {
    let record = Record::new(ReportKind::People)
        .with("id", FieldValue::Text(id.to_string()))
        .with("area", FieldValue::Text("area-1".to_string()))
        .with("age", FieldValue::Integer(33))
        .with("gender", FieldValue::Integer(2));
    reorder(common(record, time, false))
}

/// Rebuilds a record with its fields in catalog order, matching rows read
/// back from the store.
fn reorder(record: Record) -> Record {
    let mut ordered = Record::new(record.kind());
    for column in record.kind().columns() {
        if let Some(value) = record.get(column.name) {
            ordered.push(column, value.clone());
        }
    }
    ordered
}

fn seed(store: &SqliteStore) {
    store
        .insert_batches(
            ReportKind::Heatmap,
            &[
                heat("h-03", at(1, 9, 30, 0, 123_456), 3),
                heat("h-01", at(1, 9, 0, 0, 0), 1),
                heat("h-02", at(1, 9, 59, 59, 999_999), 2),
                heat("h-04", at(1, 8, 59, 59, 999_999), 4),
                heat("h-05", at(1, 10, 0, 0, 0), 5),
                heat("h-06", at(2, 9, 15, 0, 0), 6),
            ],
            100,
        )
        .unwrap();
    store
        .insert_batches(
            ReportKind::Staymap,
            &[stay("s-01", at(1, 9, 5, 0, 0)), stay("s-02", at(1, 23, 59, 59, 999_999))],
            100,
        )
        .unwrap();
    store
        .insert_batches(
            ReportKind::Flow,
            &[flow("f-01", at(1, 9, 45, 0, 0)), flow("f-02", at(1, 0, 0, 0, 0))],
            100,
        )
        .unwrap();
    store
        .insert_batches(ReportKind::People, &[person("p-01", at(1, 9, 1, 2, 3))], 100)
        .unwrap();
}

fn read(dir: &Path, kind: ReportKind) -> String {
    std::fs::read_to_string(dir.join(kind.file_name())).unwrap()
}

fn first_cells(csv: &str) -> Vec<String> {
    csv.lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().to_string())
        .collect()
}

#[test]
fn test_heatmap_hour_window_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    seed(&store);

    let out = dir.path().join("out");
    let results = ExportService::new(&store)
        .export_all(&out, &TimeWindow::hour(date(1), 9))
        .unwrap();
    assert_eq!(results[0].kind, ReportKind::Heatmap);
    assert_eq!(results[0].exported, 3);
    assert_eq!(results[0].total_in_table, 6);

    let csv = read(&out, ReportKind::Heatmap);
    assert_eq!(
        csv.lines().next().unwrap(),
        "id,rect,x,y,time,hot,created,updated,is_deleted,deleted_time"
    );
    assert_eq!(first_cells(&csv), vec!["h-01", "h-02", "h-03"]);
    assert!(csv.contains(
        "h-03,rect-1,12,-4,2024-03-01 09:30:00.123456,3,\
         2024-03-01 09:30:00.123456,2024-03-01 09:30:00.123456,False,\n"
    ));
}

#[test]
fn test_day_window_and_hour_23_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    seed(&store);

    let day = store
        .fetch_window(ReportKind::Heatmap, &TimeWindow::day(date(1)))
        .unwrap();
    assert_eq!(day.len(), 5);

    let late = store
        .fetch_window(ReportKind::Staymap, &TimeWindow::hour(date(1), 23))
        .unwrap();
    let ids: Vec<_> = late.iter().filter_map(Record::id).collect();
    assert_eq!(ids, vec!["s-02"]);
}

#[test]
fn test_out_of_range_hours_export_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    seed(&store);

    for hour in [24, -1] {
        let out = dir.path().join(format!("hour{hour}"));
        let results = ExportService::new(&store)
            .export_all(&out, &TimeWindow::hour(date(1), hour))
            .unwrap();
        assert!(results.iter().all(|r| r.exported == 0), "hour {hour}");
        for kind in ReportKind::ALL {
            assert_eq!(read(&out, kind).lines().count(), 1);
        }
    }
}

#[test]
fn test_export_is_byte_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    seed(&store);
    let window = TimeWindow::day(date(1));

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    ExportService::new(&store).export_all(&first, &window).unwrap();
    ExportService::new(&store).export_all(&second, &window).unwrap();

    for kind in ReportKind::ALL {
        let a = std::fs::read(first.join(kind.file_name())).unwrap();
        let b = std::fs::read(second.join(kind.file_name())).unwrap();
        assert_eq!(a, b, "{kind}");
    }
}

#[test]
fn test_round_trip_into_empty_store() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = scratch_store(&source_dir);
    seed(&source);

    let window = TimeWindow::day(date(1));
    let out = source_dir.path().join("out");
    ExportService::new(&source).export_all(&out, &window).unwrap();

    let target_dir = tempfile::tempdir().unwrap();
    let target = scratch_store(&target_dir);
    let results = ImportService::new(&target).import_all(&out).unwrap();
    let rows: Vec<_> = results.iter().map(|r| r.rows).collect();
    assert_eq!(rows, vec![5, 2, 2, 1]);
    assert!(results.iter().all(|r| r.lenient_timestamps == 0));

    for kind in ReportKind::ALL {
        let expected = source.fetch_window(kind, &window).unwrap();
        let actual = target.fetch_window(kind, &window).unwrap();
        assert_eq!(actual, expected, "{kind}");
    }
}

#[test]
fn test_people_bulk_of_two() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    let input = "\
id,area,time,age,gender,created,updated,is_deleted,deleted_time
p1,a1,2024-03-01 09:00:00.000000,30,1,2024-03-01 09:00:00.000000,2024-03-01 09:00:00.000000,False,
p2,a1,2024-03-01 09:10:00.000000,41,2,2024-03-01 09:10:00.000000,2024-03-01 09:10:00.000000,False,
p3,a2,2024-03-01 10:00:00.000000,25,1,2024-03-01 10:00:00.000000,2024-03-01 10:00:00.000000,False,
";

    let result = ImportService::new(&store)
        .with_options(ImportOptions::default().with_bulk_size(2))
        .import_from_reader(ReportKind::People, input.as_bytes())
        .unwrap();

    assert_eq!(result.rows, 3);
    assert_eq!(result.batches, 2);
    assert_eq!(store.count(ReportKind::People).unwrap(), 3);
}

/// The statement a conflicting row fails in shows which chunk carried it:
/// with a bulk size of 2, rows 1-2 go in the first statement, row 3 alone in
/// the second.
#[test]
fn test_people_bulk_of_two_chunk_sizes() {
    let cases = [
        (0, "insert_people_batch_1"),
        (1, "insert_people_batch_1"),
        (2, "insert_people_batch_2"),
    ];
    for (position, expected) in cases {
        let dir = tempfile::tempdir().unwrap();
        let store = scratch_store(&dir);
        store
            .insert_batches(ReportKind::People, &[person("taken", at(1, 8, 0, 0, 0))], 1)
            .unwrap();

        let mut ids = ["p1", "p2", "p3"];
        ids[position] = "taken";
        let mut input =
            String::from("id,area,time,age,gender,created,updated,is_deleted,deleted_time\n");
        for id in ids {
            input.push_str(&format!(
                "{id},a1,2024-03-01 09:00:00.000000,30,1,2024-03-01 09:00:00.000000,\
                 2024-03-01 09:00:00.000000,False,\n"
            ));
        }

        let result = ImportService::new(&store)
            .with_options(ImportOptions::default().with_bulk_size(2))
            .import_from_reader(ReportKind::People, input.as_bytes());

        assert!(
            matches!(
                result,
                Err(Error::OperationFailed { ref operation, .. }) if operation == expected
            ),
            "row {}: {result:?}",
            position + 1
        );
        assert_eq!(store.count(ReportKind::People).unwrap(), 1);
    }
}

#[test]
fn test_failed_batch_rolls_back_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    store
        .insert_batches(ReportKind::People, &[person("taken", at(1, 8, 0, 0, 0))], 1)
        .unwrap();

    let input = "\
id,area,time,age,gender,created,updated,is_deleted,deleted_time
new-1,a1,2024-03-01 09:00:00.000000,30,1,2024-03-01 09:00:00.000000,2024-03-01 09:00:00.000000,False,
new-2,a1,2024-03-01 09:10:00.000000,41,2,2024-03-01 09:10:00.000000,2024-03-01 09:10:00.000000,False,
taken,a2,2024-03-01 10:00:00.000000,25,1,2024-03-01 10:00:00.000000,2024-03-01 10:00:00.000000,False,
";

    let result = ImportService::new(&store)
        .with_options(ImportOptions::default().with_bulk_size(2))
        .import_from_reader(ReportKind::People, input.as_bytes());

    assert!(matches!(result, Err(Error::OperationFailed { .. })));
    assert_eq!(store.count(ReportKind::People).unwrap(), 1);
}

#[test]
fn test_unparseable_deleted_time_is_stored_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    let input = "\
id,area,time,flow_in,flow_out,created,updated,is_deleted,deleted_time
f1,a1,2024-03-01 09:00:00.000000,1,2,2024-03-01 09:00:00.000000,2024-03-01 09:00:00.000000,True,someday
";

    let result = ImportService::new(&store)
        .import_from_reader(ReportKind::Flow, input.as_bytes())
        .unwrap();
    assert_eq!(result.lenient_timestamps, 1);

    let rows = store
        .fetch_window(ReportKind::Flow, &TimeWindow::hour(date(1), 9))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("deleted_time"), Some(&FieldValue::Null));
    assert_eq!(rows[0].get("is_deleted"), Some(&FieldValue::Boolean(true)));
}

#[test]
fn test_bad_integer_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    let input = "id,rect,x,y,time,hot\nh1,r1,1,2,2024-03-01 09:00:00.000000,warm\n";

    let result =
        ImportService::new(&store).import_from_reader(ReportKind::Heatmap, input.as_bytes());
    assert!(matches!(
        result,
        Err(Error::InvalidInteger { ref column, ref value, line: 2 })
            if column == "hot" && value == "warm"
    ));
    assert_eq!(store.count(ReportKind::Heatmap).unwrap(), 0);
}

#[test]
fn test_rows_stored_by_the_shop_application_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = scratch_store(&dir);
    // Django stores whole seconds without a fraction and booleans as 0/1.
    store
        .execute_batch(
            "INSERT INTO people_person \
             (id, area_id, time, age, gender, created, updated, is_deleted, deleted_time) \
             VALUES ('legacy', 'area-9', '2024-03-01 09:00:00', 50, 1, \
             '2024-03-01 09:00:00', '2024-03-01 09:00:00.5', 0, NULL);",
        )
        .unwrap();

    let mut output = Vec::new();
    ExportService::new(&store)
        .export_to_writer(ReportKind::People, &TimeWindow::hour(date(1), 9), &mut output)
        .unwrap();

    assert_eq!(
        String::from_utf8(output).unwrap().lines().nth(1).unwrap(),
        "legacy,area-9,2024-03-01 09:00:00.000000,50,1,\
         2024-03-01 09:00:00.000000,2024-03-01 09:00:00.500000,False,"
    );
}

#[test]
fn test_missing_database_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = SqliteStore::open(dir.path().join("absent.sqlite3"));
    assert!(matches!(result, Err(Error::OperationFailed { .. })));
    assert!(!dir.path().join("absent.sqlite3").exists());
}

#[test]
fn test_missing_tables_fail_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.sqlite3");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 1;")
        .unwrap();

    let store = SqliteStore::open(&path).unwrap();
    let result =
        ExportService::new(&store).export_all(&dir.path().join("out"), &TimeWindow::day(date(1)));
    assert!(matches!(result, Err(Error::OperationFailed { .. })));
}
