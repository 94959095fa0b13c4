use grade_ledger::{
    DeleteOutcome, ErrorKind, GradeStore, GradeType, LedgerError, StorageOp, UpsertOutcome,
};
use grade_test_utils::{date, table, value, TempLedger};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_daily_entry_lifecycle() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let day = date("1403/5/10");

    assert_eq!(
        ledger.upsert(day, GradeType::Feed, &value("62.5")).unwrap(),
        UpsertOutcome::Inserted
    );
    assert_eq!(temp.contents(), table(&["10,5,1403,62.5,,"]));

    assert_eq!(
        ledger.upsert(day, GradeType::Product, &value("58.0")).unwrap(),
        UpsertOutcome::Updated
    );
    assert_eq!(temp.contents(), table(&["10,5,1403,62.5,58.0,"]));

    assert_eq!(
        ledger.delete(day, GradeType::Feed, "u1").unwrap(),
        DeleteOutcome::Cleared
    );
    assert_eq!(temp.contents(), table(&["10,5,1403,,58.0,"]));

    assert_eq!(
        ledger.delete(day, GradeType::Product, "u1").unwrap(),
        DeleteOutcome::RowPruned
    );
    assert_eq!(temp.contents(), table(&[]));
    assert!(ledger.load().unwrap().is_empty());
}

#[test]
fn test_zero_grade_counts_in_stats_but_not_export() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let day = date("1403/5/11");

    ledger.upsert(day, GradeType::Feed, &value("61")).unwrap();
    ledger.upsert(day, GradeType::Product, &value("0")).unwrap();

    let stats = ledger.stats().unwrap();
    assert_eq!(stats.total_records, 2);
    assert_eq!(stats.by_type.get(GradeType::Product), 1);
    assert_eq!(stats.by_date.get(&day), Some(&2));

    let exported = ledger.export().unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].grade_type, GradeType::Feed);
    assert_eq!(exported[0].grade_value, 61.0);
}

#[test]
fn test_padded_dates_address_the_same_row() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();

    ledger
        .upsert(date("1403/05/10"), GradeType::Feed, &value("62.5"))
        .unwrap();
    assert_eq!(
        ledger
            .upsert(date("1403/5/10"), GradeType::Tailing, &value("1.5"))
            .unwrap(),
        UpsertOutcome::Updated
    );

    assert_eq!(temp.contents(), table(&["10,5,1403,62.5,,1.5"]));
}

#[test]
fn test_malformed_lines_and_extra_columns_survive_rewrites() {
    let temp = TempLedger::sample();
    let ledger = temp.ledger();

    ledger
        .upsert(date("1403/5/13"), GradeType::Feed, &value("59.5"))
        .unwrap();

    let contents = temp.contents();
    assert!(contents.contains("\nbad line\n"));
    assert!(contents.contains("\n13,5,1403,59.5,57,1.1,note\n"));
    assert_eq!(ledger.load().unwrap().len(), 4);
}

#[test]
fn test_sample_stats_and_export() {
    let temp = TempLedger::sample();
    let ledger = temp.ledger();

    let stats = ledger.stats().unwrap();
    assert_eq!(stats.total_records, 10);
    assert_eq!(stats.by_type.feed, 4);
    assert_eq!(stats.by_type.product, 3);
    assert_eq!(stats.by_type.tailing, 3);
    let dates: Vec<String> = stats.by_date.keys().map(ToString::to_string).collect();
    assert_eq!(dates, ["1403/5/10", "1403/5/11", "1403/5/12", "1403/5/13"]);

    let exported = ledger.export().unwrap();
    assert_eq!(exported.len(), 7);
    assert!(exported.iter().all(|e| e.grade_value > 0.0));
    assert_eq!(exported[0].date, date("1403/5/10"));
    assert_eq!(exported[1].grade_type, GradeType::Product);
}

#[test]
fn test_update_requires_existing_row() {
    let temp = TempLedger::sample();
    let ledger = temp.ledger();
    let before = temp.contents();

    let err = ledger
        .update(date("1403/6/1"), GradeType::Feed, &value("50"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::RecordNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(temp.contents(), before);

    ledger
        .update(date("1403/5/11"), GradeType::Product, &value("59"))
        .unwrap();
    assert!(temp.contents().contains("\n11,5,1403,61,59,1.2\n"));
}

#[test]
fn test_delete_unknown_date() {
    let temp = TempLedger::empty_table();
    let err = temp
        .ledger()
        .delete(date("1403/1/1"), GradeType::Feed, "u1")
        .unwrap_err();
    assert!(matches!(err, LedgerError::RecordNotFound { .. }));
    assert_eq!(temp.contents(), table(&[]));
}

#[test]
fn test_blank_rows_on_disk_are_dropped_by_any_write() {
    let temp = TempLedger::with_contents(&table(&["2,1,1403,,,", "bad line"]));
    let ledger = temp.ledger();

    ledger
        .upsert(date("1403/1/3"), GradeType::Feed, &value("5"))
        .unwrap();

    assert_eq!(temp.contents(), table(&["bad line", "3,1,1403,5,,"]));
    assert!(ledger.load().unwrap().iter().all(|r| !r.is_blank()));
}

#[test]
fn test_quoted_cells_round_trip_through_rewrites() {
    let temp = TempLedger::with_contents(&table(&["1,1,1403,\"1,5\",,"]));
    let ledger = temp.ledger();

    assert_eq!(ledger.stats().unwrap().total_records, 1);
    ledger
        .upsert(date("1403/1/1"), GradeType::Product, &value("40"))
        .unwrap();

    assert_eq!(temp.contents(), table(&["1,1,1403,\"1,5\",40,"]));
    assert_eq!(ledger.load().unwrap()[0].feed, "1,5");
}

#[test]
fn test_headerless_file_gets_header_on_write() {
    let temp = TempLedger::with_contents("");
    temp.ledger()
        .upsert(date("1403/1/2"), GradeType::Tailing, &value("0.8"))
        .unwrap();
    assert_eq!(temp.contents(), table(&["2,1,1403,,,0.8"]));
}

#[test]
fn test_directory_path_is_a_storage_error() {
    let temp = TempLedger::new();
    fs::create_dir(temp.path()).unwrap();

    let err = temp
        .ledger()
        .upsert(date("1403/1/1"), GradeType::Feed, &value("5"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    let LedgerError::Storage(storage) = err else {
        panic!("expected storage error, got {err:?}");
    };
    assert_eq!(storage.path, temp.path());
    assert!(matches!(storage.op, StorageOp::Open | StorageOp::Read));
    assert!(storage.permissions.is_some());
}
