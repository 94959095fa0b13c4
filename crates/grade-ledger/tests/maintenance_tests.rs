use grade_ledger::{BatchImport, GradeStore, GradeType, LedgerError};
use grade_test_utils::{date, table, TempLedger, SAMPLE_TABLE};
use pretty_assertions::assert_eq;
use std::fs;

fn batch(json: &str) -> BatchImport {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_prune_removes_rows_without_positive_grades() {
    let temp = TempLedger::sample();

    let report = temp.ledger().prune_empty().unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.remaining, 3);

    let contents = temp.contents();
    assert!(!contents.contains("12,5,1403"));
    assert!(contents.contains("\nbad line\n"));

    assert_eq!(fs::read_to_string(&report.backup).unwrap(), SAMPLE_TABLE);
    assert_eq!(temp.backups(), vec![report.backup]);
}

#[test]
fn test_prune_missing_table() {
    let temp = TempLedger::new();
    let err = temp.ledger().prune_empty().unwrap_err();
    assert!(matches!(err, LedgerError::TableMissing { .. }));
    assert!(temp.backups().is_empty());
}

#[test]
fn test_import_merges_into_existing_rows() {
    let temp = TempLedger::with_contents(&table(&["1,2,1403,50,,"]));

    let report = temp
        .ledger()
        .import_batch(&batch(
            r#"{"grades": [
                {"year": 1403, "month": 2, "day": 1, "product_grade": 47.5},
                {"year": "1403", "month": "2", "day": "2", "feed_grade": "52", "tailing_grade": 0}
            ]}"#,
        ))
        .unwrap();

    assert_eq!(report.uploaded_count, 2);
    assert!(report.errors.is_empty());
    assert_eq!(temp.contents(), table(&["1,2,1403,50,47.5,", "2,2,1403,52,,"]));
    assert!(temp.backups().is_empty());
}

#[test]
fn test_import_with_clear_existing_backs_up_first() {
    let temp = TempLedger::sample();

    let report = temp
        .ledger()
        .import_batch(&batch(
            r#"{"clear_existing": true, "grades": [
                {"year": 1403, "month": 6, "day": 1, "feed_grade": 63, "product_grade": 150}
            ]}"#,
        ))
        .unwrap();

    assert_eq!(report.uploaded_count, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("product"));

    assert_eq!(temp.contents(), table(&["1,6,1403,63,,"]));
    let backups = temp.backups();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), SAMPLE_TABLE);
}

#[test]
fn test_import_creates_missing_table() {
    let temp = TempLedger::new();

    temp.ledger()
        .import_batch(&batch(
            r#"{"clear_existing": true, "grades": [
                {"year": 1403, "month": 1, "day": 5, "tailing_grade": "1.05"}
            ]}"#,
        ))
        .unwrap();

    assert_eq!(temp.contents(), table(&["5,1,1403,,,1.05"]));
    assert!(temp.backups().is_empty());
    let record = &temp.ledger().load().unwrap()[0];
    assert_eq!(record.get(GradeType::Tailing), "1.05");
    assert_eq!(record.date, date("1403/1/5"));
}

#[test]
fn test_backup_uses_configured_directory() {
    let temp = TempLedger::empty_table();
    let target = temp.dir().join("archive");
    let ledger =
        grade_ledger::CsvGradeLedger::new(temp.ledger().config().clone().with_backup_dir(&target));

    let backup = ledger.backup().unwrap();
    assert!(backup.starts_with(&target));
    assert_eq!(fs::read_to_string(backup).unwrap(), table(&[]));
}
