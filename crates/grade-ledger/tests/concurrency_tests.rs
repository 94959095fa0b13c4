use grade_ledger::{GradeDate, GradeStore, GradeType};
use grade_test_utils::{value, TempLedger};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const WRITERS: u32 = 8;
const DAYS_PER_WRITER: u32 = 5;

#[test]
fn test_concurrent_writers_lose_no_updates() {
    let temp = Arc::new(TempLedger::empty_table());

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let temp = Arc::clone(&temp);
            thread::spawn(move || {
                for offset in 0..DAYS_PER_WRITER {
                    let day = GradeDate::new(1403, writer + 1, offset + 1);
                    temp.ledger()
                        .upsert(day, GradeType::Feed, &value("60"))
                        .unwrap();
                    temp.ledger()
                        .upsert(day, GradeType::Product, &value("55"))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let records = temp.ledger().load().unwrap();
    assert_eq!(records.len(), (WRITERS * DAYS_PER_WRITER) as usize);

    let dates: HashSet<_> = records.iter().map(|r| r.date).collect();
    assert_eq!(dates.len(), records.len());
    assert!(records
        .iter()
        .all(|r| r.feed == "60" && r.product == "55" && r.tailing.is_empty()));
}

#[test]
fn test_concurrent_writes_to_one_date() {
    let temp = Arc::new(TempLedger::new());
    let day = GradeDate::new(1403, 3, 3);

    let handles: Vec<_> = GradeType::ALL
        .into_iter()
        .map(|grade_type| {
            let temp = Arc::clone(&temp);
            thread::spawn(move || {
                temp.ledger()
                    .upsert(day, grade_type, &value("12.5"))
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let records = temp.ledger().load().unwrap();
    assert_eq!(records.len(), 1);
    assert!(GradeType::ALL
        .iter()
        .all(|t| records[0].get(*t) == "12.5"));
}
