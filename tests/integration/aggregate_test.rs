#[allow(dead_code)]
mod test_helpers {
    include!("../common/test_helpers.rs");
}
use test_helpers::{records_with_ages, table_with, write_table, CountingStore, TABLE};

use std::fs;
use tegrows::{age_summary, streaming_mean, Error, FileStore, Result, TableReader};

#[test]
fn test_mean_of_twenty_thirty_forty() -> Result<()> {
    let dir = table_with(&records_with_ages(&[20, 30, 40]));
    let store = CountingStore::new(&dir);

    assert_eq!(streaming_mean(&store, TABLE)?, Some(30.0));
    assert_eq!(store.counts.acquired.get(), 1);
    assert_eq!(store.counts.live(), 0);
    Ok(())
}

#[test]
fn test_empty_table_has_no_mean() -> Result<()> {
    let dir = table_with(&[]);
    let store = FileStore::open(dir.path());

    assert_eq!(streaming_mean(&store, TABLE)?, None);
    assert_eq!(age_summary(&store, TABLE)?.count(), 0);
    Ok(())
}

#[test]
fn test_summary_counts_and_sums() -> Result<()> {
    let dir = table_with(&records_with_ages(&[18, 19, 65, 70]));
    let reader = TableReader::new(FileStore::open(dir.path()), TABLE);

    let summary = reader.age_summary()?;
    assert_eq!(summary.count(), 4);
    assert_eq!(summary.sum(), 172);
    assert_eq!(reader.streaming_mean()?, Some(43.0));
    Ok(())
}

#[test]
fn test_negative_age_fails_and_releases() -> Result<()> {
    let dir = table_with(&records_with_ages(&[20, 30]));
    let path = dir.path().join(format!("{TABLE}.jsonl"));
    let mut contents = fs::read_to_string(&path)?;
    contents.push_str(
        "{\"user_id\":\"u3\",\"name\":\"Bad\",\"email\":\"bad@example.com\",\"age\":-1}\n",
    );
    fs::write(&path, contents)?;
    let store = CountingStore::new(&dir);

    assert!(matches!(
        streaming_mean(&store, TABLE),
        Err(Error::Query(_))
    ));
    assert_eq!(store.counts.live(), 0);
    Ok(())
}

#[test]
fn test_mean_of_other_table() -> Result<()> {
    let dir = table_with(&records_with_ages(&[1]));
    write_table(&dir, "staff", &records_with_ages(&[30, 31]));
    let store = FileStore::open(dir.path());

    assert_eq!(streaming_mean(&store, "staff")?, Some(30.5));
    Ok(())
}
