#[allow(dead_code)]
mod test_helpers {
    include!("../common/test_helpers.rs");
}
use test_helpers::{records_with_ages, sample_records, table_with, CountingStore, TABLE};

use tegrows::{
    batch_processing, stream_batches, take, Batch, Error, FileStore, LazySequence, Record, Result,
};

#[test]
fn test_batches_concatenate_to_full_scan() -> Result<()> {
    let records = sample_records(23);
    let dir = table_with(&records);
    let store = FileStore::open(dir.path());

    let batches: Vec<Batch> = stream_batches(&store, TABLE, 5)?.collect::<Result<_>>()?;
    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
    assert_eq!(batches.concat(), records);
    Ok(())
}

#[test]
fn test_batch_stream_uses_one_session() -> Result<()> {
    let dir = table_with(&sample_records(120));
    let store = CountingStore::new(&dir);

    let count = stream_batches(&store, TABLE, 50)?.count();
    assert_eq!(count, 3);
    assert_eq!(store.counts.acquired.get(), 1);
    assert_eq!(store.counts.live(), 0);
    Ok(())
}

#[test]
fn test_batch_larger_than_table() -> Result<()> {
    let records = sample_records(4);
    let dir = table_with(&records);
    let store = FileStore::open(dir.path());

    let batches: Vec<Batch> = stream_batches(&store, TABLE, 50)?.collect::<Result<_>>()?;
    assert_eq!(batches, vec![records]);
    Ok(())
}

#[test]
fn test_zero_batch_size_is_invalid() {
    let dir = table_with(&sample_records(4));
    let store = CountingStore::new(&dir);

    assert!(matches!(
        stream_batches(&store, TABLE, 0),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(store.counts.acquired.get(), 0);
}

#[test]
fn test_take_one_batch_releases_session() -> Result<()> {
    let dir = table_with(&sample_records(100));
    let store = CountingStore::new(&dir);

    let mut first = take(stream_batches(&store, TABLE, 10)?, 1);
    let batch = first.next().transpose()?;
    assert_eq!(batch.map(|b| b.len()), Some(10));
    assert_eq!(store.counts.live(), 0);
    assert!(first.next().is_none());
    first.close()?;
    Ok(())
}

#[test]
fn test_batch_processing_keeps_older_records() -> Result<()> {
    let dir = table_with(&records_with_ages(&[18, 25, 26, 40, 25, 61, 12]));
    let store = CountingStore::new(&dir);

    let older: Vec<Record> = batch_processing(&store, TABLE, 3, 25)?.collect::<Result<_>>()?;
    let ages: Vec<u32> = older.iter().map(|r| r.age).collect();
    assert_eq!(ages, vec![26, 40, 61]);
    assert_eq!(store.counts.live(), 0);
    Ok(())
}

#[test]
fn test_batch_processing_take_stops_early() -> Result<()> {
    let dir = table_with(&sample_records(200));
    let store = CountingStore::new(&dir);

    let first_two: Vec<Record> =
        take(batch_processing(&store, TABLE, 50, 25)?, 2).collect::<Result<_>>()?;
    assert_eq!(first_two.len(), 2);
    assert!(first_two.iter().all(|r| r.age > 25));
    assert_eq!(store.counts.live(), 0);
    Ok(())
}
