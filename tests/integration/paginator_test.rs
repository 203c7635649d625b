#[allow(dead_code)]
mod test_helpers {
    include!("../common/test_helpers.rs");
}
use test_helpers::{sample_records, table_with, CountingStore, TABLE};

use tegrows::{fetch_page, paginate, take, Error, FileStore, Page, Record, Result, TableReader};

#[test]
fn test_twenty_five_rows_in_pages_of_ten() -> Result<()> {
    let records = sample_records(25);
    let dir = table_with(&records);
    let store = CountingStore::new(&dir);

    let pages: Vec<Page> = paginate(&store, TABLE, 10)?.collect::<Result<_>>()?;
    let sizes: Vec<usize> = pages.iter().map(Page::len).collect();
    assert_eq!(sizes, vec![10, 10, 5]);

    let flattened: Vec<Record> = pages.into_iter().flat_map(Page::into_records).collect();
    assert_eq!(flattened, records);
    assert_eq!(store.counts.acquired.get(), 4);
    assert_eq!(store.counts.live(), 0);
    Ok(())
}

#[test]
fn test_each_page_holds_no_session_afterwards() -> Result<()> {
    let dir = table_with(&sample_records(30));
    let store = CountingStore::new(&dir);

    let mut pages = paginate(&store, TABLE, 10)?;
    for expected_offset in [0, 10, 20] {
        let page = pages.next().transpose()?;
        assert_eq!(page.map(|p| p.offset), Some(expected_offset));
        assert_eq!(store.counts.live(), 0);
    }
    assert!(pages.next().is_none());
    assert!(pages.is_done());
    Ok(())
}

#[test]
fn test_fetch_page_at_offset() -> Result<()> {
    let records = sample_records(12);
    let dir = table_with(&records);
    let store = FileStore::open(dir.path());

    let page = fetch_page(&store, TABLE, 5, 10)?;
    assert_eq!(page.offset, 10);
    assert_eq!(page.records, records[10..].to_vec());

    let past_end = fetch_page(&store, TABLE, 5, 40)?;
    assert!(past_end.is_empty());
    Ok(())
}

#[test]
fn test_zero_page_size_is_invalid() {
    let dir = table_with(&sample_records(3));
    let store = CountingStore::new(&dir);

    assert!(matches!(
        paginate(&store, TABLE, 0),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(store.counts.acquired.get(), 0);
}

#[test]
fn test_missing_table_ends_pagination_with_error() -> Result<()> {
    let dir = table_with(&[]);
    let store = CountingStore::new(&dir);

    let mut pages = paginate(&store, "orders", 10)?;
    assert!(matches!(pages.next(), Some(Err(Error::TableNotFound(_)))));
    assert!(pages.next().is_none());
    assert_eq!(store.counts.live(), 0);
    Ok(())
}

#[test]
fn test_take_limits_pages_fetched() -> Result<()> {
    let dir = table_with(&sample_records(100));
    let store = CountingStore::new(&dir);

    let pages: Vec<Page> = take(paginate(&store, TABLE, 10)?, 2).collect::<Result<_>>()?;
    assert_eq!(pages.len(), 2);
    assert_eq!(store.counts.acquired.get(), 2);
    Ok(())
}

#[test]
fn test_reader_paginates_configured_table() -> Result<()> {
    let dir = table_with(&sample_records(7));
    let reader = TableReader::new(FileStore::open(dir.path()), TABLE);

    let sizes: Vec<usize> = reader
        .paginate(3)?
        .map(|page| page.map(|p| p.len()))
        .collect::<Result<_>>()?;
    assert_eq!(sizes, vec![3, 3, 1]);
    Ok(())
}
