#[allow(dead_code)]
mod test_helpers {
    include!("../common/test_helpers.rs");
}
use test_helpers::{records_with_ages, table_with, CountingStore, TABLE};

use proptest::prelude::*;
use tegrows::{
    paginate, streaming_mean, stream_batches, stream_rows, take, Batch, Page, Record, Result,
};

fn arb_ages() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..120, 0..60)
}

fn scan(store: &CountingStore) -> Result<Vec<Record>> {
    stream_rows(store, TABLE)?.collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn batches_concatenate_to_rows(ages in arb_ages(), batch_size in 1usize..12) {
        let dir = table_with(&records_with_ages(&ages));
        let store = CountingStore::new(&dir);

        let batches: Vec<Batch> = stream_batches(&store, TABLE, batch_size)
            .and_then(|b| b.collect())
            .unwrap();
        let last = batches.len().saturating_sub(1);
        for (i, batch) in batches.iter().enumerate() {
            prop_assert!(!batch.is_empty());
            if i < last {
                prop_assert_eq!(batch.len(), batch_size);
            } else {
                prop_assert!(batch.len() <= batch_size);
            }
        }
        prop_assert_eq!(batches.concat(), scan(&store).unwrap());
        prop_assert_eq!(store.counts.live(), 0);
    }

    #[test]
    fn pages_reconstruct_scan(ages in arb_ages(), page_size in 1usize..12) {
        let dir = table_with(&records_with_ages(&ages));
        let store = CountingStore::new(&dir);

        let pages: Vec<Page> = paginate(&store, TABLE, page_size)
            .and_then(|p| p.collect())
            .unwrap();
        prop_assert_eq!(pages.len(), ages.len().div_ceil(page_size));
        for (i, page) in pages.iter().enumerate() {
            prop_assert_eq!(page.offset, (i * page_size) as u64);
        }
        let flattened: Vec<Record> = pages.into_iter().flat_map(Page::into_records).collect();
        prop_assert_eq!(flattened, scan(&store).unwrap());
        prop_assert_eq!(store.counts.live(), 0);
    }

    #[test]
    fn mean_matches_sum_over_len(ages in arb_ages()) {
        let dir = table_with(&records_with_ages(&ages));
        let store = CountingStore::new(&dir);

        let mean = streaming_mean(&store, TABLE).unwrap();
        if ages.is_empty() {
            prop_assert_eq!(mean, None);
        } else {
            let expected =
                ages.iter().map(|&a| u64::from(a)).sum::<u64>() as f64 / ages.len() as f64;
            let mean = mean.unwrap();
            prop_assert!((mean - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn take_yields_prefix(ages in arb_ages(), n in 0usize..80) {
        let dir = table_with(&records_with_ages(&ages));
        let store = CountingStore::new(&dir);

        let taken: Vec<Record> = take(stream_rows(&store, TABLE).unwrap(), n)
            .collect::<Result<_>>()
            .unwrap();
        prop_assert_eq!(taken.len(), n.min(ages.len()));
        let all = scan(&store).unwrap();
        prop_assert_eq!(&taken[..], &all[..taken.len()]);
        prop_assert_eq!(store.counts.live(), 0);
    }
}
