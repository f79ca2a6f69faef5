//! Snapshot export through the real CSV persistor.

mod common;

use cmc_core::ManualClock;
use cmc_ingester::IngestionEngine;
use cmc_persistence::{BlobStore, CsvPersistor, DirBlobStore};
use cmc_schedule::InitStage;
use common::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_snapshot_header_follows_source_column_order() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DirBlobStore::open(dir.path().join("buckets"), "snapshots").unwrap());
    let persistor = Arc::new(CsvPersistor::new(store.clone(), dir.path().join("staging")));
    let client = Arc::new(ScriptedClient::new());
    let sink = Arc::new(RecordingSink::new());
    let clock = Arc::new(ManualClock::at_epoch());

    let config = test_config();
    let filename = config.persist.filename.clone();
    let mut engine = IngestionEngine::new(
        config,
        client.clone(),
        persistor,
        sink.clone(),
        clock.clone(),
    );

    client.always(GLOBAL_URL, global_doc(2));
    client.always(LISTING_URL, listing_doc(1..=2));
    client.always(
        ticker_url(1),
        json!({
            "data": [
                {
                    "id": 1, "name": "Asset 1", "symbol": "A1", "website_slug": "asset-1",
                    "rank": 1, "circulating_supply": 100.0,
                    "quotes": { "USD": { "price": 10.5, "volume_24h": 7.0 } },
                    "last_updated": 1_530_000_000
                },
                {
                    "id": 2, "name": "Asset 2", "symbol": "A2", "website_slug": "asset-2",
                    "rank": 2, "circulating_supply": 50.0,
                    "quotes": { "USD": { "price": 3.0, "volume_24h": 1.0 } },
                    "last_updated": 1_530_000_000
                }
            ],
            "metadata": { "error": null }
        }),
    );

    for _ in 0..3 {
        clock.advance(TICK);
        engine.step().await;
    }
    assert_eq!(engine.stage(), InitStage::Ready);
    assert_eq!(engine.snapshots(), 1);
    assert_eq!(sink.len(), 0);

    let text = String::from_utf8(store.read(&filename).unwrap()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some(
            "id,name,symbol,slug,rank,circulating_supply,\
             quotes.USD.price,quotes.USD.volume_24h,last_updated"
        )
    );
    assert_eq!(
        lines.next(),
        Some("1,Asset 1,A1,asset-1,1,100.0,10.5,7.0,1530000000")
    );
    assert_eq!(lines.count(), 1);
}
