use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use BucketDB::{FieldSpec, Record, ScanOptions, Schema, Store, StoreConfig, StoreError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("bdbtest-scan-{prefix}-{pid}-{t}-{id}"))
}

fn users_schema() -> Schema {
    Schema::new(
        vec![
            FieldSpec::int("user_id"),
            FieldSpec::text("username").fixed(10),
            FieldSpec::text("city"),
        ],
        "user_id",
    )
    .unwrap()
}

fn user(id: u32, city: &str) -> BTreeMap<String, String> {
    let mut r = BTreeMap::new();
    r.insert("user_id".to_string(), id.to_string());
    r.insert("username".to_string(), format!("u{id}"));
    r.insert("city".to_string(), city.to_string());
    r
}

fn populated(prefix: &str) -> Result<Store> {
    let root = unique_root(prefix);
    let cfg = StoreConfig::new(&root, users_schema())
        .with_num_buckets(3)
        .with_max_page_size(96);
    let store = Store::open(cfg)?;
    for i in 0..30u32 {
        let city = if i % 2 == 0 { "Oslo" } else { "Riga" };
        store.write(&user(i, city))?;
    }
    Ok(store)
}

#[test]
fn scan_all_visits_every_record_in_bucket_page_order() -> Result<()> {
    let store = populated("all")?;

    let mut keys = Vec::new();
    store.scan(&ScanOptions::default(), |k, r| {
        assert_eq!(r["user_id"], k);
        keys.push(k.parse::<u32>().unwrap());
        true
    })?;
    assert_eq!(keys.len(), 30);

    // бакеты по возрастанию: сначала все ключи ≡ 0 (mod 3), потом 1, потом 2
    let buckets: Vec<u32> = keys.iter().map(|k| k % 3).collect();
    let mut sorted = buckets.clone();
    sorted.sort();
    assert_eq!(buckets, sorted);

    // внутри бакета — порядок вставки, даже через overflow-страницы
    assert!(store.page_count(0)? > 1);
    let b0: Vec<u32> = keys.iter().copied().filter(|k| k % 3 == 0).collect();
    assert_eq!(b0, (0..30).filter(|k| k % 3 == 0).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn scan_filter_and_projection() -> Result<()> {
    let store = populated("filter")?;

    let in_oslo = |r: &Record| r["city"] == "Oslo";
    let fields = ["user_id", "city"];
    let opts = ScanOptions {
        filter: Some(&in_oslo),
        projection: Some(&fields[..]),
    };
    let rows = store.scan_all(&opts)?;
    assert_eq!(rows.len(), 15);
    for r in &rows {
        assert_eq!(r.len(), 2);
        assert_eq!(r["city"], "Oslo");
        assert!(!r.contains_key("username"));
        assert_eq!(r["user_id"].parse::<u32>()? % 2, 0);
    }
    Ok(())
}

#[test]
fn scan_stops_when_callback_returns_false() -> Result<()> {
    let store = populated("stop")?;
    let mut seen = 0;
    store.scan(&ScanOptions::default(), |_, _| {
        seen += 1;
        seen < 3
    })?;
    assert_eq!(seen, 3);
    Ok(())
}

#[test]
fn scan_unknown_projection_field_fails() -> Result<()> {
    let store = populated("badproj")?;
    let fields = ["nope"];
    let opts = ScanOptions {
        filter: None,
        projection: Some(&fields[..]),
    };
    let mut called = false;
    let err = store
        .scan(&opts, |_, _| {
            called = true;
            true
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)), "{err}");
    assert!(!called);
    Ok(())
}

#[test]
fn scan_skips_deleted_and_sees_updates() -> Result<()> {
    let store = populated("mut")?;
    assert!(store.delete("4")?);
    assert!(store.update("5", &user(5, "Kyiv"))?);

    let rows = store.scan_all(&ScanOptions::default())?;
    assert_eq!(rows.len(), 29);
    assert!(rows.iter().all(|r| r["user_id"] != "4"));
    let five = rows.iter().find(|r| r["user_id"] == "5").unwrap();
    assert_eq!(five["city"], "Kyiv");
    Ok(())
}

#[test]
fn stats_flush_close() -> Result<()> {
    let store = populated("stats")?;
    let stats = store.stats()?;
    assert_eq!(stats.buckets.len(), 3);
    assert_eq!(stats.total_rows, 30);
    let pages: usize = stats.buckets.iter().map(|b| b.pages.len()).sum();
    assert_eq!(stats.total_pages, pages);
    assert!(stats.total_pages > 3);
    let bytes: u64 = stats
        .buckets
        .iter()
        .flat_map(|b| b.pages.iter())
        .map(|p| p.bytes)
        .sum();
    assert_eq!(stats.total_bytes, bytes);
    assert_eq!(store.directory().count_used_buckets()?, 3);

    let json = serde_json::to_value(&stats)?;
    assert_eq!(json["total_rows"], 30);

    store.flush()?;
    let root = store.root().to_path_buf();
    store.close()?;

    // после close lock свободен
    let again = Store::open(StoreConfig::new(&root, users_schema()).with_num_buckets(3).with_max_page_size(96))?;
    assert_eq!(again.stats()?.total_rows, 30);
    Ok(())
}

#[test]
fn scan_callback_may_mutate_the_store() -> Result<()> {
    let store = populated("mutate-cb")?;

    // удаляем всех из Riga прямо из колбэка скана
    let mut deleted = 0;
    store.scan(&ScanOptions::default(), |k, r| {
        if r["city"] == "Riga" {
            assert!(store.delete(k).unwrap());
            deleted += 1;
        }
        true
    })?;
    assert_eq!(deleted, 15);

    let rows = store.scan_all(&ScanOptions::default())?;
    assert_eq!(rows.len(), 15);
    assert!(rows.iter().all(|r| r["city"] == "Oslo"));

    // update и write из колбэка тоже не блокируются
    store.scan(&ScanOptions::default(), |k, _| {
        let mut r = store.read(k).unwrap().unwrap();
        r.insert("city".to_string(), "Bergen".to_string());
        assert!(store.update(k, &r).unwrap());
        k != "0"
    })?;
    assert_eq!(store.read("0")?.unwrap()["city"], "Bergen");
    store.scan(&ScanOptions::default(), |_, _| {
        store.write(&user(1001, "Oslo")).unwrap();
        false
    })?;
    assert!(store.exists("1001")?);
    Ok(())
}
