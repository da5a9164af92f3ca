use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use BucketDB::metrics;
use BucketDB::{FieldSpec, Schema, Store, StoreConfig};

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("bdbtest-metrics-{prefix}-{pid}-{t}"))
}

fn user(id: u32, name: &str) -> BTreeMap<String, String> {
    let mut r = BTreeMap::new();
    r.insert("user_id".to_string(), id.to_string());
    r.insert("username".to_string(), name.to_string());
    r
}

// Один тест на бинарь: счётчики глобальные.
#[test]
fn counters_track_store_operations() -> Result<()> {
    let root = unique_root("ops");
    let schema = Schema::new(
        vec![FieldSpec::int("user_id"), FieldSpec::text("username").fixed(8)],
        "user_id",
    )?;
    let store = Store::open(
        StoreConfig::new(&root, schema)
            .with_num_buckets(1)
            .with_max_page_size(64),
    )?;

    let before = metrics::snapshot();
    for i in 0..10u32 {
        store.write(&user(i, "x"))?;
    }
    assert!(store.write(&user(3, "dup")).is_err());
    store.read("3")?;
    store.read("99")?;
    // та же ширина → патч на месте
    assert!(store.update("4", &user(4, "y"))?);
    assert!(store.delete("5")?);
    let after = metrics::snapshot();

    assert!(after.writes_total >= before.writes_total + 10);
    assert!(after.duplicate_rejects >= before.duplicate_rejects + 1);
    assert!(after.reads_total >= before.reads_total + 2);
    assert!(after.updates_total >= before.updates_total + 1);
    assert!(after.deletes_total >= before.deletes_total + 1);
    assert!(after.overflow_pages_created >= before.overflow_pages_created + 1);
    assert!(after.page_inplace_patches >= before.page_inplace_patches + 1);
    assert!(after.page_rewrites >= before.page_rewrites + 1);
    assert!(after.row_bytes_appended >= before.row_bytes_appended + 10 * 12);
    assert!(after.inplace_ratio() > 0.0 && after.inplace_ratio() < 1.0);

    // промахи update/delete не считаются операциями
    assert!(!store.update("99", &user(99, "z"))?);
    assert!(!store.delete("99")?);
    let misses = metrics::snapshot();
    assert_eq!(misses.updates_total, after.updates_total);
    assert_eq!(misses.deletes_total, after.deletes_total);
    assert_eq!(misses.page_rewrites, after.page_rewrites);

    metrics::reset();
    let zero = metrics::snapshot();
    assert_eq!(zero.writes_total, 0);
    assert_eq!(zero.inplace_ratio(), 0.0);
    Ok(())
}
