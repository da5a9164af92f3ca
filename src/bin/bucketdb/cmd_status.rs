use anyhow::Result;

use super::cli::StoreArgs;
use super::util::open_store;

pub fn exec(args: StoreArgs, json: bool) -> Result<()> {
    let store = open_store(&args, true)?;
    let stats = store.stats()?;
    let used = store.directory().count_used_buckets()?;

    if json {
        let out = serde_json::json!({
            "path": store.root().display().to_string(),
            "config": store.config().to_string(),
            "used_buckets": used,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("BucketDB status");
    println!("  path:          {}", store.root().display());
    println!("  schema:        {}", store.schema());
    println!("  buckets:       {} (used {})", store.bucket_count(), used);
    println!("  max_page_size: {}", store.config().max_page_size);
    println!(
        "  totals:        pages={} rows={} bytes={}",
        stats.total_pages, stats.total_rows, stats.total_bytes
    );
    for b in &stats.buckets {
        let overflow = b.pages.len().saturating_sub(1);
        let rows: usize = b.pages.iter().map(|p| p.rows).sum();
        let bytes: u64 = b.pages.iter().map(|p| p.bytes).sum();
        println!(
            "  bucket {:>3}: pages={} (overflow {}) rows={} bytes={}",
            b.bucket,
            b.pages.len(),
            overflow,
            rows,
            bytes
        );
    }
    Ok(())
}
