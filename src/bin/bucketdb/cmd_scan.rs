use anyhow::Result;

use BucketDB::ScanOptions;

use super::cli::StoreArgs;
use super::util::{open_store, record_line};

pub fn exec(args: StoreArgs, fields: Option<Vec<String>>, json: bool, stream: bool) -> Result<()> {
    let store = open_store(&args, true)?;
    let field_refs: Option<Vec<&str>> = fields
        .as_ref()
        .map(|v| v.iter().map(|s| s.as_str()).collect());
    let opts = ScanOptions {
        filter: None,
        projection: field_refs.as_deref(),
    };

    if stream {
        store.scan(&opts, |key, rec| {
            if json {
                println!("{}", record_line(&store, rec));
            } else {
                println!("key={} -> {}", key, record_line(&store, rec));
            }
            true
        })?;
        return Ok(());
    }

    let acc = store.scan_all(&opts)?;
    if json {
        let arr: Vec<serde_json::Value> = acc
            .iter()
            .map(|r| BucketDB::codec::record_to_json(r, store.schema()))
            .collect();
        println!("{}", serde_json::Value::Array(arr));
    } else if acc.is_empty() {
        println!("(no records)");
    } else {
        for rec in &acc {
            println!("{}", record_line(&store, rec));
        }
    }
    Ok(())
}
