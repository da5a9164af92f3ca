use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use BucketDB::codec::{record_from_json, record_to_json};
use BucketDB::consts::SCHEMA_REL_PATH;
use BucketDB::{Record, Schema, Store, StoreConfig};

use super::cli::StoreArgs;

pub fn open_store(args: &StoreArgs, readonly: bool) -> Result<Store> {
    let schema_path = args
        .schema
        .clone()
        .unwrap_or_else(|| args.path.join(SCHEMA_REL_PATH));
    let schema = Schema::load(&schema_path)
        .with_context(|| format!("load schema {}", schema_path.display()))?;

    let mut cfg = StoreConfig::from_env(args.path.clone(), schema);
    if let Some(n) = args.buckets {
        cfg = cfg.with_num_buckets(n);
    }
    if let Some(ps) = args.page_size {
        cfg = cfg.with_max_page_size(ps);
    }
    if let Some(t) = &args.table {
        cfg = cfg.with_table(t.clone());
    }

    let store = if readonly {
        Store::open_ro(cfg)
    } else {
        Store::open(cfg)
    };
    store.with_context(|| format!("open store {}", args.path.display()))
}

/// JSON-литерал или @path к JSON-файлу.
pub fn decode_record_arg(arg: &str) -> Result<Record> {
    let text = match arg.strip_prefix('@') {
        Some(p) => {
            let path = PathBuf::from(p);
            std::fs::read_to_string(&path)
                .map_err(|e| anyhow!("open record file {}: {}", path.display(), e))?
        }
        None => arg.to_string(),
    };
    let v: serde_json::Value = serde_json::from_str(&text).context("parse record JSON")?;
    Ok(record_from_json(&v)?)
}

pub fn record_line(store: &Store, rec: &Record) -> String {
    record_to_json(rec, store.schema()).to_string()
}
