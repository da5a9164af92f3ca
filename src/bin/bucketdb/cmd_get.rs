use anyhow::Result;

use BucketDB::{decode, encode};

use super::cli::StoreArgs;
use super::util::{open_store, record_line};

pub fn exec(args: StoreArgs, key: String, trim: bool) -> Result<()> {
    let store = open_store(&args, true)?;
    match store.read(&key)? {
        Some(rec) => {
            let rec = if trim {
                decode(&encode(&rec, store.schema()), store.schema())
            } else {
                rec
            };
            println!("FOUND '{}': {}", key, record_line(&store, &rec));
        }
        None => println!("NOT FOUND '{}'", key),
    }
    Ok(())
}
