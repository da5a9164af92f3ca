use anyhow::Result;

use BucketDB::StoreError;

use super::cli::StoreArgs;
use super::util::{decode_record_arg, open_store};

pub fn exec(args: StoreArgs, record: String) -> Result<()> {
    let rec = decode_record_arg(&record)?;
    let store = open_store(&args, false)?;
    match store.write(&rec) {
        Ok(key) => {
            let bucket = store.bucket_of(&key)?;
            println!("OK put: key='{}' -> bucket {}", key, bucket);
        }
        Err(StoreError::DuplicateKey { key, bucket }) => {
            println!("REJECTED duplicate key '{}' (bucket {})", key, bucket);
        }
        Err(e) => return Err(e.into()),
    }
    store.close()?;
    Ok(())
}
