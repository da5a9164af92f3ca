use anyhow::Result;

use super::cli::StoreArgs;
use super::util::{decode_record_arg, open_store};

pub fn exec(args: StoreArgs, key: String, record: String) -> Result<()> {
    let rec = decode_record_arg(&record)?;
    let store = open_store(&args, false)?;
    if store.update(&key, &rec)? {
        println!("UPDATED '{}'", key);
    } else {
        println!("UPDATE requested, but key '{}' was not found", key);
    }
    store.close()?;
    Ok(())
}
