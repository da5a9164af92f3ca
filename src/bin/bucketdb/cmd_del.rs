use anyhow::Result;

use super::cli::StoreArgs;
use super::util::open_store;

pub fn exec(args: StoreArgs, key: String) -> Result<()> {
    let store = open_store(&args, false)?;
    if store.delete(&key)? {
        println!("DELETED '{}'", key);
    } else {
        println!("DELETE requested, but key '{}' was not found", key);
    }
    store.close()?;
    Ok(())
}
