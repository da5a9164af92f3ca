use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Минимальный CLI для BucketDB
#[derive(Parser, Debug)]
#[command(name = "bucketdb", version, about = "BucketDB CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Параметры открытия хранилища, общие для всех команд.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store root (page files live directly inside)
    #[arg(long)]
    pub path: PathBuf,
    /// Schema JSON; default <path>/schema/schema.json
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Bucket count (must match the existing store)
    #[arg(long)]
    pub buckets: Option<u32>,
    /// Nominal page capacity in bytes
    #[arg(long)]
    pub page_size: Option<u64>,
    /// Page file base name
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Insert a record (JSON object, or @file.json)
    ///
    /// Пример:
    ///   bucketdb put --path ./db --record '{"user_id":"5","username":"alice"}'
    Put {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        record: String,
    },
    /// Read a record by key
    Get {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        key: String,
        /// Strip fixed-length padding from values
        #[arg(long, default_value_t = false)]
        trim: bool,
    },
    /// Replace the record stored under key
    Update {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        key: String,
        #[arg(long)]
        record: String,
    },
    /// Delete a record by key
    Del {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long)]
        key: String,
    },
    /// Scan all records. --fields projects a comma-separated subset.
    Scan {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
        /// JSON array output (JSONL with --stream)
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long, default_value_t = false)]
        stream: bool,
    },
    /// Print bucket/page summary
    Status {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Cli as Parser>::parse()
    }
}
