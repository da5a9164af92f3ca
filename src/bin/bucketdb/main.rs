use anyhow::Result;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_put;
mod cmd_get;
mod cmd_update;
mod cmd_del;
mod cmd_scan;
mod cmd_status;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт — info.
    // Пример: RUST_LOG=debug ./bucketdb get --path ./db --key 5
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Put { store, record } =>
            cmd_put::exec(store, record),

        cli::Cmd::Get { store, key, trim } =>
            cmd_get::exec(store, key, trim),

        cli::Cmd::Update { store, key, record } =>
            cmd_update::exec(store, key, record),

        cli::Cmd::Del { store, key } =>
            cmd_del::exec(store, key),

        cli::Cmd::Scan { store, fields, json, stream } =>
            cmd_scan::exec(store, fields, json, stream),

        cli::Cmd::Status { store, json } =>
            cmd_status::exec(store, json),
    }
}
