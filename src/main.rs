mod args;
mod tlx;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{debug, error};
use snafu::ErrorCompat;

use crate::args::{Args, Command};

fn main() {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("args: {:?}", args);

    let database_url = match args.database_url.clone() {
        Some(url) => url,
        None => Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the result store must be given with --database-url or TLX_DATABASE_URL",
            )
            .exit(),
    };

    let res = match args.command {
        Command::Import {
            config,
            input,
            excel_worksheet_name,
        } => tlx::importer::run_import(&database_url, config, input, excel_worksheet_name)
            .map(|report| {
                println!(
                    "Imported {} of {} rows ({} skipped)",
                    report.records_written, report.rows_read, report.rows_skipped
                )
            }),
        Command::Serve { bind } => tlx::server::run_server(&database_url, &bind),
        Command::Report { out, reference } => {
            tlx::run_report(&database_url, out, reference)
        }
    };

    if let Err(e) = res {
        error!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
