use clap::{Parser, Subcommand};

/// Imports NASA-TLX usability study results and serves the comparison dashboard.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (connection string) The result store. Either a path to a SQLite file, a
    /// sqlite:// URL or ':memory:'.
    /// Required, either here or in the environment.
    #[clap(long, env = "TLX_DATABASE_URL", global = true, value_parser)]
    pub database_url: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reads the spreadsheet of study results and stores every usable row.
    Import {
        /// (file path, optional) A JSON file describing the spreadsheet: path, worksheet and column headers.
        #[clap(short, long, value_parser)]
        config: Option<String>,

        /// (file path, default data/experiment_results.xlsx) The Excel file to import. Overrides the
        /// path that may be specified with the --config option.
        #[clap(short, long, value_parser)]
        input: Option<String>,

        /// (default: first sheet) When using an Excel file, indicates the name of the worksheet to use.
        #[clap(long, value_parser)]
        excel_worksheet_name: Option<String>,
    },

    /// Serves the JSON API and the dashboard.
    Serve {
        /// (host:port) The address to listen on.
        #[clap(long, env = "TLX_BIND", default_value = "127.0.0.1:3000", value_parser)]
        bind: String,
    },

    /// Computes the results report without starting the server.
    Report {
        /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format to the given
        /// location.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (file path) A reference file containing an expected report in JSON format. If provided, tlxdash will
        /// check that the computed report matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_after_subcommand() {
        let args = Args::try_parse_from(["tlxdash", "serve", "--database-url", "x.sqlite"]).unwrap();
        assert_eq!(args.database_url.as_deref(), Some("x.sqlite"));
        assert!(matches!(args.command, Command::Serve { .. }));
    }

    #[test]
    fn database_url_before_subcommand() {
        let args = Args::try_parse_from([
            "tlxdash",
            "--database-url",
            "y.sqlite",
            "import",
            "--input",
            "study.xlsx",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(args.database_url.as_deref(), Some("y.sqlite"));
        assert!(args.verbose);
        match args.command {
            Command::Import { input, .. } => assert_eq!(input.as_deref(), Some("study.xlsx")),
            c => panic!("unexpected command {:?}", c),
        }
    }
}
