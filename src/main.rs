use clap::{Parser, Subcommand};
use sheet_splitter::cli::{self, SplitArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "splitter")]
#[command(about = "Split a master workbook into one workbook per contractor.")]
#[command(long_about = "Sheet Splitter - one workbook in, one workbook per contractor out

Takes the distinct values of the 'Όνομα' / 'Name' column of the
'Aggregated Data' sheet and writes one .xlsx per value containing:
  - a 'mail copy&paste' sheet with the fixed summary columns
  - every other sheet filtered to that value ('Last Drop' is skipped)
  - 'Summary of Actions' limited to the SR IDs of the summary sheet

COMMANDS:
  split     - Write the per-contractor workbooks
  inspect   - Show sheets and partition keys without writing anything

EXAMPLES:
  splitter split master.xlsx out/                      # One file per contractor
  splitter split master.xlsx out/ --date 2024-07-01    # Only that day's requests
  splitter split master.xlsx out/ --date today --dry-run
  splitter inspect master.xlsx")]
#[command(version)]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Split the source workbook into one workbook per contractor.

The workbook is validated before anything is written: a missing
'Aggregated Data' sheet, a missing column, or an invalid date aborts
the run with no output.

DATE FILTER:
  --date 2024-07-01   keep only rows whose 'Request Date' falls on that day,
                      in sheets that have both a name and a date column
  --date today        use the current local date

  Files are named {name}_{date}.xlsx when a date filter is active,
  or {name}.xlsx with --no-date-suffix (and always without a date filter).

CONFIGURATION:
  --config splitter.yaml overrides sheet and column names, e.g.

  key_column: [Όνομα, Name]
  excluded_sheets: [Last Drop]
  mail_copy_columns: [SR ID, Name, Request Date]

If one output file cannot be written the remaining ones are still
attempted, and the command exits with an error.")]
    /// Write one workbook per contractor
    Split {
        /// Source workbook (.xlsx, .xlsm, .xls, .ods)
        source: PathBuf,

        /// Output folder (created if missing)
        destination: PathBuf,

        /// Only keep rows requested on this date (YYYY-MM-DD or 'today')
        #[arg(short, long)]
        date: Option<String>,

        /// Name files {name}.xlsx even when a date filter is active
        #[arg(long)]
        no_date_suffix: bool,

        /// YAML file overriding sheet and column names
        #[arg(short, long, env = "SPLITTER_CONFIG")]
        config: Option<PathBuf>,

        /// Validate and plan without writing any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show sheets and partition keys without writing anything
    Inspect {
        /// Source workbook (.xlsx, .xlsm, .xls, .ods)
        source: PathBuf,

        /// YAML file overriding sheet and column names
        #[arg(short, long, env = "SPLITTER_CONFIG")]
        config: Option<PathBuf>,

        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "sheet_splitter=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Split {
            source,
            destination,
            date,
            no_date_suffix,
            config,
            dry_run,
            json,
        } => cli::split(SplitArgs {
            source,
            destination,
            date,
            no_date_suffix,
            config,
            dry_run,
            json,
            verbose: cli.verbose,
        })?,

        Commands::Inspect {
            source,
            config,
            json,
        } => cli::inspect(source, config, json)?,
    }

    Ok(())
}
