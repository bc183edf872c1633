use crate::config::{parse_filter_date, FileNaming, RunConfig, SplitConfig};
use crate::error::{SplitError, SplitResult};
use crate::excel::WorkbookReader;
use crate::splitter::{self, SplitReport, Splitter, WorkbookOverview};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Arguments of the split command
#[derive(Debug, Clone, Default)]
pub struct SplitArgs {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// `YYYY-MM-DD` or `today`
    pub date: Option<String>,
    pub no_date_suffix: bool,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
}

/// Load the YAML configuration, or the defaults when none is given
fn load_config(path: Option<&Path>) -> SplitResult<SplitConfig> {
    match path {
        Some(path) => SplitConfig::from_yaml_file(path),
        None => Ok(SplitConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> SplitResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SplitError::Export(format!("Failed to serialize report: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Execute the split command
pub fn split(args: SplitArgs) -> SplitResult<()> {
    // Fail on a bad date or config before touching the workbook
    let filter_date = args.date.as_deref().map(parse_filter_date).transpose()?;
    let config = load_config(args.config.as_deref())?;

    let naming = if args.no_date_suffix {
        FileNaming::Key
    } else {
        FileNaming::KeyAndDate
    };
    let run = RunConfig::new(&args.source, &args.destination)
        .with_filter_date(filter_date)
        .with_naming(naming)
        .with_dry_run(args.dry_run);

    if !args.json {
        println!("{}", "📂 Sheet Splitter - Splitting workbook".bold().green());
        println!("   Source:      {}", args.source.display());
        println!("   Destination: {}", args.destination.display());
        if let Some(date) = filter_date {
            println!("   Date filter: {}", date.to_string().bright_yellow().bold());
        }
        println!();

        if args.dry_run {
            println!(
                "{}",
                "📋 DRY RUN MODE - No files will be written\n".yellow()
            );
        }
        if args.verbose {
            println!("{}", "📖 Reading workbook...".cyan());
        }
    }

    let report = Splitter::new(config, run).run()?;

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report, args.verbose);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(SplitError::PartialFailure {
            failed: report.failures.len(),
            total: report.partition_count(),
        })
    }
}

fn print_report(report: &SplitReport, verbose: bool) {
    if verbose {
        println!(
            "   Read {} sheets, skipped {:?}\n",
            report.sheets_read, report.excluded_sheets
        );
    }

    let verb = if report.dry_run { "Would create" } else { "Created" };
    for output in &report.outputs {
        println!(
            "   {} {} {}",
            "✅".green(),
            verb,
            output.path.display().to_string().bright_blue()
        );
        if verbose {
            for sheet in &output.sheets {
                println!("      {} ({} rows)", sheet.name.cyan(), sheet.rows);
            }
        }
    }

    for failure in &report.failures {
        println!(
            "   {} {} ({}): {}",
            "❌".red(),
            failure.path.display(),
            failure.key.bright_blue(),
            failure.error.red()
        );
    }
    println!();

    if report.outputs.is_empty() && report.failures.is_empty() {
        println!("{}", "⚠️  No partition keys found - nothing to write".yellow());
    } else if report.is_success() {
        println!(
            "{}",
            format!("✅ {} workbook(s) done", report.outputs.len())
                .bold()
                .green()
        );
    } else {
        println!(
            "{}",
            format!(
                "❌ {} of {} workbook(s) failed",
                report.failures.len(),
                report.partition_count()
            )
            .bold()
            .red()
        );
    }
}

/// Execute the inspect command
pub fn inspect(source: PathBuf, config: Option<PathBuf>, json: bool) -> SplitResult<()> {
    let config = load_config(config.as_deref())?;
    let workbook = WorkbookReader::new(&source).read()?;
    let overview = splitter::inspect(&workbook, &config)?;

    if json {
        return print_json(&overview);
    }

    print_overview(&overview);
    Ok(())
}

fn print_overview(overview: &WorkbookOverview) {
    println!("{}", "🔍 Sheet Splitter - Workbook overview".bold().green());
    println!("   Source: {}\n", overview.source.display());

    println!("{}", "📋 Sheets:".bold().cyan());
    for sheet in &overview.sheets {
        let treatment = if sheet.excluded {
            "excluded".red().to_string()
        } else {
            match (&sheet.key_column, &sheet.date_column) {
                (Some(key), Some(date)) => format!("filtered by '{}' and '{}'", key, date),
                (Some(key), None) => format!("filtered by '{}'", key),
                _ => "copied unfiltered".to_string(),
            }
        };
        println!(
            "   {} ({} rows, {} columns) - {}",
            sheet.name.bright_blue().bold(),
            sheet.rows,
            sheet.columns,
            treatment
        );
    }
    println!();

    println!(
        "{}",
        format!("🔑 Partition keys ({}):", overview.keys.len())
            .bold()
            .cyan()
    );
    for key in &overview.keys {
        println!("   {} ({} rows)", key.key.bright_blue(), key.rows);
    }
    println!();
}
