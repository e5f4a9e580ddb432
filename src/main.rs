//! sheetmix command-line shell
//!
//! ```bash
//! # What was loaded, and how each column can be filtered
//! sheetmix --campaigns campaigns.xlsx --sales sales.csv inspect
//!
//! # Filter one table
//! sheetmix --campaigns campaigns.csv filter --table campaigns \
//!     --where status=active --where name=summer --out filtered.csv
//!
//! # Combine a chain of tables
//! sheetmix --campaigns c.csv --ad-sets s.csv --sales v.csv combine \
//!     --tables campaigns,ad_sets,sales \
//!     --key campaigns:ad_sets=id:campaign_id --key ad_sets:sales=id:ad_set_id \
//!     --mode left --out combined.parquet
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::{error, warn};

use sheetmix::data::export::{ExportFormat, export_file_name, preview, write_table};
use sheetmix::data::filter::{FilterSet, FilterSpec, summarize};
use sheetmix::data::loader::load_table;
use sheetmix::{
    ColumnKind, ColumnSelection, JoinExecutor, JoinKeyPair, JoinKeys, JoinMode, Settings, Table,
    TableRegistry, TableSlot, apply_filters, build_plan, column_kind,
};

#[derive(Parser, Debug)]
#[command(name = "sheetmix", version, about = "Filter and combine marketing spreadsheets")]
struct Args {
    /// Campaigns file (.csv, .xlsx, .json, .parquet)
    #[arg(long, value_name = "FILE", global = true)]
    campaigns: Option<PathBuf>,

    /// Ad sets file
    #[arg(long, value_name = "FILE", global = true)]
    ad_sets: Option<PathBuf>,

    /// Ads file
    #[arg(long, value_name = "FILE", global = true)]
    ads: Option<PathBuf>,

    /// Sales file
    #[arg(long, value_name = "FILE", global = true)]
    sales: Option<PathBuf>,

    /// Any other table, as NAME=FILE (repeatable)
    #[arg(long = "load", value_name = "NAME=FILE", global = true)]
    extra: Vec<String>,

    /// Settings file (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show each loaded table's size and the filter kind of every column
    Inspect,

    /// Filter one table and preview or export the result
    Filter {
        /// Table to filter
        #[arg(long)]
        table: String,

        /// COLUMN=VALUE[,VALUE...]; pick-list columns match values exactly,
        /// other columns match the text case-insensitively
        #[arg(long = "where", value_name = "COLUMN=VALUE")]
        conditions: Vec<String>,

        /// Output file or directory
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Join two or more tables left to right
    Combine {
        /// Comma-separated table names, in join order
        #[arg(long, value_delimiter = ',', required = true)]
        tables: Vec<String>,

        /// TABLE=COL[,COL...] columns to keep (repeatable)
        #[arg(long = "columns", value_name = "TABLE=COLS")]
        columns: Vec<String>,

        /// LEFT:RIGHT=LEFT_COL:RIGHT_COL for each adjacent pair (repeatable)
        #[arg(long = "key", value_name = "PAIR=COLS")]
        keys: Vec<String>,

        /// inner, left, right or outer
        #[arg(long, default_value = "inner")]
        mode: String,

        /// Output file or directory
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let settings = Settings::load_or_default(args.settings.as_deref())?;
    let registry = load_registry(&args)?;

    match args.command {
        Command::Inspect => inspect(&registry, &settings),
        Command::Filter {
            table,
            conditions,
            out,
        } => filter(&registry, &settings, &table, &conditions, out.as_deref()),
        Command::Combine {
            tables,
            columns,
            keys,
            mode,
            out,
        } => combine(&registry, &settings, &tables, &columns, &keys, &mode, out.as_deref()),
    }
}

fn load_registry(args: &Args) -> Result<TableRegistry> {
    let mut registry = TableRegistry::new();

    let slots = [
        (TableSlot::Campaigns, &args.campaigns),
        (TableSlot::AdSets, &args.ad_sets),
        (TableSlot::Ads, &args.ads),
        (TableSlot::Sales, &args.sales),
    ];
    for (slot, path) in slots {
        if let Some(path) = path {
            let table = load_table(slot.as_str(), path)
                .with_context(|| format!("loading {slot} from {}", path.display()))?;
            registry.put(table);
        }
    }

    for spec in &args.extra {
        let (name, path) = split_once(spec, '=')?;
        let path = Path::new(path);
        let table = load_table(name, path)
            .with_context(|| format!("loading {name} from {}", path.display()))?;
        registry.put(table);
    }

    if registry.is_empty() {
        bail!("no tables loaded; pass --campaigns, --ad-sets, --ads, --sales or --load NAME=FILE");
    }
    Ok(registry)
}

fn split_once(s: &str, sep: char) -> Result<(&str, &str)> {
    s.split_once(sep)
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .ok_or_else(|| anyhow!("expected '{sep}' in '{s}'"))
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

fn inspect(registry: &TableRegistry, settings: &Settings) -> Result<()> {
    for table in registry.iter() {
        println!("{}: {} rows, {} columns", table.name(), table.len(), table.width());
        for col in table.columns() {
            match column_kind(table, col, settings.categorical_max_distinct) {
                ColumnKind::Categorical { options } => {
                    let shown: Vec<String> =
                        options.iter().map(|v| v.as_text().into_owned()).collect();
                    println!("  {col}: pick from [{}]", shown.join(", "));
                }
                ColumnKind::FreeText => println!("  {col}: text"),
            }
        }
    }
    if !registry.can_combine() {
        println!("load at least two tables to combine them");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// filter
// ---------------------------------------------------------------------------

/// Turn `COLUMN=VALUE[,VALUE]` into specs, choosing the spec shape from the
/// column's kind.
fn parse_conditions(
    table: &Table,
    conditions: &[String],
    settings: &Settings,
) -> Result<FilterSet> {
    let mut specs = FilterSet::new();
    for cond in conditions {
        let (column, raw) = split_once(cond, '=')?;
        let spec = match column_kind(table, column, settings.categorical_max_distinct) {
            ColumnKind::Categorical { options } => {
                let wanted: Vec<&str> = raw.split(',').map(str::trim).collect();
                let spec = FilterSpec::Categorical(
                    options
                        .into_iter()
                        .filter(|v| wanted.iter().any(|w| *w == v.as_text()))
                        .collect(),
                );
                if !spec.is_active() {
                    warn!("'{raw}' matches no value of '{column}'; filter ignored");
                }
                spec
            }
            ColumnKind::FreeText => FilterSpec::text(raw),
        };
        if specs.insert(column.to_string(), spec).is_some() {
            bail!("column '{column}' filtered more than once");
        }
    }
    Ok(specs)
}

fn filter(
    registry: &TableRegistry,
    settings: &Settings,
    name: &str,
    conditions: &[String],
    out: Option<&Path>,
) -> Result<()> {
    let table = registry.get_or_err(name)?;
    let specs = parse_conditions(table, conditions, settings)?;
    let filtered = apply_filters(table, &specs);

    println!("{name}: {}", summarize(table, &filtered));
    println!("{}", preview(&filtered, settings.preview_rows)?);

    if let Some(out) = out {
        let path = output_path(out, &format!("{name}_filtered"));
        write_table(&filtered, &path)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// combine
// ---------------------------------------------------------------------------

fn parse_columns(
    registry: &TableRegistry,
    tables: &[String],
    columns: &[String],
    settings: &Settings,
) -> Result<ColumnSelection> {
    let mut selection = ColumnSelection::new();
    for spec in columns {
        let (table, cols) = split_once(spec, '=')?;
        selection.insert(
            table.to_string(),
            cols.split(',').map(|c| c.trim().to_string()).collect(),
        );
    }

    if let Some(width) = settings.default_projection_width {
        for name in tables {
            if selection.contains_key(name) {
                continue;
            }
            let table = registry.get_or_err(name)?;
            selection.insert(
                name.clone(),
                table.columns().iter().take(width).cloned().collect(),
            );
        }
    }
    Ok(selection)
}

fn parse_keys(keys: &[String]) -> Result<JoinKeys> {
    let mut join_keys = JoinKeys::new();
    for spec in keys {
        let (pair, cols) = split_once(spec, '=')?;
        let (left, right) = split_once(pair, ':')?;
        let (left_col, right_col) = split_once(cols, ':')?;
        join_keys.insert(
            (left.to_string(), right.to_string()),
            JoinKeyPair::new(left_col, right_col),
        );
    }
    Ok(join_keys)
}

fn combine(
    registry: &TableRegistry,
    settings: &Settings,
    tables: &[String],
    columns: &[String],
    keys: &[String],
    mode: &str,
    out: Option<&Path>,
) -> Result<()> {
    let mode: JoinMode = mode.parse()?;
    let selection = parse_columns(registry, tables, columns, settings)?;
    let join_keys = parse_keys(keys)?;

    let plan = build_plan(registry, tables, &selection, &join_keys, mode)?;
    let result = JoinExecutor::new()
        .with_fan_out_warning(settings.fan_out_warn_factor)
        .execute(&plan)?;

    println!("{}: {} rows, {} columns", result.name(), result.len(), result.width());
    println!("{}", preview(&result, settings.preview_rows)?);

    if let Some(out) = out {
        let path = output_path(out, "custom_combination");
        write_table(&result, &path)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// A directory gets `<stem>.csv` inside it; anything else is used as given.
fn output_path(out: &Path, stem: &str) -> PathBuf {
    if out.is_dir() {
        out.join(export_file_name(stem, ExportFormat::Csv))
    } else {
        out.to_path_buf()
    }
}
