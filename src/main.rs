use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use fedsplit::config;
use fedsplit::query_ast::{DecompositionPlan, route_plan};

#[derive(Parser)]
#[command(name = "fedsplit")]
#[command(about = "Split a federated SELECT into per-backend sub-queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct QueryInput {
    /// SQL text; read from stdin when neither this nor --file is given
    sql: Option<String>,
    /// Read the SQL from a file
    #[arg(long, conflicts_with = "sql")]
    file: Option<PathBuf>,
    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decomposition plan as JSON
    Decompose {
        #[command(flatten)]
        input: QueryInput,
    },
    /// Decompose, then print one dispatch per table rendered for its backend
    Route {
        #[command(flatten)]
        input: QueryInput,
        /// Catalog JSON (defaults to catalog.json in the data directory)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn read_sql(input: &QueryInput) -> anyhow::Result<String> {
    let sql = match (&input.sql, &input.file) {
        (Some(sql), _) => sql.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading SQL from stdin")?;
            buf
        }
    };
    if sql.trim().is_empty() {
        bail!("no SQL given");
    }
    Ok(sql)
}

fn decompose_input(input: &QueryInput) -> anyhow::Result<DecompositionPlan> {
    let sql = read_sql(input)?;
    fedsplit::decompose_sql(&sql).context("query rejected")
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? })
}

fn main() -> anyhow::Result<()> {
    fedsplit::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Decompose { input } => {
            let plan = decompose_input(&input)?;
            println!("{}", to_json(&plan, input.pretty)?);
        }
        Commands::Route { input, catalog } => {
            let catalog = match catalog {
                Some(path) => config::load_catalog(&path)?,
                None => config::load_default_catalog()?,
            };
            let plan = decompose_input(&input)?;
            let dispatches = route_plan(&catalog, &plan).context("routing failed")?;
            println!("{}", to_json(&dispatches, input.pretty)?);
        }
    }
    Ok(())
}
