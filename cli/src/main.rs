//! togm CLI: schema checks, compiled finds and finds against Neo4j
//!
//! Connection settings come from `TOGM_NEO4J_*` variables, an optional config
//! file, and the flags below, in increasing precedence.

use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::{Path, PathBuf};
use togm::query::{Condition, FindQuery, Selection};
use togm::session::read_transaction;
use togm::{GraphDefinition, Value};
use togm_neo4j::{Neo4jConfig, Neo4jDriver};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "togm", version, about = "Typed object-graph mapper CLI")]
struct Cli {
    /// Graph schema document (YAML or JSON)
    #[arg(long, global = true, env = "TOGM_SCHEMA")]
    schema: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(clap::Args)]
struct FindArgs {
    /// Node label to find
    label: String,

    /// Selection document, e.g. '{"actors": {}}'
    #[arg(long = "select", default_value = "{}")]
    selection: String,

    /// Condition document, e.g. '{"released": {">": 1999}}'
    #[arg(long = "where", default_value = "{}")]
    condition: String,

    /// Return at most one row
    #[arg(long)]
    one: bool,
}

#[derive(clap::Args)]
struct ConnectionArgs {
    /// Connection config file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bolt URI
    #[arg(long)]
    uri: Option<String>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[arg(long)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a schema document
    Check,
    /// Print the Cypher and parameters for a find
    Compile {
        #[command(flatten)]
        find: FindArgs,
    },
    /// Run a find against Neo4j
    Find {
        #[command(flatten)]
        find: FindArgs,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Check => run_check(cli.schema.as_deref(), &cli.format),
        Commands::Compile { find } => run_compile(cli.schema.as_deref(), find, &cli.format),
        Commands::Find { find, connection } => {
            run_find(cli.schema.as_deref(), find, connection, &cli.format).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_schema(path: Option<&Path>) -> CliResult<GraphDefinition> {
    let path = path.ok_or("no schema given (use --schema or TOGM_SCHEMA)")?;
    Ok(GraphDefinition::from_path(path)?)
}

fn compile_find(graph: &GraphDefinition, args: &FindArgs) -> CliResult<FindQuery> {
    let selection = Selection::from_json(&serde_json::from_str(&args.selection)?)?;
    let condition = Condition::from_json(&serde_json::from_str(&args.condition)?)?;
    let query = FindQuery::new(graph, &args.label, &selection, &condition)?;
    Ok(if args.one { query.first() } else { query })
}

fn connection_config(args: &ConnectionArgs) -> CliResult<Neo4jConfig> {
    let mut config = match &args.config {
        Some(path) => Neo4jConfig::from_path(path)?,
        None => Neo4jConfig::from_env()?,
    };
    if let Some(uri) = &args.uri {
        config.uri = uri.clone();
    }
    if let Some(user) = &args.user {
        config.user = user.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(database) = &args.database {
        config.database = Some(database.clone());
    }
    Ok(config)
}

fn run_check(schema: Option<&Path>, format: &OutputFormat) -> CliResult<()> {
    let graph = load_schema(schema)?;

    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "nodes": graph.nodes().map(|(label, _)| label).collect::<Vec<_>>(),
                "relationships": graph.relationships().map(|(t, _)| t).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Kind", "Name", "Properties", "References"]);
            for (label, node) in graph.nodes() {
                table.add_row(vec![
                    "node".to_string(),
                    label.to_string(),
                    describe_properties(node.properties.iter()),
                    node.references
                        .iter()
                        .map(|(name, reference)| format!("{}: {}", name, reference))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ]);
            }
            for (relationship_type, relationship) in graph.relationships() {
                table.add_row(vec![
                    "relationship".to_string(),
                    relationship_type.to_string(),
                    describe_properties(relationship.properties.iter()),
                    String::new(),
                ]);
            }
            println!("{}", table);
            println!("Schema OK");
        }
    }

    Ok(())
}

fn describe_properties<'a>(
    properties: impl Iterator<Item = (&'a String, &'a togm::Property)>,
) -> String {
    properties
        .map(|(name, property)| format!("{}: {}", name, property))
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_compile(schema: Option<&Path>, args: &FindArgs, format: &OutputFormat) -> CliResult<()> {
    let graph = load_schema(schema)?;
    let query = compile_find(&graph, args)?;
    let statement = query.statement();
    let parameters = Value::Map(statement.parameters.clone()).to_json();

    match format {
        OutputFormat::Json => {
            let compiled = serde_json::json!({
                "text": statement.text,
                "parameters": parameters,
                "shape": query.shape().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&compiled)?);
        }
        OutputFormat::Table => {
            println!("{}", statement.text);
            println!();
            println!("Parameters: {}", serde_json::to_string_pretty(&parameters)?);
            println!("Shape:      {}", query.shape());
        }
    }

    Ok(())
}

async fn run_find(
    schema: Option<&Path>,
    args: &FindArgs,
    connection: &ConnectionArgs,
    format: &OutputFormat,
) -> CliResult<()> {
    let graph = load_schema(schema)?;
    let query = compile_find(&graph, args)?;
    let driver = Neo4jDriver::connect(&connection_config(connection)?).await?;

    let rows = read_transaction(&driver, |tx| {
        let query = &query;
        async move { query.fetch(Some(&tx)).await }
    })
    .await?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = rows.iter().map(Value::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => print_table(&rows),
    }

    Ok(())
}

fn print_table(rows: &[Value]) {
    let Some(columns) = rows.first().and_then(Value::as_map).map(|m| m.keys().cloned().collect::<Vec<_>>())
    else {
        println!("(no results)");
        return;
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(&columns);

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map(format_table_value).unwrap_or_default())
            .collect();
        table.add_row(cells);
    }

    println!("{}", table);
    println!("{} row(s)", rows.len());
}

fn format_table_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::List(_) | Value::Map(_) => value.to_json().to_string(),
        other => other.to_string(),
    }
}
