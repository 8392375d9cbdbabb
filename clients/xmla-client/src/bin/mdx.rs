use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use mdxql::{
    parse_filters, ChartConfig, DimensionOptions, DimensionQueryType, Mdx, OrderBy,
    QueryOptions, QuerySerializer, TableQuery,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xmla_client::{XmlaClient, XmlaClientBuilder};

#[derive(Parser, Debug)]
#[command(name = "mdx")]
#[command(about = "Compile and run MDX queries against an XMLA endpoint", long_about = None)]
struct Cli {
    /// XMLA endpoint URL
    #[arg(long, env = "MDX_URL")]
    url: Option<String>,

    /// Catalog (database) name
    #[arg(long, env = "MDX_CATALOG")]
    catalog: Option<String>,

    /// Cube to query
    #[arg(long, env = "MDX_CUBE")]
    cube: String,

    #[arg(long, env = "MDX_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "MDX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// HTTP request timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the statement of a dimension query
    CompileDimension(DimensionArgs),
    /// Print the statement of a table query
    CompileTable(TableArgs),
    /// Run a dimension query
    Dimension(DimensionArgs),
    /// Run a table query
    Table(TableArgs),
    /// Run a chart query
    Chart(ChartArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Filter shorthand, e.g. "[Date].[Year] >= 2019" or "[Geo].[Country]&[US]"
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Order-by shorthand, e.g. "[Measures].[Sales] DESC"
    #[arg(long = "order-by")]
    order_by: Vec<String>,

    #[arg(long)]
    skip: Option<usize>,

    #[arg(long)]
    top: Option<usize>,

    /// Also return the row count before paging
    #[arg(long)]
    total_count: bool,
}

impl QueryArgs {
    fn to_options(&self) -> anyhow::Result<QueryOptions> {
        let order_by = self
            .order_by
            .iter()
            .map(|o| o.parse::<OrderBy>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryOptions {
            filters: parse_filters(self.filters.iter().map(String::as_str))?,
            order_by,
            skip: self.skip,
            top: self.top,
            include_total_count: self.total_count,
        })
    }
}

#[derive(Args, Debug)]
struct DimensionArgs {
    /// Attributes to list, e.g. "[Geo].[Country]"
    #[arg(required = true)]
    attributes: Vec<String>,

    #[arg(long = "measure")]
    measures: Vec<String>,

    /// all, empty or nonEmpty
    #[arg(long = "type")]
    query_type: Option<String>,

    #[command(flatten)]
    query: QueryArgs,
}

impl DimensionArgs {
    fn to_options(&self) -> anyhow::Result<DimensionOptions> {
        let query_type = self
            .query_type
            .as_deref()
            .map(str::parse::<DimensionQueryType>)
            .transpose()?;
        Ok(DimensionOptions {
            measures: self.measures.clone(),
            query_type,
            options: self.query.to_options()?,
        })
    }
}

#[derive(Args, Debug)]
struct TableArgs {
    #[arg(long = "measure")]
    measures: Vec<String>,

    #[arg(long = "row")]
    rows: Vec<String>,

    /// Column attributes (compile-table only)
    #[arg(long = "column")]
    columns: Vec<String>,

    #[command(flatten)]
    query: QueryArgs,
}

#[derive(Args, Debug)]
struct ChartArgs {
    #[arg(long = "measure", required = true)]
    measures: Vec<String>,

    #[arg(long)]
    x_axis: String,

    #[arg(long)]
    group_by: Option<String>,

    #[command(flatten)]
    query: QueryArgs,
}

fn connect(cli: &Cli) -> anyhow::Result<Mdx<XmlaClient>> {
    let url = cli.url.as_deref().context("--url or MDX_URL is required")?;
    let catalog = cli
        .catalog
        .as_deref()
        .context("--catalog or MDX_CATALOG is required")?;

    let mut builder = XmlaClientBuilder::new(url)
        .catalog(catalog)
        .timeout_ms(cli.timeout_ms);
    if let Some(username) = &cli.username {
        builder = builder.credentials(username, cli.password.as_deref().unwrap_or_default());
    }
    Ok(Mdx::new(cli.cube.clone(), builder.build()?))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mdxql=info,xmla_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Command::CompileDimension(args) => {
            let query = args.to_options()?.into_query(args.attributes.clone());
            let serializer = QuerySerializer::new(cli.cube.clone());
            println!("{}", serializer.serialize_dimension_query(&query)?);
        }
        Command::CompileTable(args) => {
            let query = TableQuery {
                columns: args.columns.clone(),
                measures: args.measures.clone(),
                rows: args.rows.clone(),
                options: args.query.to_options()?,
            };
            let serializer = QuerySerializer::new(cli.cube.clone());
            println!("{}", serializer.serialize_table_query(&query)?);
        }
        Command::Dimension(args) => {
            let mdx = connect(&cli)?;
            let result = mdx
                .get_dimension_data(args.attributes.clone(), args.to_options()?)
                .await?;
            tracing::info!("Fetched {} dimension rows", result.rows.len());
            print_json(&result)?;
        }
        Command::Table(args) => {
            if !args.columns.is_empty() {
                bail!("--column is only supported by compile-table");
            }
            let mdx = connect(&cli)?;
            let result = mdx
                .get_table_row_data(args.measures.clone(), args.rows.clone(), args.query.to_options()?)
                .await?;
            tracing::info!("Fetched {} table rows", result.rows.len());
            print_json(&result)?;
        }
        Command::Chart(args) => {
            let mut config = ChartConfig::new(args.measures.clone(), args.x_axis.clone());
            if let Some(group_by) = &args.group_by {
                config = config.group_by(group_by.clone());
            }
            let mdx = connect(&cli)?;
            let chart = mdx.get_chart_data(&config, args.query.to_options()?).await?;
            print_json(&chart)?;
        }
    }

    Ok(())
}
