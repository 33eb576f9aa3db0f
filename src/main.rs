//! sfquery CLI
//!
//! Command-line interface for composing and running SOQL queries:
//! - Compile a query from flags
//! - Execute it against the REST API
//! - Copy it to the clipboard
//! - Manage the cached access token
//! - Serve JSON request/response messages over stdio

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sfquery::api::{QueryExecutor, ReqwestTransport};
use sfquery::auth::{now_millis, AuthFlow, ConsoleLauncher, JsonFileStore, TokenStore};
use sfquery::clipboard::{Clipboard, CommandClipboard};
use sfquery::config::{generate_default_config, Config};
use sfquery::query::{compile, parse_filter, parse_order_by, Direction, QuerySpec, FALLBACK_OBJECT};
use sfquery::service::QueryService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sfquery")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compose, copy and run SOQL queries")]
#[command(long_about = "sfquery builds SOQL from an object, a field list and a filter expression,\nauthorizes against Salesforce with the OAuth implicit grant, and runs the query.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/sfquery/config.toml, then ./sfquery.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the SOQL for the given query
    Compile(QueryArgs),

    /// Execute a query and print the JSON response
    Query {
        #[command(flatten)]
        args: QueryArgs,
        /// Raw SOQL to run instead of compiling the flags
        #[arg(long)]
        soql: Option<String>,
    },

    /// Copy the SOQL for the given query to the clipboard
    Copy(QueryArgs),

    /// Run the authorization flow now
    Auth,

    /// Show the cached token status
    Status,

    /// Forget the cached access token
    Logout,

    /// Answer JSON request lines on stdin with JSON response lines on stdout
    Serve,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Query form flags
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// SObject to query
    #[arg(short, long, default_value = FALLBACK_OBJECT)]
    pub object: String,

    /// Fields to select (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Filter expression, e.g. "Industry = Tech OR Industry = Retail"
    #[arg(short = 'w', long)]
    pub filter: Option<String>,

    /// Sort field, optionally followed by ASC or DESC
    #[arg(long)]
    pub order_by: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<u32>,
}

impl QueryArgs {
    fn spec(&self) -> anyhow::Result<QuerySpec> {
        let mut spec = QuerySpec::new(&self.object).fields(&self.fields);

        if let Some(filter) = &self.filter {
            spec.conditions = parse_filter(filter).context("Invalid --filter")?;
        }

        if let Some(order_by) = &self.order_by {
            let mut order_by = parse_order_by(order_by).context("Invalid --order-by")?;
            if self.desc {
                order_by.direction = Direction::Desc;
            }
            spec.order_by = Some(order_by);
        }

        spec.limit = self.limit;
        Ok(spec)
    }
}

/// Long-lived pieces shared by the commands
struct App {
    store: Arc<TokenStore>,
    auth: Arc<AuthFlow>,
    executor: Arc<QueryExecutor>,
}

impl App {
    fn new(config: &Config) -> anyhow::Result<Self> {
        let data_dir = config.storage.data_path();
        tracing::debug!("Data directory: {:?}", data_dir);

        let backend = JsonFileStore::in_dir(&data_dir).context("Failed to open state file")?;
        let store = Arc::new(TokenStore::with_default_instance(
            Arc::new(backend),
            &config.salesforce.default_instance_url,
        )?);

        let launcher = Arc::new(ConsoleLauncher::new(config.salesforce.open_browser));
        let auth = Arc::new(AuthFlow::new(
            config.salesforce.oauth(),
            launcher,
            Arc::clone(&store),
        ));

        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
            config.http.request_timeout_secs,
        ))?);
        let executor = Arc::new(QueryExecutor::new(
            transport,
            Arc::clone(&store),
            Arc::clone(&auth),
            config.executor(),
        ));

        Ok(Self {
            store,
            auth,
            executor,
        })
    }
}

fn clipboard(config: &Config) -> Option<CommandClipboard> {
    match &config.clipboard.command {
        Some(command) => CommandClipboard::new(command),
        None => CommandClipboard::detect(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    sfquery::telemetry::init(&config.logging);

    match cli.command {
        Commands::Compile(args) => {
            println!("{}", compile(&args.spec()?));
        }

        Commands::Query { args, soql } => {
            let query = match soql {
                Some(soql) => soql,
                None => compile(&args.spec()?),
            };

            let app = App::new(&config)?;
            let result = app.executor.execute(&query).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Copy(args) => {
            let query = compile(&args.spec()?);
            println!("{}", query);

            // Copying is best effort
            match clipboard(&config) {
                Some(clipboard) => match clipboard.write_text(&query).await {
                    Ok(()) => tracing::info!("Copied query via {}", clipboard.command_line()),
                    Err(e) => tracing::warn!("Failed to copy query: {}", e),
                },
                None => tracing::warn!("No clipboard command available"),
            }
        }

        Commands::Auth => {
            let app = App::new(&config)?;
            let record = app.auth.authorize().await?;
            eprintln!("Authorized against {}", record.instance_url);
        }

        Commands::Status => {
            let app = App::new(&config)?;
            let status = app.store.status(now_millis()).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Logout => {
            let app = App::new(&config)?;
            app.store.clear().await?;
            eprintln!("Access token removed");
        }

        Commands::Serve => {
            let app = App::new(&config)?;
            let service = QueryService::new(app.auth, app.executor, app.store);

            tracing::info!("Serving requests on stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            service.serve(stdin, tokio::io::stdout()).await?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    eprintln!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}
