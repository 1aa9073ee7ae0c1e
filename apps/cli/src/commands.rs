//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use reqgraph_crawler::HttpFetcher;
use reqgraph_notion::NotionClient;
use reqgraph_shared::{
    AppConfig, ProgressReporter, TableConfig, init_config, load_config, parse_filter_values,
};
use reqgraph_storage::{JsonStore, to_document_string};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// reqgraph — turn requirement sources into artifact and trace-link JSON.
#[derive(Parser)]
#[command(
    name = "reqgraph",
    version,
    about = "Crawl requirement sites and Notion tables into artifact/trace JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for persisted documents (defaults to the config's data_dir).
    #[arg(long, env = "REQGRAPH_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl the documentation site into a raw pages document.
    Crawl {
        /// Navigation index URL (defaults to the config's site.index_url).
        #[arg(long)]
        index_url: Option<String>,

        /// Prefix joined in front of matching navigation links.
        #[arg(long)]
        url_prefix: Option<String>,

        /// Name of the output document.
        #[arg(short, long)]
        output_name: Option<String>,
    },

    /// Export a Notion database into artifact and trace documents.
    ///
    /// Unset options fall back to NOTION_TOKEN, NOTION_TABLE_ID,
    /// NOTION_FIELD_ID_TYPE, NOTION_FIELD_ID_PARENTS, NOTION_FIELD_ID_FILTER and
    /// NOTION_FIELD_VALUE_FILTER.
    Notion {
        /// Integration token.
        #[arg(long)]
        token: Option<String>,

        /// Database id.
        #[arg(long)]
        table_id: Option<String>,

        /// Property key of the type select.
        #[arg(long)]
        type_field: Option<String>,

        /// Property key of the parents relation (empty disables traces).
        #[arg(long)]
        parents_field: Option<String>,

        /// Property key of the filter select.
        #[arg(long)]
        filter_field: Option<String>,

        /// Comma-separated accepted filter values (empty accepts all).
        #[arg(long)]
        filter_values: Option<String>,
    },

    /// Print a persisted document.
    Show {
        /// Document name (without `.json`).
        name: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reqgraph=info",
        1 => "reqgraph=debug",
        _ => "reqgraph=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let store = JsonStore::new(
        cli.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.defaults.data_dir)),
    );

    match cli.command {
        Command::Crawl {
            index_url,
            url_prefix,
            output_name,
        } => cmd_crawl(&config, &store, index_url, url_prefix, output_name).await,
        Command::Notion {
            token,
            table_id,
            type_field,
            parents_field,
            filter_field,
            filter_values,
        } => {
            let mut table = TableConfig::from_env(&config);
            override_with(&mut table.token, token);
            override_with(&mut table.table_id, table_id);
            override_with(&mut table.type_field, type_field);
            override_with(&mut table.parents_field, parents_field);
            override_with(&mut table.filter_field, filter_field);
            if let Some(values) = filter_values {
                table.filter_values = parse_filter_values(&values);
            }
            cmd_notion(&config, &store, &table).await
        }
        Command::Show { name } => cmd_show(&store, &name),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn override_with(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_crawl(
    config: &AppConfig,
    store: &JsonStore,
    index_url: Option<String>,
    url_prefix: Option<String>,
    output_name: Option<String>,
) -> Result<()> {
    let mut site = config.site.clone();
    override_with(&mut site.index_url, index_url);
    override_with(&mut site.url_prefix, url_prefix);
    override_with(&mut site.output_name, output_name);

    info!(index = %site.index_url, data_dir = %store.root().display(), "crawling site");

    let fetcher = HttpFetcher::new(site.timeout_secs)?;
    let reporter = CliProgress::new();
    let report = reqgraph_core::crawl_site(&fetcher, &site, store, &reporter).await?;

    println!();
    println!("  Site crawl complete!");
    println!("  Pages:    {}", report.page_count);
    println!("  Failures: {}", report.failures.len());
    for (url, error) in &report.failures {
        println!("    - {url}: {error}");
    }
    println!("  Output:   {}", report.output_path.display());
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_notion(config: &AppConfig, store: &JsonStore, table: &TableConfig) -> Result<()> {
    table.validate()?;

    info!(
        table_id = %table.table_id,
        filter_values = ?table.filter_values,
        "exporting Notion requirement data"
    );

    let client = NotionClient::new(&table.token, config.notion.timeout_secs)?
        .with_base_url(&config.notion.api_base);
    let reporter = CliProgress::new();
    let report = reqgraph_core::export_table(&client, table, store, &reporter).await?;

    println!();
    println!("  Notion export complete!");
    println!("  Artifacts: {}", report.artifact_count);
    println!("  Traces:    {}", report.trace_count);
    println!("  Output:    {}", report.artifacts_path.display());
    println!("             {}", report.traces_path.display());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_show(store: &JsonStore, name: &str) -> Result<()> {
    if !store.exists(name) {
        return Err(eyre!(
            "no document named '{name}' in {}",
            store.root().display()
        ));
    }

    let value = store.load_value(name)?;
    println!("{}", to_document_string(&value)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, label: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {label}"));
    }

    fn failed(&self, label: &str, error: &str) {
        self.spinner.println(format!("  ! {label}: {error}"));
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

/// Clears the spinner when a pipeline bails out before `finish`.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
