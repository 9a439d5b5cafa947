use anyhow::Context;
use clap::{Parser, Subcommand};
use site_control::{
    Config, ControlRequest, Pipeline, ResultAssembler, SnapshotExtractor, VariableStore,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "site-control",
    version,
    about = "Script a browser session and extract structured data"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "SITE_CONTROL_CONFIG")]
    config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Chrome or headless-shell binary
    #[arg(long, global = true)]
    chrome_path: Option<PathBuf>,

    /// Verbose logging for this tool and the browser
    #[arg(long, global = true)]
    debug: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a request against a freshly launched browser
    Run { request: PathBuf },
    /// Print the extraction script compiled for every selector
    Compile { request: PathBuf },
    /// Apply a request's selectors to a saved HTML document
    Snapshot {
        request: PathBuf,
        #[arg(long)]
        html: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();

    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(path) = &cli.chrome_path {
        config.browser.executable_path = Some(path.clone());
    }
    if cli.debug {
        config.browser.debug = true;
    }
    Ok(config)
}

fn load_request(path: &Path) -> anyhow::Result<ControlRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading request {}", path.display()))?;
    let request = ControlRequest::from_json(&raw)
        .with_context(|| format!("parsing request {}", path.display()))?;
    Ok(request)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let default_level = if config.browser.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Run { request } => {
            let request = load_request(request)?;
            let pipeline = Pipeline::new(config);
            let output = pipeline.run_chrome(&request).await?;
            print_json(&output, cli.pretty)?;
        }
        Command::Compile { request } => {
            let request = load_request(request)?;
            request.validate()?;
            let options = request.extraction_options(&config.extraction);
            let assembler = ResultAssembler::new(options);
            for (key, script) in assembler.scripts(&request.selectors, &VariableStore::new()) {
                println!("// {}\n{}\n", key, script);
            }
        }
        Command::Snapshot { request, html } => {
            let request = load_request(request)?;
            if !request.actions.is_empty() {
                warn!(
                    actions = request.actions.len(),
                    "snapshot mode ignores actions"
                );
            }
            let document = std::fs::read_to_string(html)
                .with_context(|| format!("reading html {}", html.display()))?;
            let options = request.extraction_options(&config.extraction);
            let data = SnapshotExtractor::new(options).extract_all(
                &document,
                &request.selectors,
                &VariableStore::new(),
            )?;
            info!(selectors = data.len(), "snapshot extraction complete");
            print_json(&serde_json::json!({ "runtimeVariables": [], "data": data }), cli.pretty)?;
        }
    }

    Ok(())
}
