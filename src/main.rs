use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use truelens_lib::services::proxy::{self, ProxyState};
use truelens_lib::services::{
    analyze_image, analyze_text, tokenize, AppConfig, ConfigStore, Gateway, GatewayClient,
    ImageAnalysisRequest, ImageInput, InputStats, TextAnalysisRequest,
};

#[derive(Parser, Debug)]
#[command(name = "truelens")]
#[command(author, version, about = "AI-generated text and image verdicts")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path (defaults to the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Gateway URL, overrides config and TRUELENS_GATEWAY_URL
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Skip the gateway and use the local heuristic
    #[arg(long, global = true)]
    offline: bool,

    /// Seed for reproducible fallback scores
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable score rewrites for known demo images
    #[arg(long, global = true)]
    demo_overrides: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze text from a file or stdin
    Text {
        /// Input file; stdin if absent
        file: Option<PathBuf>,
    },

    /// Analyze an image file, pasted bytes or URL
    Image(ImageArgs),

    /// Run the gateway proxy (reads GROQ_API_KEY)
    Serve {
        /// Listen port, overrides config and PORT
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static files to serve alongside the API
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print the sentences the tokenizer finds
    Tokenize {
        /// Input file; stdin if absent
        file: Option<PathBuf>,
    },

    /// Inspect or edit the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a default config file, backing up any existing one
    Init,
    /// Print the effective config (file plus env and flag overrides)
    Show,
    /// Set one key by dotted path, e.g. `proxy.port 4000`
    Set { key: String, value: String },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ImageArgs {
    /// Image file on disk
    #[arg(long)]
    file: Option<PathBuf>,

    /// Remote image URL (http or https)
    #[arg(long)]
    url: Option<String>,

    /// Read raw image bytes from stdin
    #[arg(long)]
    stdin: bool,
}

#[derive(Serialize)]
struct TokenizeOutput {
    stats: InputStats,
    summary: String,
    sentences: Vec<String>,
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn open_store(cli: &Cli) -> Option<ConfigStore> {
    match &cli.config {
        Some(path) => Some(ConfigStore::at_file(path.clone())),
        None => ConfigStore::default_config_dir().map(ConfigStore::new),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match open_store(cli) {
        Some(store) => store
            .load()
            .with_context(|| format!("failed to load {}", store.config_file().display()))?,
        None => AppConfig::default(),
    };
    config.apply_env();
    if let Some(url) = &cli.gateway_url {
        config.gateway.url = url.clone();
    }
    if cli.demo_overrides {
        config.detection.demo_overrides = true;
    }
    Ok(config)
}

fn run_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let store = open_store(cli).context("no config directory available, pass --config")?;
    match action {
        ConfigAction::Init => {
            store.save(&AppConfig::default())?;
            info!("[CONFIG] wrote defaults to {}", store.config_file().display());
            println!("{}", store.config_file().display());
        }
        ConfigAction::Show => print_json(&load_config(cli)?)?,
        ConfigAction::Set { key, value } => {
            // Edit the file as stored, without env or flag overrides baked in
            let mut config = store.load()?;
            config.set_value(key, value)?;
            store.save(&config)?;
            info!("[CONFIG] set {} in {}", key, store.config_file().display());
            print_json(&config)?;
        }
    }
    Ok(())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn make_gateway(cli: &Cli, config: &AppConfig) -> Result<Option<GatewayClient>> {
    if cli.offline {
        return Ok(None);
    }
    let client = GatewayClient::new(&config.gateway.url, config.gateway.timeout())
        .context("failed to build gateway client")?;
    Ok(Some(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    truelens_lib::init_logging();

    let mut rng = make_rng(cli.seed);

    match &cli.command {
        Commands::Text { file } => {
            let config = load_config(&cli)?;
            let input = read_input(file.as_deref())?;
            let request = TextAnalysisRequest::new(&input, &config.detection)?;
            info!("[TEXT] input: {}", InputStats::of(&request.text).summary());

            let gateway = make_gateway(&cli, &config)?;
            let analysis = analyze_text(
                gateway.as_ref().map(|g| g as &dyn Gateway),
                &request,
                &mut rng,
            )
            .await?;
            print_json(&analysis)?;
        }

        Commands::Image(args) => {
            let config = load_config(&cli)?;
            let input = if let Some(path) = &args.file {
                ImageInput::from_file(path)?
            } else if let Some(url) = &args.url {
                ImageInput::from_url(url)?
            } else {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut bytes)
                    .context("failed to read image bytes from stdin")?;
                ImageInput::pasted(bytes.len() as u64)?
            };
            let request = ImageAnalysisRequest::new(input, config.detection.demo_overrides);

            let gateway = make_gateway(&cli, &config)?;
            let analysis = analyze_image(
                gateway.as_ref().map(|g| g as &dyn Gateway),
                &request,
                &mut rng,
            )
            .await;
            print_json(&analysis)?;
        }

        Commands::Serve { port, static_dir } => {
            let config = load_config(&cli)?;
            let mut proxy_config = config.proxy.clone();
            if let Some(port) = port {
                proxy_config.port = *port;
            }
            if static_dir.is_some() {
                proxy_config.static_dir = static_dir.clone();
            }
            let state = ProxyState::from_env(&proxy_config)?;
            proxy::serve(&proxy_config, state).await?;
        }

        Commands::Config { action } => run_config(&cli, action)?,

        Commands::Tokenize { file } => {
            let input = read_input(file.as_deref())?;
            let stats = InputStats::of(&input);
            print_json(&TokenizeOutput {
                stats,
                summary: stats.summary(),
                sentences: tokenize(&input),
            })?;
        }
    }

    Ok(())
}
