use clap::{Args, Parser, Subcommand};
use nl_core::{Error, Result, UserStore};
use nl_inference::{
    create_chat_model, create_model, Capability, Config, FallbackPolicy, ModelIds, Orchestrator,
    PipelineOptions, PipelineSettings,
};
use nl_scrappers::{news_api, HtmlFetcher, NewsApiClient};
use nl_web::{create_app, AppState, DEFAULT_ALLOWED_ORIGINS};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const STORE_CONNECT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        let overflow = || "Duration is too large".to_string();

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number.parse::<u64>().map_err(|_| overflow())?;
                let seconds = match c {
                    's' => Some(num),
                    'm' => num.checked_mul(60),
                    'h' => num.checked_mul(3600),
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = seconds
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(overflow)?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number is seconds.
        if !current_number.is_empty() {
            let num = current_number.parse::<u64>().map_err(|_| overflow())?;
            total_seconds = total_seconds.checked_add(num).ok_or_else(overflow)?;
            has_unit = true;
        }

        if !has_unit || total_seconds == 0 {
            return Err("Duration must be a positive number of seconds".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

/// Hugging Face model overrides; unset flags keep the stock models.
#[derive(Args, Debug, Default)]
struct ModelArgs {
    #[arg(long, env = "SUMMARIZER_MODEL")]
    summarizer_model: Option<String>,
    #[arg(long, env = "SENTIMENT_MODEL")]
    sentiment_model: Option<String>,
    #[arg(long, env = "FACT_OPINION_MODEL")]
    fact_opinion_model: Option<String>,
    #[arg(long, env = "BIAS_MODEL")]
    bias_model: Option<String>,
    #[arg(long, env = "QA_MODEL")]
    qa_model: Option<String>,
    #[arg(long, env = "DEEPFAKE_MODEL")]
    deepfake_model: Option<String>,
    #[arg(long, env = "MANIPULATION_MODEL")]
    manipulation_model: Option<String>,
}

impl ModelArgs {
    fn into_model_ids(self) -> ModelIds {
        let defaults = ModelIds::default();
        ModelIds {
            summarizer: self.summarizer_model.unwrap_or(defaults.summarizer),
            sentiment: self.sentiment_model.unwrap_or(defaults.sentiment),
            fact_opinion: self.fact_opinion_model.unwrap_or(defaults.fact_opinion),
            bias: self.bias_model.unwrap_or(defaults.bias),
            question_answering: self.qa_model.unwrap_or(defaults.question_answering),
            deepfake: self.deepfake_model.unwrap_or(defaults.deepfake),
            manipulation: self.manipulation_model.unwrap_or(defaults.manipulation),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "newslyzer", author, version, about = "News article analysis service")]
struct Cli {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_api_token: Option<String>,
    /// memory:// or sqlite:<path>. Without it account endpoints answer 503.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    #[arg(long, default_value = "huggingface", help = "Inference backend. Available: huggingface (default), dummy")]
    model: String,
    #[arg(long, default_value = "openai", help = "LLM backend. Available: openai (default), dummy")]
    llm: String,
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4")]
    llm_model: String,
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    llm_base_url: String,
    #[arg(long, env = "HF_BASE_URL", default_value = "https://api-inference.huggingface.co/models")]
    hf_base_url: String,
    #[arg(long, env = "NEWS_API_BASE_URL", default_value = news_api::DEFAULT_BASE_URL)]
    news_api_base_url: String,
    #[command(flatten)]
    models: ModelArgs,
    /// Phrases that make a question-answering reply escalate to the LLM.
    #[arg(long = "fallback-marker", value_delimiter = ',', default_values = FallbackPolicy::DEFAULT_MARKERS)]
    fallback_markers: Vec<String>,
    #[arg(long, env = "NEWS_REGION", default_value = "us")]
    region: String,
    /// Timeout for every outbound HTTP call (e.g. 60s, 2m).
    #[arg(long, default_value = "60s")]
    timeout: HumanDuration,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API.
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
        #[arg(long = "allowed-origin", value_delimiter = ',', default_values = DEFAULT_ALLOWED_ORIGINS)]
        allowed_origins: Vec<String>,
    },
    /// Run one analysis and print the JSON result.
    Analyze {
        #[arg(value_enum)]
        capability: Capability,
        url: String,
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        region: Option<String>,
    },
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("{} is required", name)))
}

fn build_orchestrator(cli: &mut Cli) -> Result<Orchestrator> {
    let timeout = cli.timeout.0;
    let config = Config {
        hf_api_token: cli.hf_api_token.clone(),
        hf_base_url: cli.hf_base_url.clone(),
        models: std::mem::take(&mut cli.models).into_model_ids(),
        llm_api_key: cli.openai_api_key.clone(),
        llm_base_url: cli.llm_base_url.clone(),
        llm_model: cli.llm_model.clone(),
        timeout,
    };
    info!("⚙️ {:?}", config);

    let model = create_model(&cli.model, &config)?;
    info!("🧠 Inference model initialized successfully (using {})", model.name());
    let llm = create_chat_model(&cli.llm, &config)?;
    info!("💬 LLM initialized successfully (using {})", llm.name());

    let news_key = required(cli.news_api_key.clone(), "NEWS_API_KEY")?;
    let news = NewsApiClient::with_base_url(news_key, &cli.news_api_base_url, timeout)?;
    let fetcher = HtmlFetcher::new(timeout)?;

    let settings = PipelineSettings {
        fallback: FallbackPolicy::new(cli.fallback_markers.iter().map(String::as_str)),
        default_region: cli.region.clone(),
        ..PipelineSettings::default()
    };

    Ok(Orchestrator::new(
        Arc::new(fetcher),
        model,
        llm,
        Arc::new(news),
        settings,
    ))
}

/// Connects to the user store, retrying transient failures. Gives up with
/// `None` so the service still starts.
async fn connect_store(database_url: Option<&str>) -> Option<Arc<dyn UserStore>> {
    let Some(url) = database_url.filter(|u| !u.trim().is_empty()) else {
        warn!("⚠️ DATABASE_URL not set, account endpoints are unavailable");
        return None;
    };

    let mut attempt = 1;
    loop {
        match nl_storage::create_store(url).await {
            Ok(store) => {
                info!("💾 Storage initialized successfully (using {})", store.name());
                return Some(store);
            }
            Err(e @ Error::InvalidInput(_)) => {
                warn!("⚠️ {}, account endpoints are unavailable", e);
                return None;
            }
            Err(e) if attempt < STORE_CONNECT_ATTEMPTS => {
                info!(
                    "Storage initialization failed ({}), retrying {}/{}...",
                    e, attempt, STORE_CONNECT_ATTEMPTS
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => {
                warn!("⚠️ {}, account endpoints are unavailable", e);
                return None;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    nl_scrappers::init_logging(&cli.log_level);

    // Required credentials are checked before anything else starts.
    if cli.llm == "openai" {
        required(cli.openai_api_key.clone(), "OPENAI_API_KEY")?;
    }
    required(cli.news_api_key.clone(), "NEWS_API_KEY")?;

    let orchestrator = Arc::new(build_orchestrator(&mut cli)?);

    match cli.command {
        Commands::Serve {
            addr,
            allowed_origins,
        } => {
            let store = connect_store(cli.database_url.as_deref()).await;
            let app = create_app(AppState::new(orchestrator, store), &allowed_origins);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("🚀 Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Analyze {
            capability,
            url,
            question,
            region,
        } => {
            let options = PipelineOptions { question, region };
            let result = orchestrator.run(capability, &url, &options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
