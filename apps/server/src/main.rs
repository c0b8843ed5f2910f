//! Transfer Watch - Headless Server
//!
//! Polls a block explorer for incoming token transfers to a wallet and
//! reports each new one to the console and, when configured, to X.

mod config;
mod enricher;
mod health;
mod poller;
mod state;

use clap::Parser;
use config::{Target, WatchConfig, EXPLORER_TIMEOUT, LOOKUP_TIMEOUT};
use enricher::Enricher;
use health::HealthState;
use poller::{PollSettings, Poller};
use state::create_status;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use transfer_watch_alerts::{Notifier, XClient, XCredentials};
use transfer_watch_core::DetectMode;
use transfer_watch_feeds::{
    CoinGeckoClient, Erc20Token, EtherscanClient, ExplorerConfig, TokenReader, DEFAULT_API_BASE,
    DEFAULT_PRICE_API_BASE,
};

/// Transfer Watch CLI
#[derive(Parser, Debug)]
#[command(name = "transfer-watch")]
#[command(about = "Watch a wallet for incoming token transfers", long_about = None)]
struct Args {
    /// Explorer API key
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Explorer API endpoint
    #[arg(long, env = "ETHERSCAN_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// EIP-155 chain id
    #[arg(long, env = "CHAIN_ID", default_value_t = 56)]
    chain_id: u64,

    /// Wallet to watch
    #[arg(long, env = "WATCH_WALLET", default_value = "")]
    wallet: String,

    /// Token contract address
    #[arg(long, env = "TOKEN_CONTRACT", default_value = "")]
    contract: String,

    /// JSON-RPC endpoint (defaults to the chain's public endpoint)
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Seconds between polls
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 60)]
    poll_interval: u64,

    /// Seconds to wait after a failed request
    #[arg(long, env = "RATE_LIMIT_RETRY", default_value_t = 5)]
    retry_backoff: u64,

    /// Transfers requested per page
    #[arg(long, env = "PAGE_SIZE", default_value_t = 50)]
    page_size: u32,

    /// CoinGecko coin id
    #[arg(long, env = "COINGECKO_ID", default_value = "")]
    price_id: String,

    /// CoinGecko API endpoint
    #[arg(long, env = "COINGECKO_API_BASE", default_value = DEFAULT_PRICE_API_BASE)]
    price_api_base: String,

    /// Symbol used when the contract does not report one
    #[arg(long, env = "TOKEN_SYMBOL", default_value = "TOKEN")]
    token_symbol: String,

    /// Block explorer front-end (defaults to the chain's explorer)
    #[arg(long, env = "EXPLORER_URL")]
    explorer_url: Option<String>,

    /// Report every new incoming transfer, not only the newest
    #[arg(long, env = "CATCH_UP", default_value_t = false)]
    catch_up: bool,

    /// Status server port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl From<Args> for WatchConfig {
    fn from(args: Args) -> Self {
        WatchConfig {
            api_key: args.api_key,
            api_base: args.api_base,
            chain_id: args.chain_id,
            wallet: args.wallet,
            contract: args.contract,
            rpc_url: args.rpc_url,
            poll_interval_secs: args.poll_interval,
            retry_backoff_secs: args.retry_backoff,
            page_size: args.page_size,
            price_id: args.price_id,
            price_api_base: args.price_api_base,
            token_symbol: args.token_symbol,
            explorer_url: args.explorer_url,
            detect_mode: if args.catch_up {
                DetectMode::CatchUp
            } else {
                DetectMode::Newest
            },
            port: args.port,
            log_level: args.log_level,
        }
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Check the RPC endpoint; balance lookups are disabled if it is unreachable.
async fn connect_token(config: &WatchConfig, target: &Target) -> Option<Box<dyn TokenReader>> {
    let token = match Erc20Token::connect(&target.rpc_url, target.contract, LOOKUP_TIMEOUT) {
        Ok(token) => token,
        Err(e) => {
            warn!("Could not create RPC client for {}: {}", target.rpc_url, e);
            return None;
        }
    };

    match token.chain_id().await {
        Ok(id) if id != config.chain_id => {
            warn!(
                "RPC at {} reports chain id {}, expected {}",
                target.rpc_url, id, config.chain_id
            );
        }
        Ok(id) => info!("Connected to RPC at {} (chain id {})", target.rpc_url, id),
        Err(e) => {
            warn!("Could not connect to RPC at {}: {}. Balance lookups disabled.", target.rpc_url, e);
            return None;
        }
    }

    Some(Box::new(token))
}

fn build_notifier() -> Notifier {
    let creds = match XCredentials::from_env() {
        Some(creds) => creds,
        None => {
            info!("X credentials not fully set. Skipping posting to X.");
            return Notifier::console_only();
        }
    };

    match XClient::new(creds, LOOKUP_TIMEOUT) {
        Ok(client) => {
            info!("X posting enabled");
            Notifier::with_poster(Box::new(client))
        }
        Err(e) => {
            warn!("Could not initialize X client: {}. Posting disabled.", e);
            Notifier::console_only()
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = WatchConfig::from(Args::parse());
    init_logging(&config.log_level);

    let target = match config.validate() {
        Ok(target) => target,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    info!("🚀 Transfer Watch starting...");
    match target.chain {
        Some(chain) => info!("  Chain: {} ({})", chain, chain.id()),
        None => info!("  Chain: {}", config.chain_id),
    }
    info!("  Wallet: {}", target.wallet);
    info!("  Contract: {}", target.contract);
    info!("  Explorer: {}", target.explorer_url);
    info!("  Detect mode: {:?}", config.detect_mode);
    info!("  Status port: {}", config.port);

    let explorer = match EtherscanClient::new(ExplorerConfig {
        api_base: config.api_base.clone(),
        api_key: config.api_key.clone(),
        chain_id: config.chain_id,
        contract: target.contract,
        wallet: target.wallet,
        page_size: config.page_size,
        retry_backoff: target.retry_backoff,
        request_timeout: EXPLORER_TIMEOUT,
        fallback_symbol: config.token_symbol.clone(),
    }) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create explorer client: {}", e);
            std::process::exit(1);
        }
    };

    let price = match CoinGeckoClient::new(&config.price_api_base, &config.price_id, LOOKUP_TIMEOUT) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create price client: {}", e);
            std::process::exit(1);
        }
    };

    let token = connect_token(&config, &target).await;
    let enricher = Enricher::connect(token, Box::new(price), target.wallet, &config.token_symbol).await;

    if !enricher.balance_enabled() {
        warn!("Wallet balance will be reported as unavailable");
    }

    let status = create_status();
    let health_state = Arc::new(HealthState {
        symbol: enricher.symbol().to_string(),
        status: status.clone(),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    if let Err(e) = health::start_health_server(health_state, addr).await {
        error!("Failed to start status server on {}: {}", addr, e);
        std::process::exit(1);
    }

    let poller = Poller::new(
        Box::new(explorer),
        enricher,
        build_notifier(),
        PollSettings {
            wallet: target.wallet,
            poll_interval: target.poll_interval,
            retry_backoff: target.retry_backoff,
            mode: config.detect_mode,
            explorer_url: target.explorer_url.clone(),
        },
        status.clone(),
    );
    let poller_handle = tokio::spawn(poller.run());

    // Handle shutdown
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down...");
    status.set_running(false);
    poller_handle.abort();
}
