//! Environment configuration
//!
//! Every setting has a default except the database URL and the mint target.
//! Release builds additionally require the session secret and the mint
//! authority; debug builds generate throwaway ones.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use collect::{CollectConfig, MintConfig};
use platform::solana::{Commitment, Keypair, Pubkey};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub collect: CollectConfig,
    pub chain: ChainConfig,
}

pub struct ChainConfig {
    pub rpc_url: String,
    pub rpc_timeout: Duration,
    pub commitment: Commitment,
    pub authority: Keypair,
    pub mint: MintConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;
        let bind_addr = parsed("BIND_ADDR", DEFAULT_BIND_ADDR.parse()?)?;
        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            auth: auth_config()?,
            collect: collect_config()?,
            chain: chain_config()?,
        })
    }
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    match env::var("AUTH_SESSION_SECRET") {
        Ok(secret_b64) => {
            let secret_bytes = general_purpose::STANDARD
                .decode(secret_b64.trim())
                .context("AUTH_SESSION_SECRET is not valid base64")?;
            config.session_secret = secret_bytes.as_slice().try_into().map_err(|_| {
                anyhow::anyhow!(
                    "AUTH_SESSION_SECRET must decode to 32 bytes, got {}",
                    secret_bytes.len()
                )
            })?;
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("AUTH_SESSION_SECRET not set, sessions will not survive a restart");
        }
        Err(_) => bail!("AUTH_SESSION_SECRET must be set in production"),
    }

    if let Ok(domain) = env::var("AUTH_DOMAIN") {
        config.domain = domain;
    }
    config.challenge_ttl = secs("AUTH_CHALLENGE_TTL_SECS", config.challenge_ttl)?;
    config.session_ttl = secs("AUTH_SESSION_TTL_SECS", config.session_ttl)?;
    config.challenge_per_ip_per_minute = parsed(
        "AUTH_CHALLENGE_PER_IP_PER_MINUTE",
        config.challenge_per_ip_per_minute,
    )?;

    Ok(config)
}

fn collect_config() -> anyhow::Result<CollectConfig> {
    let defaults = CollectConfig::default();
    Ok(CollectConfig {
        user_daily_cap: parsed("COLLECT_USER_DAILY_CAP", defaults.user_daily_cap)?,
        ip_daily_cap: parsed("COLLECT_IP_DAILY_CAP", defaults.ip_daily_cap)?,
        burst_cap: parsed("COLLECT_BURST_CAP", defaults.burst_cap)?,
        burst_window: secs("COLLECT_BURST_WINDOW_SECS", defaults.burst_window)?,
        broadcast_attempts: parsed("COLLECT_BROADCAST_ATTEMPTS", defaults.broadcast_attempts)?,
        sweep_interval: secs("COLLECT_SWEEP_INTERVAL_SECS", defaults.sweep_interval)?,
        pending_grace: secs("COLLECT_PENDING_GRACE_SECS", defaults.pending_grace)?,
        status_polls_per_ip_per_minute: parsed(
            "COLLECT_STATUS_POLLS_PER_IP_PER_MINUTE",
            defaults.status_polls_per_ip_per_minute,
        )?,
        ..defaults
    })
}

fn chain_config() -> anyhow::Result<ChainConfig> {
    let authority = match env::var("MINT_AUTHORITY_SECRET") {
        Ok(secret) => {
            Keypair::from_secret_str(&secret).context("MINT_AUTHORITY_SECRET is not a keypair")?
        }
        Err(_) if cfg!(debug_assertions) => {
            let keypair = Keypair::generate();
            tracing::warn!(
                authority = %keypair.pubkey(),
                "MINT_AUTHORITY_SECRET not set, using an unfunded throwaway authority"
            );
            keypair
        }
        Err(_) => bail!("MINT_AUTHORITY_SECRET must be set in production"),
    };

    let merkle_tree: Pubkey = env::var("MERKLE_TREE_ADDRESS")
        .context("MERKLE_TREE_ADDRESS must be set in environment")?
        .trim()
        .parse()
        .context("MERKLE_TREE_ADDRESS is not a valid address")?;

    let mut mint = MintConfig::new(merkle_tree);
    if let Ok(collection) = env::var("COLLECTION_MINT") {
        mint.collection_mint = Some(
            collection
                .trim()
                .parse()
                .context("COLLECTION_MINT is not a valid address")?,
        );
    }
    if let Ok(symbol) = env::var("COLLECT_SYMBOL") {
        mint.symbol = symbol;
    }
    if let Ok(base_url) = env::var("COLLECT_METADATA_BASE_URL") {
        mint.metadata_base_url = base_url;
    }

    let commitment = env::var("SOLANA_COMMITMENT")
        .ok()
        .map(|raw| raw.parse::<Commitment>())
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("SOLANA_COMMITMENT")?
        .unwrap_or_default();

    Ok(ChainConfig {
        rpc_url: env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
        rpc_timeout: secs("SOLANA_RPC_TIMEOUT_SECS", Duration::from_secs(10))?,
        commitment,
        authority,
        mint,
    })
}

/// Parse `key` when set, otherwise `default`
fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

fn secs(key: &str, default: Duration) -> anyhow::Result<Duration> {
    parsed(key, default.as_secs()).map(Duration::from_secs)
}
