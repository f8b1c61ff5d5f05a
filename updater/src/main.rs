//! Cache updater
//!
//! Keeps the shared cache warm: refreshes tokenomics for the popular coins (or
//! `UPDATER_COINS`) every `POLL_INTERVAL` seconds and rebuilds the alias table
//! every `ALIAS_REFRESH_INTERVAL` seconds.

use std::{env, error::Error};

use scorer::Engine;
use tokio::time::{sleep, Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod defaults {
    pub const POLL_INTERVAL: &str = "300";
    pub const POPULAR_LIMIT: &str = "20";
    pub const ALIAS_REFRESH_INTERVAL: &str = "86400";
    pub const RUN_ONCE: &str = "false";
}

/// Coins to refresh each cycle, `None` means the popular list
fn configured_coins() -> Option<Vec<String>> {
    let raw = env::var("UPDATER_COINS").ok()?;
    let coins: Vec<String> = raw
        .split(',')
        .map(|coin| coin.trim().to_string())
        .filter(|coin| !coin.is_empty())
        .collect();

    (!coins.is_empty()).then_some(coins)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "updater=info,scorer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cache updater...");

    let engine = Engine::from_env().await?;

    for (provider, healthy) in engine.market.check_health().await {
        if healthy {
            tracing::info!("{} is reachable", provider);
        } else {
            tracing::warn!("{} is not reachable or rate limited", provider);
        }
    }

    let poll_interval = env::var("POLL_INTERVAL")
        .or::<String>(Ok(defaults::POLL_INTERVAL.into()))?
        .parse::<u64>()?;

    let popular_limit = env::var("POPULAR_LIMIT")
        .or::<String>(Ok(defaults::POPULAR_LIMIT.into()))?
        .parse::<usize>()?;

    let alias_interval = env::var("ALIAS_REFRESH_INTERVAL")
        .or::<String>(Ok(defaults::ALIAS_REFRESH_INTERVAL.into()))?
        .parse::<u64>()?;

    let run_once = env::var("RUN_ONCE")
        .or::<String>(Ok(defaults::RUN_ONCE.into()))?
        .parse::<bool>()?;

    let coins = configured_coins();
    let sleep_duration = Duration::from_secs(poll_interval);
    let alias_duration = Duration::from_secs(alias_interval);
    let mut last_alias_refresh: Option<Instant> = None;

    match &coins {
        Some(coins) => tracing::info!(
            "Updater started. Refreshing {} configured coins every {} seconds...",
            coins.len(),
            poll_interval
        ),
        None => tracing::info!(
            "Updater started. Refreshing {} popular coins every {} seconds...",
            popular_limit,
            poll_interval
        ),
    }

    loop {
        let aliases_due = last_alias_refresh
            .map(|at| at.elapsed() >= alias_duration)
            .unwrap_or(true);

        if aliases_due {
            let update = engine.updater.update_aliases().await;
            if update.success {
                tracing::info!(
                    "Aliases refreshed: {} aliases from {} coins",
                    update.aliases_updated,
                    update.coins_processed
                );
                last_alias_refresh = Some(Instant::now());
            } else {
                tracing::error!(
                    "Alias refresh failed: {}",
                    update.error.unwrap_or_default()
                );
            }
        }

        let batch = match &coins {
            Some(coins) => engine.updater.update_coins(coins.as_slice()).await,
            None => engine.updater.update_popular(popular_limit).await,
        };

        for failed in batch.results.iter().filter(|r| !r.tokenomics_updated) {
            tracing::warn!("{}: {}", failed.coin_id, failed.errors.join("; "));
        }

        let stats = engine.updater.cache_stats().await;
        tracing::info!(
            "Cycle complete: {}/{} refreshed, cache {} holds {} keys",
            batch.succeeded,
            batch.total,
            stats.backend,
            stats
                .total_keys
                .map(|keys| keys.to_string())
                .unwrap_or_else(|| "?".to_string())
        );

        if run_once {
            break;
        }

        tracing::debug!("Sleeping for {} seconds...", sleep_duration.as_secs());
        sleep(sleep_duration).await;
    }

    Ok(())
}
