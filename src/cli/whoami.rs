//! Whoami command implementation

use crate::cli::output::{format_identity_json, format_identity_table};
use crate::cli::{load_config, WhoamiArgs};
use crate::config::FloorwatchConfig;
use crate::identity::{FetchOptions, IdentityCache, StaticToken, TokenSource, TokenStore};
use crate::logging::init_tracing;
use std::sync::Arc;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &WhoamiArgs,
) -> Result<FloorwatchConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    if let Some(timeout_ms) = args.timeout_ms {
        config.identity.timeout_ms = Some(timeout_ms);
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// `--token` wins over the configured token storage.
fn token_source(args: &WhoamiArgs, config: &FloorwatchConfig) -> Arc<dyn TokenSource> {
    match &args.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(TokenStore::from_config(&config.identity)),
    }
}

/// Main whoami command handler
pub async fn run_whoami(args: WhoamiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging)?;

    let cache = IdentityCache::new(
        &config.identity,
        config.identity_url(),
        token_source(&args, &config),
    )?;

    let options = FetchOptions {
        force: args.force,
        timeout: None,
    };
    let outcome = cache.fetch(options).await?;

    if args.json {
        println!("{}", format_identity_json(&outcome));
    } else {
        println!("{}", format_identity_table(&outcome));
    }

    Ok(())
}
