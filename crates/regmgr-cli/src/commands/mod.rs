//! Engine subcommands and the wiring they share.

pub mod create_registry;
pub mod load_data;
pub mod load_dd;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use regmgr_core::{AuthConfig, RegistryNames, RegmgrConfig};
use regmgr_es::{EngineOptions, HttpSearchEngine, LoaderOptions, RegistryManager, SearchEngine};

use crate::cli::{Cli, Command, EngineArgs};
use crate::config_handlers::handle_config_command;

/// Run the parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::CreateRegistry(args) => {
            let config = load_config(config_path, &args.engine)?;
            create_registry::run(&config, &args).await
        }
        Command::LoadDd(args) => {
            let config = load_config(config_path, &args.engine)?;
            load_dd::run(&config, &args).await
        }
        Command::LoadData(args) => {
            let config = load_config(config_path, &args.engine)?;
            load_data::run(&config, &args).await
        }
        Command::Config { action } => Ok(handle_config_command(config_path, action)?),
    }
}

/// Load the configuration and apply command-line overrides.
pub fn load_config(config_path: Option<&str>, args: &EngineArgs) -> Result<RegmgrConfig> {
    let mut config = RegmgrConfig::load(config_path)?;
    apply_engine_args(&mut config, args);
    Ok(config)
}

/// Command-line values win over the configuration file.
pub fn apply_engine_args(config: &mut RegmgrConfig, args: &EngineArgs) {
    if let Some(url) = &args.url {
        config.engine.url.clone_from(url);
    }
    if let Some(index) = &args.index {
        config.registry.index.clone_from(index);
    }
    if let Some(auth) = &args.auth {
        config.engine.auth_file = Some(auth.clone());
    }
}

/// Primary and Field Registry index names.
pub fn registry_names(config: &RegmgrConfig) -> RegistryNames {
    RegistryNames::new(config.registry.index.as_str())
        .with_suffix(config.registry.dictionary_suffix.as_str())
}

/// Build the engine client. No request is made.
pub fn connect(config: &RegmgrConfig) -> Result<Arc<dyn SearchEngine>> {
    let auth = match &config.engine.auth_file {
        Some(path) => AuthConfig::from_file(Path::new(path))?,
        None => AuthConfig::default(),
    };
    let engine = HttpSearchEngine::new(EngineOptions::from_config(config, auth))?;
    tracing::debug!(url = engine.base_url(), "Search engine client ready");
    Ok(Arc::new(engine))
}

/// Registry manager over the configured indices.
pub fn manager(config: &RegmgrConfig) -> Result<RegistryManager> {
    Ok(RegistryManager::new(
        connect(config)?,
        registry_names(config),
        LoaderOptions::from(&config.loader),
    )
    .with_help_url(config.registry.docs_url.as_str()))
}
