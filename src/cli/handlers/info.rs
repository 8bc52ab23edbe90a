//! Information display handlers (config)

use crate::cli::output::print_config;
use crate::config::Credentials;
use crate::AppConfig;
use crate::Result;

pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    let credentials = Credentials::load(&config.secrets)?;
    print_config(config, &credentials);
    Ok(())
}
