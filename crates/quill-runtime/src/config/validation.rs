//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CommandsConfig, LogOutput, LoggingConfig, QuillConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &QuillConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_commands_config(&config.commands)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid logging filter target: {module:?}"
            )));
        }
    }

    Ok(())
}

fn validate_commands_config(commands: &CommandsConfig) -> ConfigResult<()> {
    let prefix = &commands.fallback_prefix;
    if prefix.is_empty() {
        return Err(ConfigError::validation(
            "commands.fallback_prefix cannot be empty",
        ));
    }
    if prefix.contains(|c: char| c.is_whitespace() || c == ':') {
        return Err(ConfigError::validation(format!(
            "commands.fallback_prefix cannot contain spaces or ':': {prefix:?}"
        )));
    }
    Ok(())
}
