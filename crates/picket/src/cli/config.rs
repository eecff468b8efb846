//! The `picket config` command for configuration management.

use std::path::Path;

use clap::{Args, Subcommand};
use picket_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command. `override_path` is the global `--config`
/// flag; when set it replaces the per-user default location.
pub async fn execute(args: ConfigArgs, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            let config = if path.exists() {
                Config::load_from(&path)?
            } else {
                Config::default()
            };
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            // Write a template with every section present; the operator
            // fills in the [endpoints] URLs for their deployment.
            let config = Config::default();
            let toml = config.to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
            println!("Fill in the [endpoints] section before running `picket scan`.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_template_with_endpoint_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        execute(args, Some(&path)).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[endpoints]"));
        assert!(text.contains("[compression]"));

        // The template parses back into a valid config.
        let parsed = Config::load_from(&path).unwrap();
        assert!(parsed.endpoints.first_unset().is_some());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# existing\n").unwrap();

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        let err = execute(args, Some(&path)).await.unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# existing\n");
    }

    #[tokio::test]
    async fn test_init_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# existing\n").unwrap();

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: true },
        };
        execute(args, Some(&path)).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[scan]"));
    }
}
