//! Discovery of recently opened workspaces across VS Code family editors and
//! installed Visual Studio instances.
//!
//! The entry point is [`discovery::DiscoveryService`]; the `wsd` binary wraps
//! it in a small CLI.

pub mod config;
pub mod connectors;
pub mod discovery;
pub mod error;
pub mod fs_probe;
pub mod instances;
pub mod model;
pub mod parse;
pub mod process;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::DiscoveryConfig;
use crate::discovery::DiscoveryService;
use crate::model::{CodeContainer, Workspace};

#[derive(Parser, Debug)]
#[command(name = "wsd", version, about = "List recently opened editor workspaces")]
pub struct Cli {
    /// Config file (defaults to ~/.config/wsd/config.toml)
    #[arg(long, global = true, env = "WSD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log discovery progress to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Code containers from every instance, sorted by name (default)
    Containers {
        /// Include containers from prerelease instances
        #[arg(long)]
        prerelease: bool,

        /// Skip instances with this catalog version (repeatable)
        #[arg(long = "exclude-version", value_name = "VERSION")]
        exclude_versions: Vec<String>,
    },
    /// Every workspace recorded by VS Code family editors, all environments
    Workspaces,
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(cli: &Cli) -> Result<DiscoveryConfig> {
    let config = match &cli.config {
        Some(path) => DiscoveryConfig::load_from(path),
        None => DiscoveryConfig::load(),
    };
    config.context("loading configuration")
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;
    let command = cli.command.clone().unwrap_or(Commands::Containers {
        prerelease: false,
        exclude_versions: Vec::new(),
    });
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Containers {
            prerelease,
            exclude_versions,
        } => {
            config.show_prerelease |= prerelease;
            config.excluded_versions.extend(exclude_versions);

            let mut service = DiscoveryService::from_config(&config);
            let containers = service.discover(&config.excluded_versions, config.show_prerelease);
            write_containers(&mut out, &containers, cli.json)?;
        }
        Commands::Workspaces => {
            let mut service = DiscoveryService::from_config(&config);
            write_workspaces(&mut out, service.scan_workspaces(), cli.json)?;
        }
    }
    Ok(())
}

pub fn write_containers(
    out: &mut impl Write,
    containers: &[CodeContainer],
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, containers)?;
        writeln!(out)?;
        return Ok(());
    }
    for c in containers {
        let favorite = if c.is_favorite { "*" } else { " " };
        let accessed = c
            .last_accessed
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{favorite} {:<32} {:<16} {:<32} {}",
            c.name, accessed, c.instance.display_name, c.full_path
        )?;
    }
    Ok(())
}

pub fn write_workspaces(out: &mut impl Write, workspaces: &[Workspace], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, workspaces)?;
        writeln!(out)?;
        return Ok(());
    }
    for w in workspaces {
        let env = match &w.extra_info {
            Some(machine) if !machine.is_empty() => format!("{}: {machine}", w.environment),
            _ => w.environment.to_string(),
        };
        writeln!(out, "{:<32} {:<24} {}", w.folder_name, env, w.relative_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstanceSummary, WorkspaceEnvironment, WorkspaceKind};

    #[test]
    fn cli_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["wsd"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn cli_collects_excluded_versions() {
        let cli = Cli::try_parse_from([
            "wsd",
            "containers",
            "--prerelease",
            "--exclude-version",
            "2017",
            "--exclude-version",
            "2019",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Some(Commands::Containers {
                prerelease: true,
                exclude_versions: vec!["2017".into(), "2019".into()],
            })
        );
    }

    #[test]
    fn text_listing_shows_machine_labels() {
        let workspaces = vec![Workspace {
            uri: "vscode-remote://ssh-remote+box/srv/app".into(),
            relative_path: "/srv/app".into(),
            folder_name: "app".into(),
            extra_info: Some("box".into()),
            environment: WorkspaceEnvironment::RemoteSSH,
            kind: WorkspaceKind::ProjectFolder,
        }];
        let mut buf = Vec::new();
        write_workspaces(&mut buf, &workspaces, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("SSH: box"));
        assert!(text.contains("/srv/app"));
    }

    #[test]
    fn json_listing_round_trips_containers() {
        let containers = vec![CodeContainer {
            name: "app".into(),
            key: "/src/app".into(),
            full_path: "/src/app".into(),
            is_favorite: true,
            last_accessed: None,
            instance: InstanceSummary {
                display_name: "VS Code Project".into(),
                is_prerelease: false,
                environment_label: "Local".into(),
            },
        }];
        let mut buf = Vec::new();
        write_containers(&mut buf, &containers, true).unwrap();
        let parsed: Vec<CodeContainer> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, containers);
    }
}
