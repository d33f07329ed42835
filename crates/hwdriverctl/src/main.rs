//! hwdriverctl - resolve hardware drivers for a system installation
//!
//! Enumerates devices, picks drivers from the built-in catalog and prints the
//! resulting package list, or runs post-install actions against a target root.

mod devices;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hwdriver::catalog::builtin_registry;
use hwdriver::{HwDriverConfig, InstallPlanBuilder, PostInstallReport, Resolver};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "hwdriverctl")]
#[command(about = "Resolve hardware drivers and install plans", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: /etc/hwdriver/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target architecture (default: config, then host)
    #[arg(long, global = true)]
    arch: Option<String>,

    /// Read `lspci -n` output from a file instead of running lspci
    #[arg(long, global = true)]
    lspci: Option<PathBuf>,

    /// Read `lsusb` output from a file instead of running lsusb
    #[arg(long, global = true)]
    lsusb: Option<PathBuf>,

    /// Never select proprietary drivers
    #[arg(long, global = true)]
    free_only: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in driver catalog
    Catalog,

    /// Show the driver chosen for each device and the install plan
    Resolve,

    /// Print the package list, one per line
    Packages,

    /// Run post-install actions inside a target root
    PostInstall {
        /// Mounted target system (default: config target_root)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// An explicit `--config` must load. A broken system config is reported
/// once logging is up and the defaults are used instead.
fn load_config(path: Option<&Path>) -> Result<(HwDriverConfig, Option<String>)> {
    match path {
        Some(path) => {
            let config = HwDriverConfig::load_from(path)
                .with_context(|| format!("loading {}", path.display()))?;
            Ok((config, None))
        }
        None => match HwDriverConfig::load() {
            Ok(config) => Ok((config, None)),
            Err(e) => Ok((HwDriverConfig::default(), Some(e.to_string()))),
        },
    }
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut HwDriverConfig, cli: &Cli) {
    if cli.free_only {
        config.resolver.exclude_proprietary = true;
    }
    if let Some(arch) = &cli.arch {
        config.plan.architecture = Some(arch.clone());
    }
}

fn target_root(command: &Commands, config: &HwDriverConfig) -> PathBuf {
    match command {
        Commands::PostInstall { root: Some(root) } => root.clone(),
        _ => config.plan.target_root.clone(),
    }
}

fn exit_code(report: &PostInstallReport) -> i32 {
    if report.is_clean() {
        0
    } else {
        1
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_warning) = load_config(cli.config.as_deref())?;
    init_logging(&config.log.level);
    if let Some(warning) = config_warning {
        warn!("{}; using built-in defaults", warning);
    }
    apply_overrides(&mut config, &cli);

    let registry = builtin_registry(&config.resolver).context("building driver catalog")?;

    if let Commands::Catalog = cli.command {
        output::emit(&output::render_catalog(&registry, cli.json)?);
        return Ok(());
    }

    let devices = devices::collect(cli.lspci.as_deref(), cli.lsusb.as_deref())?;
    info!("{} devices enumerated", devices.len());

    let resolution = Resolver::new(&registry)
        .exclude_proprietary(config.resolver.exclude_proprietary)
        .resolve(devices)
        .context("resolving drivers")?;

    let architecture = config.plan.effective_architecture();
    let target_root = target_root(&cli.command, &config);
    let plan = InstallPlanBuilder::new(&architecture, &target_root).build(&resolution);

    let rendered = match cli.command {
        Commands::Catalog => return Ok(()),
        Commands::Resolve => output::render_resolution(&resolution, &plan, cli.json)?,
        Commands::Packages => output::render_packages(&plan, cli.json)?,
        Commands::PostInstall { .. } => {
            let report = plan.run_post_install();
            output::emit(&output::render_report(&report, cli.json)?);
            let code = exit_code(&report);
            if code != 0 {
                std::io::stdout().flush()?;
                std::process::exit(code);
            }
            return Ok(());
        }
    };
    output::emit(&rendered);
    Ok(())
}
