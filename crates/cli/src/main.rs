use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use profilectl_config::{Config, ProfileAction, ProfileDeclaration, ProfileSource, CONFIG_FILE_NAME};
use profilectl_runner::{ConvergeReport, ExecuteResult};

mod telemetry;

#[derive(Parser)]
#[command(name = "profilectl", version, about = "Converge macOS configuration profiles")]
struct Cli {
    /// Config file (default: .profilectl.toml, optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path of the `profiles` binary
    #[arg(long, global = true)]
    profiles_bin: Option<PathBuf>,
    /// Directory for temporary plist/bundle files
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge the [profile] declared in the config file
    Apply {
        /// Only report what would be done
        #[arg(long)]
        dry_run: bool,
    },
    /// Install a profile unless the same revision is already installed
    Install {
        /// Profile name; names the bundle if it ends in .mobileconfig
        profile_name: String,
        /// Path of the .mobileconfig bundle
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Identifier override
        #[arg(long)]
        identifier: Option<String>,
        /// Only report what would be done
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove a profile by identifier
    Remove {
        /// Profile name, used as identifier unless --identifier is given
        profile_name: String,
        /// Identifier override
        #[arg(long)]
        identifier: Option<String>,
        /// Only report what would be done
        #[arg(long)]
        dry_run: bool,
    },
    /// List installed profiles per scope
    List {
        /// Only show profiles with this identifier
        #[arg(long)]
        identifier: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_optional(Path::new(CONFIG_FILE_NAME))?,
    };
    if let Some(bin) = cli.profiles_bin {
        config.settings.profiles_bin = bin;
    }
    if let Some(dir) = cli.temp_dir {
        config.settings.temp_dir = Some(dir);
    }
    if let Some(level) = cli.log_level {
        config.settings.log.level = level;
    }

    telemetry::init_tracing(&config.settings.log);
    tracing::debug!(
        profiles_bin = %config.settings.profiles_bin.display(),
        bundle_dir = %config.bundle_dir().display(),
        declared = config.profile.is_some(),
        "loaded config"
    );

    match cli.command {
        Commands::Apply { dry_run } => {
            let declaration = config.profile.clone().ok_or_else(|| {
                anyhow::anyhow!("No [profile] declared in {}", config_display(cli.config.as_deref()))
            })?;
            converge(&config, &declaration, dry_run).await?;
        }
        Commands::Install {
            profile_name,
            profile,
            identifier,
            dry_run,
        } => {
            let mut declaration = ProfileDeclaration::new(profile_name, ProfileAction::Install);
            if let Some(path) = profile {
                declaration = declaration.with_profile(ProfileSource::Bundle(absolute(path)?));
            }
            if let Some(id) = identifier {
                declaration = declaration.with_identifier(id);
            }
            converge(&config, &declaration, dry_run).await?;
        }
        Commands::Remove {
            profile_name,
            identifier,
            dry_run,
        } => {
            let mut declaration = ProfileDeclaration::new(profile_name, ProfileAction::Remove);
            if let Some(id) = identifier {
                declaration = declaration.with_identifier(id);
            }
            converge(&config, &declaration, dry_run).await?;
        }
        Commands::List { identifier } => {
            let installed = profilectl_runner::list_installed_profiles(&config.settings).await?;
            tracing::debug!(count = installed.len(), "listed installed profiles");

            let mut shown = 0;
            for scope in installed.scope_names() {
                let profiles: Vec<_> = installed
                    .scope(scope)
                    .iter()
                    .filter(|p| identifier.as_deref().map_or(true, |id| p.identifier == id))
                    .collect();
                if profiles.is_empty() {
                    continue;
                }

                println!("{}:", scope);
                for p in profiles {
                    println!("  {}", p.identifier);
                    println!("     UUID:  {}", p.uuid);
                    if !p.display_name.is_empty() {
                        println!("     Name:  {}", p.display_name);
                    }
                    if !p.profile_type.is_empty() {
                        println!("     Type:  {}", p.profile_type);
                    }
                    shown += 1;
                }
            }

            if shown == 0 {
                println!("No installed profiles found.");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn converge(config: &Config, declaration: &ProfileDeclaration, dry_run: bool) -> anyhow::Result<()> {
    let report =
        profilectl_runner::converge_declaration(declaration, &config.settings, &config.bundle_dir(), dry_run)
            .await?;
    tracing::info!(
        identifier = %report.decision.identifier,
        changed = report.changed(),
        dry_run,
        "converge finished"
    );
    print_report(&report);
    Ok(())
}

fn print_report(report: &ConvergeReport) {
    match &report.result {
        ExecuteResult::Unchanged => println!("{}", report.decision.summary()),
        ExecuteResult::Executed(command) => {
            println!("{}", report.decision.summary());
            println!("  ran: {}", command);
        }
        ExecuteResult::WouldExecute(command) => {
            println!("[dry-run] {}", report.decision.summary());
            println!("  would run: {}", command);
        }
    }
}

/// `--profile` is relative to the working directory, not to bundle_dir.
fn absolute(path: PathBuf) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}

fn config_display(path: Option<&Path>) -> String {
    path.unwrap_or(Path::new(CONFIG_FILE_NAME)).display().to_string()
}
