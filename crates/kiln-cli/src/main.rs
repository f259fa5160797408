//! kiln - CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kiln_cli::cmd;
use kiln_cli::{Cli, Commands};
use kiln_core::{AutoremoveOptions, InstallOptions, RemoveOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install {
            ports,
            force,
            recurse,
            store_cache,
            cache_token,
        } => cmd::install::install(
            &ports,
            InstallOptions {
                force,
                recurse,
                store_cache,
                cache_token,
            },
        ),
        Commands::Remove {
            ports,
            purge,
            recurse,
            build_cache,
        } => cmd::remove::remove(
            &ports,
            RemoveOptions {
                purge,
                recurse,
                build_cache,
            },
        ),
        Commands::Clean {
            ports,
            recurse,
            dev,
            all,
        } => cmd::clean::clean(&ports, recurse, dev, all),
        Commands::Reverse { port, dev } => cmd::reverse::reverse(&port, dev),
        Commands::Tree { port } => cmd::tree::tree(&port),
        Commands::Autoremove { purge, build_cache } => {
            cmd::autoremove::autoremove(AutoremoveOptions { purge, build_cache })
        }
        Commands::List => cmd::list::list(),
        Commands::Configure {
            platform,
            project,
            build_type,
            jobs,
            package_cache_dir,
            package_cache_writable,
            binary_cache_dir,
            cache_token,
            cache_dir,
        } => cmd::configure::configure(&cmd::configure::ConfigureArgs {
            platform,
            project,
            build_type,
            jobs,
            package_cache_dir,
            package_cache_writable,
            binary_cache_dir,
            cache_token,
            cache_dir,
        }),
    }
}
