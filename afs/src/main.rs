use std::path::PathBuf;

use afs_format::CancelToken;
use anyhow::Context;
use structopt::clap::AppSettings::*;
use structopt::StructOpt;

mod commands;
mod descriptor;
mod error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(
        name = "pack",
        visible_alias = "p",
        about = "Pack the files listed in a METADATA.json descriptor"
    )]
    Pack {
        #[structopt(
            name = "descriptor",
            parse(from_os_str),
            help = "Path to the METADATA.json descriptor"
        )]
        descriptor: PathBuf,

        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "Archive to write [default: OUTPUT.AFS next to the descriptor]"
        )]
        output: Option<PathBuf>,
    },

    #[structopt(
        name = "unpack",
        visible_alias = "x",
        about = "Extract every entry and write a METADATA.json descriptor"
    )]
    Unpack {
        #[structopt(name = "afsfile", parse(from_os_str), help = "Path to the .afs archive")]
        path: PathBuf,

        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "Directory to extract into [default: UNPACK_<archive> next to the archive]"
        )]
        output: Option<PathBuf>,
    },

    #[structopt(name = "list", visible_alias = "l", about = "List entries of an archive")]
    List {
        #[structopt(name = "afsfile", parse(from_os_str), help = "Path to the .afs archive")]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "afs",
    about = "Pack, unpack and inspect AFS archives.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands]
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

/// Requests cancellation on Ctrl-C. Work stops after the entry in progress.
fn cancel_on_interrupt(cancel: CancelToken) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::warn!("interrupted, stopping after the current entry");
                    cancel.cancel();
                }
                Err(e) => tracing::error!("cannot listen for Ctrl-C: {}", e),
            }
        })
    });

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = CliOpts::from_args();

    let default_level = if opts.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone()).context("Cannot install Ctrl-C handler")?;

    match opts.cmd {
        Commands::Pack { descriptor, output } => commands::pack(descriptor, output, &cancel)?,
        Commands::Unpack { path, output } => commands::unpack(path, output, &cancel)?,
        Commands::List { path } => commands::list(path)?,
    }

    Ok(())
}
