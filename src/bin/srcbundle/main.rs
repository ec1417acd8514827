//! srcbundle CLI - fetch, verify and cache source bundles

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use srcbundle::util::Shell;
use srcbundle::BundleError;

fn main() {
    let cli = Cli::parse();
    let shell = cli.global.shell();

    // Set up logging
    let directive = if shell.is_verbose() {
        "srcbundle=debug"
    } else if shell.is_quiet() || shell.is_json() {
        "srcbundle=error"
    } else {
        "srcbundle=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(shell.use_color())
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli, &shell) {
        report_error(&shell, &e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, &global.context()?, shell),
        Commands::Apply(args) => commands::apply::execute(args, &global.context()?, shell),
        Commands::Hash(args) => commands::hash::execute(args, shell),
        Commands::Cache(args) => commands::cache::execute(args, &global.context()?, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report_error(shell: &Shell, e: &anyhow::Error) {
    if shell.is_json() {
        shell.error(format!("{:#}", e));
        return;
    }

    eprintln!("error: {:#}", e);
    if let Some(help) = e.downcast_ref::<BundleError>().and_then(|err| err.help()) {
        eprintln!("help: {}", help);
    }
}
