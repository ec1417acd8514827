//! CLI definitions using clap.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use srcbundle::util::shell::{ColorChoice, Shell};
use srcbundle::GlobalContext;

/// srcbundle - fetch, verify and cache source bundles
#[derive(Parser)]
#[command(name = "srcbundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Build directory holding the bundle cache, relative to the project root
    #[arg(long, global = true, env = "SRCBUNDLE_BUILD_DIR")]
    pub build_dir: Option<PathBuf>,

    /// Resolve from the cache only; never download or clone
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

impl GlobalArgs {
    pub fn shell(&self) -> Shell {
        Shell::from_flags(
            self.quiet,
            self.verbose,
            self.color,
            self.message_format == MessageFormat::Json,
        )
    }

    /// Build the context for the project root, applying flag overrides.
    pub fn context(&self) -> Result<GlobalContext> {
        let mut ctx = match &self.project_dir {
            Some(dir) => GlobalContext::with_cwd(dir.clone()),
            None => GlobalContext::new()?,
        };
        if let Some(dir) = &self.build_dir {
            ctx = ctx.with_build_dir(dir);
        }
        if self.offline {
            ctx = ctx.with_offline(true);
        }
        Ok(ctx)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, verify and extract bundles into the cache
    Resolve(ResolveArgs),

    /// Resolve bundles and apply them to a project description
    Apply(ApplyArgs),

    /// Print the tree hash of a directory or archive
    Hash(HashArgs),

    /// Manage the bundle cache
    Cache(CacheArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Bundle declarations: `<path|url|repo.git[::subfolder[::ref]]>[##sha256]`
    #[arg(required = true)]
    pub declarations: Vec<String>,

    /// Bundle name to use instead of the derived one (single declaration only)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Project description (TOML)
    #[arg(long)]
    pub project: PathBuf,

    /// Bundle declarations
    #[arg(required = true)]
    pub declarations: Vec<String>,
}

#[derive(Args)]
pub struct HashArgs {
    /// Directory or archive to hash
    pub path: PathBuf,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List extracted bundles
    List,

    /// Show cache locations
    Path,

    /// Remove all cached bundles, downloads and checkouts
    Clean,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
