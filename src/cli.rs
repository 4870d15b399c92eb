use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the shop front-end build.
#[derive(Parser, Debug)]
#[command(
    name = "shop-build",
    about = "Shop front-end build: LESS manifest, styles, scripts, lint and watch",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Shop whose config_<id>.json is built (default: $SHOP_ID, else 1)
    #[arg(long = "shopId", visible_alias = "shop-id", global = true)]
    pub shop_id: Option<u32>,

    /// Leave the responsive theme out of the LESS manifest
    #[arg(long = "excludeSWtheme", visible_alias = "exclude-sw-theme", global = true)]
    pub exclude_sw_theme: bool,

    /// Override the build root (default: $SHOP_BUILD_ROOT, else the current directory)
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,

    /// Print the commands instead of running them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Run tasks one at a time (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,

    /// Do not raise desktop notifications on failure
    #[arg(long = "no-notify", global = true, action = clap::ArgAction::SetFalse)]
    pub notify: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Development build, then watch for changes
    #[command(visible_alias = "dev")]
    Default,
    /// Production build
    Dist,
    /// Watch sources and rebuild on change
    Watch,
    /// Run the named tasks and their dependencies
    Run(RunOpts),
    /// List the tasks and their dependencies
    Tasks,
    /// Print version information
    Version,
}

impl Command {
    /// Name used for log file names.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dist => "dist",
            Self::Watch => "watch",
            Self::Run(_) => "run",
            Self::Tasks => "tasks",
            Self::Version => "version",
        }
    }
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Task names or aliases (see `shop-build tasks`)
    #[arg(required = true, num_args = 1..)]
    pub tasks: Vec<String>,
}
