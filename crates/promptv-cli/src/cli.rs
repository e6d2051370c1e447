use clap::{Args, Parser, Subcommand};

use promptv_core::VERSION;

/// promptv - local version control for LLM prompts
#[derive(Parser)]
#[command(name = "promptv")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the prompt store directory
    #[arg(short, long, global = true, env = "PROMPTV_STORE")]
    pub store: Option<String>,

    /// Project namespace
    #[arg(
        short,
        long,
        global = true,
        env = "PROMPTV_PROJECT",
        default_value = "default"
    )]
    pub project: String,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Store directory to record in the config file
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `commit` command
#[derive(Args)]
pub struct CommitArgs {
    /// Prompt name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Read the prompt text from a file
    #[arg(short, long, value_name = "FILE", conflicts_with = "content")]
    pub file: Option<String>,

    /// Prompt text (overrides stdin)
    #[arg(long)]
    pub content: Option<String>,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Arguments for the `get` command
#[derive(Args)]
pub struct GetArgs {
    /// Prompt name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Version number, tag name or "latest"
    #[arg(value_name = "REF", default_value = "latest")]
    pub reference: String,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Prompt whose versions to list (lists prompts when omitted)
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

/// Arguments for the `remove` command
#[derive(Args)]
pub struct RemoveArgs {
    /// Prompt name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the `diff` command
#[derive(Args)]
pub struct DiffArgs {
    /// Prompt name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Old side reference
    #[arg(value_name = "A")]
    pub a: String,

    /// New side reference
    #[arg(value_name = "B")]
    pub b: String,

    /// Output format (side-by-side, unified, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Context lines around changes in unified output
    #[arg(long, value_name = "N")]
    pub context: Option<usize>,

    /// Column width for side-by-side output
    #[arg(long, value_name = "N")]
    pub width: Option<usize>,
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Point a new tag at a version
    Create {
        /// Prompt name
        #[arg(value_name = "NAME")]
        name: String,

        /// Tag name
        #[arg(value_name = "TAG")]
        tag: String,

        /// Version to tag (number, existing tag or "latest")
        #[arg(value_name = "REF", default_value = "latest")]
        reference: String,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show a tag
    Get {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "TAG")]
        tag: String,
    },

    /// List tags of a prompt
    List {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a tag (the version is kept)
    Delete {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "TAG")]
        tag: String,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init(InitArgs),

    /// Commit a new version of a prompt
    Commit(CommitArgs),

    /// Print a version of a prompt
    Get(GetArgs),

    /// List prompts, or the versions of one prompt
    List(ListArgs),

    /// Delete a prompt with all versions and tags
    Remove(RemoveArgs),

    /// Manage tags
    #[command(subcommand)]
    Tag(TagCommands),

    /// Compare two versions of a prompt
    Diff(DiffArgs),
}
