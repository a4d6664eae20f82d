use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "quotenote")]
#[command(about = "Collect quotes worth keeping, locally or in the cloud")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for cloud auth configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Quick capture: quotenote "a quote worth keeping"
    #[arg(trailing_var_arg = true)]
    pub quote: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a new quote
    #[command(alias = "new")]
    Add {
        /// Quote text
        text: Vec<String>,
        /// Who said it
        #[arg(short, long)]
        author: Option<String>,
        /// Comma-separated tags
        #[arg(short, long, value_name = "TAGS")]
        tags: Option<String>,
    },
    /// List quotes, newest first
    List {
        /// Only quotes carrying this tag
        #[arg(long)]
        tag: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one quote in full
    Show {
        /// Quote ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing quote (opens $EDITOR when no fields are given)
    Edit {
        /// Quote ID or unique ID prefix
        id: String,
        /// New quote text
        #[arg(long)]
        text: Option<String>,
        /// New author; pass an empty string to clear it
        #[arg(long)]
        author: Option<String>,
        /// New comma-separated tags; pass an empty string to clear them
        #[arg(long, value_name = "TAGS")]
        tags: Option<String>,
    },
    /// Delete a quote
    Delete {
        /// Quote ID or unique ID prefix
        id: String,
    },
    /// Show a random quote
    Random {
        /// Quote ID (or prefix) to avoid, e.g. the one currently shown
        #[arg(long, value_name = "ID")]
        exclude: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tags in use
    Tags,
    /// Show or set which screen the app opens on
    Interface {
        /// Screen to open on; omit to print the current setting
        #[arg(value_enum)]
        mode: Option<InterfaceMode>,
    },
    /// Copy quotes saved on this device into your cloud collection
    Migrate,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign up, sign in and out of cloud storage
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum InterfaceMode {
    /// Landing page until quotes are saved
    Landing,
    /// Always open on the quotes view
    Quotes,
}

impl InterfaceMode {
    pub const fn from_flag(force_quotes_interface: bool) -> Self {
        if force_quotes_interface {
            Self::Quotes
        } else {
            Self::Landing
        }
    }

    pub const fn is_forced(self) -> bool {
        matches!(self, Self::Quotes)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long = "name", value_name = "NAME")]
        profile: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Optional bootstrap manifest URL
        #[arg(long, value_name = "URL")]
        bootstrap_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account; quotes saved on this device are copied to the cloud
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for the profile
    Status,
    /// Sign out and clear quotes stored on this device
    Logout,
    /// Email a password reset link
    ResetPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
}
