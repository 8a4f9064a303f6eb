//! Save command CLI definitions

use b4s::Platform;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum SaveCommand {
    /// Decrypt a .sav file to YAML (stdout or -o file)
    Decrypt {
        /// Path to .sav file
        input: PathBuf,

        /// Path to output YAML file (uses stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Steam ID or Epic account ID (uses configured default if not provided)
        #[arg(short, long, env = "B4S_USER_ID")]
        user_id: Option<String>,
    },

    /// Encrypt YAML (positional file or stdin) to a .sav file
    Encrypt {
        /// Path to output .sav file
        output: PathBuf,

        /// YAML input file (reads stdin if not provided)
        yaml: Option<PathBuf>,

        /// Steam ID or Epic account ID (uses configured default if not provided)
        #[arg(short, long, env = "B4S_USER_ID")]
        user_id: Option<String>,

        /// Target platform (defaults to the configured one, then to the user ID's shape)
        #[arg(short, long)]
        platform: Option<Platform>,
    },

    /// List every item serial in a .sav file
    Items {
        /// Path to .sav file
        input: PathBuf,

        /// Steam ID or Epic account ID (uses configured default if not provided)
        #[arg(short, long, env = "B4S_USER_ID")]
        user_id: Option<String>,
    },

    /// Add an item to the backpack of a .sav file
    Add {
        /// Path to .sav file (rewritten in place unless -o is given)
        input: PathBuf,

        /// Item serial (@U...) or block text (e.g. "7|")
        item: String,

        /// state_flags value of the new slot (1, 3, 5, 17, 33, 65, 129)
        #[arg(short = 'f', long, default_value_t = 1)]
        state_flags: u32,

        /// Write the modified save here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Steam ID or Epic account ID (uses configured default if not provided)
        #[arg(short, long, env = "B4S_USER_ID")]
        user_id: Option<String>,
    },
}
