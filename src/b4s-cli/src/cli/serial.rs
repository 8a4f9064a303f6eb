//! Serial command CLI definitions

use clap::Subcommand;

#[derive(Subcommand)]
pub enum SerialCommand {
    /// Decode an item serial into block text
    Decode {
        /// Item serial to decode (e.g. @Ugr$ZCm/&tH!t{KgK/Shxu>k)
        serial: String,

        /// Print the blocks as JSON
        #[arg(long)]
        json: bool,

        /// Show the decoded bits split at token boundaries
        #[arg(long)]
        bits: bool,
    },

    /// Encode block text into an item serial
    Encode {
        /// Block text (e.g. "269, 0, 1, 33| 2, 1949|| {1} {7} {243:104}|")
        text: String,
    },
}
