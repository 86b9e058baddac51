use clap::{Parser, Subcommand};
use pdhquery::ValueKind;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enables verbose output.
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Lists the concrete instances of an English wildcard path, without _Total.
    Expand {
        /// e.g. "\Processor(*)\% Processor Time"
        path: String,
    },

    /// Checks that a localized counter path exists.
    Validate { path: String },

    /// Shows the description PDH keeps for an English counter path.
    Info {
        path: String,

        /// Also fetch the counter's explain text.
        #[clap(short, long)]
        explain: bool,
    },

    /// Reads the current value of every instance of an English wildcard path.
    Read {
        path: String,

        /// The value type to format as: double, large or long.
        #[clap(short, long, default_value_t = ValueKind::Double)]
        kind: ValueKind,

        /// The time between collections in ms.
        #[clap(short, long, default_value_t = 1000)]
        interval: u64,

        /// The number of samples to print.
        #[clap(short, long, default_value_t = 1)]
        samples: u32,
    },
}
