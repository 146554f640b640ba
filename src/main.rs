// External crates
use clap::{Parser, Subcommand};

// Standard library
use std::path::PathBuf;

use pwmask::{execute_mask, execute_review};

/*=================================================================
=                                  ARGS                           =
=================================================================*/

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct ArgParser {
    #[clap(subcommand)]
    command: Commands,

    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sample masking templates from a password corpus and classify them
    Mask {
        #[arg(required = true, long)]
        config: PathBuf,
    },

    /// Inspect the artifacts of a finished masking run
    Review {
        #[arg(required = true, long)]
        config: PathBuf,

        #[arg(long, help = "Restrict the review to one item count")]
        item_count: Option<usize>,

        #[arg(long, help = "Number of sample templates to display per class")]
        samples: Option<usize>,

        #[arg(long, help = "Display per-group source-set statistics instead of samples")]
        stats: bool,
    },
}

/*=================================================================
=                                 MAIN                            =
=================================================================*/

fn main() {
    let args = ArgParser::parse();
    let threads = args.threads;
    if threads != 0 {
        std::env::set_var("RAYON_NUM_THREADS", threads.to_string());
    }

    let result = match &args.command {
        Commands::Mask { config } => execute_mask(config),

        Commands::Review {
            config,
            item_count,
            samples,
            stats,
        } => execute_review(config, *item_count, *samples, *stats),
    };
    result.unwrap()
}
