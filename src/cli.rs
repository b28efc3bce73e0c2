use clap::Parser;
use std::path::PathBuf;

use crate::aggregator::MAX_PRECISION;
use crate::config::{
    DEFAULT_CURRENCY_SYMBOL, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_INPUT_PATH,
    DEFAULT_LAYOUT_SEED, DEFAULT_OUTPUT_PATH, DEFAULT_PRECISION,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "attack-tree",
    about = "Attack tree - aggregate threat risk and draw the tree as an SVG",
    version
)]
pub struct Args {
    /// JSON catalog of threats (root, branches and leaves)
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// SVG file the attack tree is written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Currency symbol shown in front of every monetary amount
    #[arg(short, long, default_value = DEFAULT_CURRENCY_SYMBOL)]
    pub currency: String,

    /// Decimal digits kept on probabilities (0 to 15)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_PRECISION,
        value_parser = clap::value_parser!(u32).range(0..=MAX_PRECISION as i64)
    )]
    pub precision: u32,

    /// Seed for the node layout (same seed, same drawing)
    #[arg(short, long, default_value_t = DEFAULT_LAYOUT_SEED)]
    pub seed: u64,

    /// Font family of the node labels
    #[arg(long, default_value = DEFAULT_FONT_FAMILY)]
    pub font_family: String,

    /// Font size of the node labels
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    pub font_size: u32,

    /// Enable verbose logging of all operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}
