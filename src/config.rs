//! Run configuration and the defaults of the shipped catalogs.

use std::path::PathBuf;

use crate::cli::Args;
use crate::models::ThreatId;

pub const DEFAULT_INPUT_PATH: &str = "configs/pre_digitalisation.json";
pub const DEFAULT_OUTPUT_PATH: &str = "attack_tree_pre_digitalisation.svg";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "£";
pub const DEFAULT_PRECISION: u32 = 2;
pub const DEFAULT_LAYOUT_SEED: u64 = 7;
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
pub const DEFAULT_FONT_SIZE: u32 = 6;

/// The root of every catalog must carry this id and category.
pub const ROOT_THREAT_ID: ThreatId = 1;
pub const ROOT_THREAT_CATEGORY: &str = "Combined";

/// Everything a single run needs; no process-wide state is consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub currency_symbol: String,
    /// Decimal digits kept on every probability
    pub precision: u32,
    /// Seed of the spring layout, fixed for reproducible drawings
    pub layout_seed: u64,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            precision: DEFAULT_PRECISION,
            layout_seed: DEFAULT_LAYOUT_SEED,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            input_path: args.input.clone(),
            output_path: args.output.clone(),
            currency_symbol: args.currency.clone(),
            precision: args.precision,
            layout_seed: args.seed,
            font_family: args.font_family.clone(),
            font_size: args.font_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_defaults_match_config_defaults() {
        let args = Args::parse_from(["attack-tree"]);
        assert_eq!(Config::from(&args), Config::default());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "attack-tree",
            "--input",
            "configs/post_digitalisation.json",
            "--output",
            "post.svg",
            "--currency",
            "$",
            "--precision",
            "3",
            "--seed",
            "42",
        ]);
        let config = Config::from(&args);
        assert_eq!(config.input_path, PathBuf::from("configs/post_digitalisation.json"));
        assert_eq!(config.output_path, PathBuf::from("post.svg"));
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.precision, 3);
        assert_eq!(config.layout_seed, 42);
    }

    #[test]
    fn test_cli_rejects_precision_out_of_range() {
        assert!(Args::try_parse_from(["attack-tree", "--precision", "400"]).is_err());
        assert!(Args::try_parse_from(["attack-tree", "--precision", "16"]).is_err());
        let args = Args::try_parse_from(["attack-tree", "--precision", "15"]).unwrap();
        assert_eq!(Config::from(&args).precision, 15);
    }
}
