use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "genomedepth",
    version,
    about = "Depth, breadth and gap statistics from bedtools genomecov -bga output"
)]
pub struct Cli {
    /// Coverage intervals (chrom, start, end, depth); `-` reads stdin
    #[arg(short = 'i', long, default_value = "-")]
    pub input: PathBuf,

    /// Summary CSV; `-` writes to stdout
    #[arg(short = 'o', long, default_value = "-")]
    pub output: PathBuf,

    /// Number of histogram bins
    #[arg(short = 'r', long, default_value_t = 20)]
    pub ranges: usize,

    /// Depth thresholds for breadth columns, e.g. `-b 5,10,30`
    #[arg(short = 'b', long, value_delimiter = ',', action = ArgAction::Append)]
    pub breadth: Vec<u32>,

    /// Write a depth histogram CSV to this path
    #[arg(short = 'd', long)]
    pub depth_histogram: Option<PathBuf>,

    /// Write a gap-length histogram CSV to this path
    #[arg(short = 'g', long)]
    pub gap_histogram: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = MedianArg::Conventional)]
    pub median: MedianArg,

    #[arg(short = 't', long, default_value_t = 1)]
    pub threads: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MedianArg {
    /// Mean of the two middle samples
    #[value(name = "conventional")]
    Conventional,
    /// Mean of samples n/2 and n/2+1, as genomedepth 1.0 reported
    #[value(name = "legacy")]
    Legacy,
}
