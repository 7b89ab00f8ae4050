use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::consts::*;

#[derive(Debug, Parser)]
#[command(name = "genokit", about = "Small genome and proteome analysis tools", version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,

    #[arg(
        short = 'L',
        long = "level",
        help = "Logging level",
        value_name = "LEVEL",
        default_value_t = log::Level::Info,
    )]
    pub level: log::Level,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mutation rates of two aligned sequences over sliding windows
    Mutation(MutationArgs),

    /// Reciprocal best hits between a proteome and a set of references
    Orthologs(OrthologArgs),

    /// Statistics of a multi-FASTA file
    Stats(StatsArgs),

    /// Genome statistics from genes predicted by prodigal
    Genome(GenomeArgs),

    /// Print nucleotides as triplet rows annotated with amino acids
    Pretty(PrettyArgs),

    /// List ATG..stop reading frames in all six frames
    Orfs(OrfArgs),

    /// Compare getorf and prodigal predictions
    Diff(DiffArgs),

    /// Print the codon table
    Code(CodeArgs),
}

fn positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn blocks(value: &str) -> Result<usize, String> {
    let n = positive(value)?;
    if n > MAX_PRETTY_BLOCKS {
        return Err(format!("must be at most {MAX_PRETTY_BLOCKS}"));
    }
    Ok(n)
}

#[derive(Debug, Parser)]
pub struct MutationArgs {
    #[arg(
        short = 'f',
        long = "fasta",
        required = true,
        help = "Path to .fasta file with exactly two aligned sequences"
    )]
    pub fasta: PathBuf,

    #[arg(
        short = 'l',
        long = "length",
        help = "Sliding window length",
        value_parser = positive,
        default_value_t = WINDOW_LENGTH
    )]
    pub length: usize,

    #[arg(
        short = 'o',
        long = "outdir",
        help = "Directory for the plot",
        default_value = "."
    )]
    pub outdir: PathBuf,

    #[arg(long = "no-plot", help = "Do not plot the rates")]
    pub no_plot: bool,
}

#[derive(Debug, Parser)]
pub struct OrthologArgs {
    #[arg(
        short = 'q',
        long = "target",
        required = true,
        help = "Path to the target .faa proteome"
    )]
    pub target: PathBuf,

    #[arg(
        short = 'p',
        long = "proteomes",
        help = "Directory with reference .faa proteomes",
        default_value = "proteomes"
    )]
    pub proteomes: PathBuf,

    #[arg(
        short = 'd',
        long = "outdir",
        help = "Directory for diamond hit tables",
        default_value = "out"
    )]
    pub outdir: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        help = "Reciprocal table, defaults to <outdir>/reciprocal.tsv"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long = "diamond",
        env = DIAMOND_ENV,
        help = "Path to the diamond executable",
        default_value = DIAMOND
    )]
    pub diamond: String,

    #[arg(
        short = 'e',
        long = "evalue",
        help = "Maximum e-value of a hit",
        default_value_t = EVALUE_EPSILON
    )]
    pub evalue: f64,

    #[arg(
        long = "diamond-threads",
        help = "Threads passed to diamond, diamond decides when unset"
    )]
    pub diamond_threads: Option<usize>,

    #[arg(
        long = "precomputed",
        help = "Reuse existing hit tables in the outdir instead of running diamond"
    )]
    pub precomputed: bool,
}

#[derive(Debug, Parser)]
pub struct StatsArgs {
    #[arg(
        short = 'i',
        long = "input",
        help = "Input FASTA, - for stdin",
        default_value = "-"
    )]
    pub input: PathBuf,

    #[arg(short = 'c', long = "codons", help = "Also print codon usage")]
    pub codons: bool,

    #[arg(
        short = 'p',
        long = "plot-dir",
        help = "Directory for length and GC plots"
    )]
    pub plot_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct GenomeArgs {
    #[arg(
        required = true,
        num_args = 1..,
        value_name = "FILE",
        help = "FASTA files with one genome sequence each"
    )]
    pub files: Vec<PathBuf>,

    #[arg(
        long = "prodigal",
        env = PRODIGAL_ENV,
        help = "Path to the prodigal executable",
        default_value = PRODIGAL
    )]
    pub prodigal: String,

    #[arg(
        short = 'o',
        long = "outdir",
        help = "Keep prodigal GFF files in this directory"
    )]
    pub outdir: Option<PathBuf>,

    #[arg(long = "header", help = "Print column names before the rows")]
    pub header: bool,
}

#[derive(Debug, Parser)]
pub struct PrettyArgs {
    #[arg(
        short = 'i',
        long = "input",
        help = "Input file, - for stdin",
        default_value = "-"
    )]
    pub input: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        help = "Output file, - for stdout",
        default_value = "-"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'n',
        long = "blocks",
        help = "Number of triplets in a row",
        value_parser = blocks,
        default_value_t = PRETTY_BLOCKS
    )]
    pub blocks: usize,
}

#[derive(Debug, Parser)]
pub struct OrfArgs {
    #[arg(
        short = 'f',
        long = "fasta",
        help = "Input FASTA, - for stdin",
        default_value = "-"
    )]
    pub fasta: PathBuf,

    #[arg(
        short = 'm',
        long = "min-codons",
        help = "Minimum number of codons of a reading frame",
        default_value_t = MIN_ORF_CODONS
    )]
    pub min_codons: usize,

    #[arg(long = "translate", help = "Print amino acids instead of nucleotides")]
    pub translate: bool,
}

#[derive(Debug, Parser)]
pub struct DiffArgs {
    #[arg(required = true, help = "getorf output")]
    pub getorf: PathBuf,

    #[arg(required = true, help = "prodigal GFF output")]
    pub gff: PathBuf,
}

#[derive(Debug, Parser)]
pub struct CodeArgs {
    #[arg(
        short = 'a',
        long = "by-amino-acid",
        help = "Group codons by amino acid"
    )]
    pub by_amino_acid: bool,
}
