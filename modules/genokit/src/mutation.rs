//! Mutation rates between two aligned sequences
//! Alejandro Gonzales-Irribarren, 2025
//!
//! The rate of a stretch is the share of aligned positions that do not
//! carry the same base in both sequences. Gaps never count as matches.
//! Windows slide one base at a time over the first sequence.

use anyhow::bail;
use rayon::prelude::*;

use std::path::Path;

use crate::{
    cli::MutationArgs,
    consts::*,
    fasta::read_fasta,
    plot,
    utils::{file_stem, has_extension},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationSummary {
    pub whole: f64,
    pub max: f64,
    pub max_pos: usize,
    pub min: f64,
    pub min_pos: usize,
}

fn is_match(a: u8, b: u8) -> bool {
    a == b && a != b'-'
}

/// Share of matching positions over the common prefix of `a` and `b`.
///
/// Returns `0.0` when either sequence is empty.
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let length = a.len().min(b.len());
    if length == 0 {
        return 0.0;
    }

    let matches = a.iter().zip(b).filter(|&(&x, &y)| is_match(x, y)).count();
    matches as f64 / length as f64
}

pub fn mutation_rate(a: &[u8], b: &[u8]) -> f64 {
    1.0 - similarity(a, b)
}

/// Mutation rate of every window of `window` bases.
///
/// # Arguments
///
/// * `a` - first sequence, windows start at `0..=a.len() - window`
/// * `b` - second sequence, its windows are cut short at its end
/// * `window` - window length
///
/// # Returns
///
/// One rate in `[0, 1]` per window start; empty when `window` is 0 or
/// longer than `a`.
///
/// # Example
///
/// ```rust, ignore
/// let rates = mutation_rates(b"AAAA", b"AATA", 2);
/// assert_eq!(rates, vec![0.0, 0.5, 0.5]);
/// ```
pub fn mutation_rates(a: &[u8], b: &[u8], window: usize) -> Vec<f64> {
    if window == 0 || window > a.len() {
        return Vec::new();
    }

    let common = a.len().min(b.len());
    let mut prefix = Vec::with_capacity(common + 1);
    prefix.push(0usize);
    for (x, y) in a.iter().zip(b) {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + is_match(*x, *y) as usize);
    }

    (0..=a.len() - window)
        .into_par_iter()
        .map(|i| {
            // INFO: i + window <= a.len(), so the clipped end stays within both
            let length = window.min(b.len().saturating_sub(i));
            if length == 0 {
                return 1.0;
            }

            let matches = prefix[i + length] - prefix[i];
            1.0 - matches as f64 / length as f64
        })
        .collect()
}

/// Whole-sequence rate plus the first windows with the highest and lowest rate.
pub fn summarize(a: &[u8], b: &[u8], rates: &[f64]) -> Option<MutationSummary> {
    let (mut max_pos, mut min_pos) = (0, 0);
    let first = *rates.first()?;
    let (mut max, mut min) = (first, first);

    for (pos, &rate) in rates.iter().enumerate().skip(1) {
        if rate > max {
            max = rate;
            max_pos = pos;
        }
        if rate < min {
            min = rate;
            min_pos = pos;
        }
    }

    Some(MutationSummary {
        whole: mutation_rate(a, b),
        max,
        max_pos,
        min,
        min_pos,
    })
}

/// Compares two aligned sequences window by window.
///
/// # Arguments
///
/// * `args` - FASTA file with exactly two aligned sequences, window length,
///   plot options
///
/// # Example
///
/// ```rust, ignore
/// let args = MutationArgs::parse();
/// run_mutation(args)?;
/// ```
pub fn run_mutation(args: MutationArgs) -> anyhow::Result<()> {
    if !has_extension(&args.fasta, &FASTA_EXTENSIONS) {
        bail!(
            "please provide a FASTA file ending in one of {:?}, got {}",
            FASTA_EXTENSIONS,
            args.fasta.display()
        );
    }

    let records = read_fasta(&args.fasta)?;
    if records.len() != 2 {
        bail!(
            "expected exactly two sequences in {}, found {}",
            args.fasta.display(),
            records.len()
        );
    }

    let (a, b) = (&records[0].seq, &records[1].seq);
    if a.len() != b.len() {
        log::warn!(
            "WARN: sequences differ in length ({} vs {}), are they aligned?",
            a.len(),
            b.len()
        );
    }

    if args.length > a.len() {
        bail!(
            "window length {} exceeds the length of {} ({})",
            args.length,
            records[0].id,
            a.len()
        );
    }

    log::info!(
        "INFO: comparing {} and {} with window length {}",
        records[0].id,
        records[1].id,
        args.length
    );

    let rates = mutation_rates(a, b, args.length);
    let summary = summarize(a, b, &rates)
        .ok_or_else(|| anyhow::anyhow!("no windows of length {} to compare", args.length))?;

    println!("whole sequence mutation: {:.3}%", summary.whole * 100.0);
    println!(
        "max mutation rate: {:>7.3}% at position: {:>7}",
        summary.max * 100.0,
        summary.max_pos
    );
    println!(
        "min mutation rate: {:>7.3}% at position: {:>7}",
        summary.min * 100.0,
        summary.min_pos
    );

    if !args.no_plot {
        let output = plot_path(&args.outdir, &args.fasta, args.length)?;
        plot::mutation_rates(&output, &rates, args.length)?;
        log::info!("INFO: mutation plot written to {}", output.display());
    }

    Ok(())
}

fn plot_path(outdir: &Path, fasta: &Path, window: usize) -> anyhow::Result<std::path::PathBuf> {
    std::fs::create_dir_all(outdir)?;
    Ok(outdir.join(format!("{}_{}.svg", file_stem(fasta)?, window)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_ignores_gaps() {
        assert_eq!(similarity(b"AC-T", b"AC-T"), 0.75);
        assert_eq!(similarity(b"ACGT", b"ACGA"), 0.75);
        assert_eq!(similarity(b"ACGT", b"AC"), 1.0);
        assert_eq!(similarity(b"", b"ACGT"), 0.0);
    }

    #[test]
    fn test_mutation_rates_slide_by_one() {
        let rates = mutation_rates(b"AAAA", b"AATA", 2);
        assert_eq!(rates, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_mutation_rates_clip_shorter_second_sequence() {
        let rates = mutation_rates(b"AAAAAA", b"AAAT", 3);

        assert_eq!(rates.len(), 4);
        assert_eq!(rates[0], 0.0);
        assert!((rates[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(rates[2], 0.5);
        assert_eq!(rates[3], 1.0);
    }

    #[test]
    fn test_mutation_rates_bounds() {
        assert!(mutation_rates(b"ACGT", b"ACGT", 5).is_empty());
        assert!(mutation_rates(b"ACGT", b"ACGT", 0).is_empty());

        let rates = mutation_rates(b"ACGT-ACGTTTGA", b"AGGTTAC-TTAGC", 4);
        assert!(rates.iter().all(|r| (0.0..=1.0).contains(r)));
    }

    #[test]
    fn test_summarize_reports_first_extremes() {
        let rates = [0.5, 0.2, 0.9, 0.2, 0.9];
        let summary = summarize(b"AC", b"AG", &rates).unwrap();

        assert_eq!(summary.whole, 0.5);
        assert_eq!(summary.max, 0.9);
        assert_eq!(summary.max_pos, 2);
        assert_eq!(summary.min, 0.2);
        assert_eq!(summary.min_pos, 1);
        assert!(summarize(b"A", b"A", &[]).is_none());
    }
}
