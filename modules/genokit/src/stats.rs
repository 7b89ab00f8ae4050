//! Descriptive statistics for multi-FASTA files
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Sequence count and size, length and GC distributions, their
//! correlation and, on request, codon usage.

use anyhow::bail;
use hashbrown::HashMap;
use rayon::prelude::*;

use std::io::{BufWriter, Write};

use crate::{
    cli::StatsArgs,
    code::{codon_sort_key, translate_codon, Codon},
    fasta::{read_fasta, FastaRecord},
    plot,
    utils::{gc_count, pearson, Summary},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FastaStats {
    pub count: usize,
    pub total: usize,
    pub lengths: Summary,
    /// GC of all sequences combined, as a fraction.
    pub combined_gc: f64,
    /// Per-sequence GC, as fractions.
    pub gc: Summary,
    pub correlation: Option<f64>,
}

/// Computes the statistics of a set of records.
///
/// # Returns
///
/// `None` when `records` is empty, together with the per-record lengths
/// and GC fractions for plotting.
pub fn fasta_stats(records: &[FastaRecord]) -> Option<(FastaStats, Vec<f64>, Vec<f64>)> {
    let counts = records
        .par_iter()
        .map(|record| (record.len(), gc_count(&record.seq)))
        .collect::<Vec<(usize, usize)>>();

    let total = counts.iter().map(|(len, _)| len).sum::<usize>();
    let total_gc = counts.iter().map(|(_, gc)| gc).sum::<usize>();

    // INFO: combined GC is weighted by length, not the mean of per-record values
    let combined_gc = if total > 0 {
        total_gc as f64 / total as f64
    } else {
        0.0
    };

    let lengths = counts.iter().map(|(len, _)| *len as f64).collect::<Vec<f64>>();
    let gcs = counts
        .iter()
        .map(|(len, gc)| if *len > 0 { *gc as f64 / *len as f64 } else { 0.0 })
        .collect::<Vec<f64>>();

    let stats = FastaStats {
        count: records.len(),
        total,
        lengths: Summary::from_values(&lengths)?,
        combined_gc,
        gc: Summary::from_values(&gcs)?,
        correlation: pearson(&lengths, &gcs),
    };

    Some((stats, lengths, gcs))
}

/// Counts non-overlapping codons read from the start of every sequence.
pub fn codon_frequency<'a, I>(sequences: I) -> HashMap<Codon, usize>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut counts = HashMap::new();
    for seq in sequences {
        for codon in seq.chunks_exact(3) {
            *counts.entry([codon[0], codon[1], codon[2]]).or_insert(0) += 1;
        }
    }
    counts
}

/// Groups codon counts by the amino acid they translate to.
///
/// Codons outside the table are dropped.
pub fn group_by_amino_acid(counts: &HashMap<Codon, usize>) -> HashMap<u8, Vec<(Codon, usize)>> {
    let mut groups: HashMap<u8, Vec<(Codon, usize)>> = HashMap::new();
    for (codon, count) in counts.iter() {
        if let Some(aa) = translate_codon(codon) {
            groups.entry(aa).or_default().push((*codon, *count));
        }
    }

    for codons in groups.values_mut() {
        codons.sort_by_key(|(codon, _)| codon_sort_key(codon));
    }

    groups
}

fn format_quartiles(summary: &Summary, suffix: &str, precision: usize) -> String {
    format!(
        "{:.p$}{suffix}, {:.p$}{suffix}, {:.p$}{suffix}",
        summary.q1,
        summary.median,
        summary.q3,
        p = precision
    )
}

/// Writes the human-readable report.
pub fn write_stats<W: Write>(writer: &mut W, stats: &FastaStats) -> std::io::Result<()> {
    let gc = stats.gc.scaled(100.0);

    writeln!(writer, "Number of sequences: {}", stats.count)?;
    writeln!(writer, "Total size of all sequences: {} bases", stats.total)?;
    writeln!(writer, "Min sequence size: {}", stats.lengths.min)?;
    writeln!(
        writer,
        "Quartiles of sequence size: {}",
        format_quartiles(&stats.lengths, "", 2)
    )?;
    writeln!(writer, "Max sequence size: {}", stats.lengths.max)?;
    writeln!(
        writer,
        "GC content of all sequences combined: {:.2}%",
        stats.combined_gc * 100.0
    )?;
    writeln!(writer, "Min GC content: {:.2}%", gc.min)?;
    writeln!(
        writer,
        "Quartiles of GC content: {}",
        format_quartiles(&gc, "%", 2)
    )?;
    writeln!(writer, "Max GC content: {:.2}%", gc.max)?;

    match stats.correlation {
        Some(r) => writeln!(writer, "Pearson correlation of length and GC content: {r:.2}")?,
        None => writeln!(writer, "Pearson correlation of length and GC content: undefined")?,
    }

    Ok(())
}

/// Writes codon usage, then codon usage grouped by amino acid.
pub fn write_codon_usage<W: Write>(
    writer: &mut W,
    counts: &HashMap<Codon, usize>,
) -> std::io::Result<()> {
    let mut codons = counts.iter().collect::<Vec<(&Codon, &usize)>>();
    codons.sort_by_key(|(codon, _)| codon_sort_key(*codon));

    writeln!(writer, "Codon usage:")?;
    for (codon, count) in codons {
        writeln!(writer, "{}\t{count}", String::from_utf8_lossy(codon))?;
    }

    let groups = group_by_amino_acid(counts);
    let mut amino_acids = groups.keys().copied().collect::<Vec<u8>>();
    amino_acids.sort_unstable();

    writeln!(writer, "Codon usage by amino acid:")?;
    for aa in amino_acids {
        let usage = groups[&aa]
            .iter()
            .map(|(codon, count)| format!("{}={count}", String::from_utf8_lossy(codon)))
            .collect::<Vec<String>>();
        writeln!(writer, "{}\t{}", aa as char, usage.join(" "))?;
    }

    Ok(())
}

/// Prints statistics for a FASTA file.
///
/// # Arguments
///
/// * `args` - input path (`-` for stdin), codon usage flag, plot directory
///
/// # Example
///
/// ```rust, ignore
/// let args = StatsArgs::parse();
/// run_stats(args)?;
/// ```
pub fn run_stats(args: StatsArgs) -> anyhow::Result<()> {
    log::info!("INFO: reading sequences from {}", args.input.display());
    let records = read_fasta(&args.input)?;

    log::info!("INFO: evaluating stats for {} sequences", records.len());
    let Some((stats, lengths, gcs)) = fasta_stats(&records) else {
        bail!("no sequences found in {}", args.input.display());
    };

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    write_stats(&mut writer, &stats)?;

    if args.codons {
        let counts = codon_frequency(records.iter().map(|r| r.seq.as_slice()));
        write_codon_usage(&mut writer, &counts)?;
    }
    writer.flush()?;

    if let Some(dir) = args.plot_dir {
        std::fs::create_dir_all(&dir)?;
        let gc_percent = gcs.iter().map(|gc| gc * 100.0).collect::<Vec<f64>>();

        plot::length_gc_boxplots(
            &dir.join("lengths_gc_boxplot.svg"),
            &stats.lengths,
            &stats.gc.scaled(100.0),
        )?;
        plot::length_gc_correlation(
            &dir.join("length_gc_correlation.svg"),
            &lengths,
            &gc_percent,
            stats.correlation,
        )?;
        log::info!("INFO: plots written to {}", dir.display());
    }

    Ok(())
}
