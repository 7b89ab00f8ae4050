//! Genome statistics from prodigal gene predictions
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Each input holds one genome sequence. Genes are predicted by the
//! external `prodigal` executable; everything after that (lengths, GC,
//! coding density, start codons and codon usage) is computed here.

use anyhow::{bail, Context};
use hashbrown::HashMap;
use log::{info, warn};
use rayon::prelude::*;
use smol_str::SmolStr;

use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::Command;

use crate::{
    cli::GenomeArgs,
    code::{Codon, CODE},
    consts::*,
    fasta::read_fasta,
    frames::frames,
    stats::codon_frequency,
    utils::{file_stem, gc_content, reverse_complement, Summary},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_gff(value: &str) -> anyhow::Result<Self> {
        match value {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => bail!("invalid strand '{other}'"),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// A gene predicted by prodigal, 1-based and inclusive on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    pub seqid: SmolStr,
    pub id: SmolStr,
    pub begin: usize,
    pub end: usize,
    pub strand: Strand,
    pub start_type: SmolStr,
}

impl Gene {
    /// Parses one GFF feature line.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let line = "chr\tProdigal_v2.6.3\tCDS\t3\t11\t1.2\t+\t0\tID=1_1;partial=00;start_type=ATG;";
    /// let gene = Gene::from_gff(line)?;
    /// assert_eq!(gene.len(), 9);
    /// ```
    pub fn from_gff(line: &str) -> anyhow::Result<Self> {
        let fields = line.trim_end().split('\t').collect::<Vec<&str>>();
        if fields.len() < 9 {
            bail!("expected 9 GFF columns, found {} -> {line}", fields.len());
        }

        let begin = fields[3]
            .parse::<usize>()
            .with_context(|| format!("failed to parse begin from {line}"))?;
        let end = fields[4]
            .parse::<usize>()
            .with_context(|| format!("failed to parse end from {line}"))?;
        let strand = Strand::from_gff(fields[6])?;

        let attribute = |key: &str| {
            fields[8]
                .split(';')
                .find_map(|kv| kv.trim().strip_prefix(key))
                .map(SmolStr::new)
        };

        Ok(Self {
            seqid: SmolStr::new(fields[0]),
            id: attribute("ID=").unwrap_or_default(),
            begin,
            end,
            strand,
            start_type: attribute("start_type=").unwrap_or_default(),
        })
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.begin
    }

    /// Coding sequence of the gene, reverse complemented on the minus strand.
    pub fn sequence(&self, genome: &[u8]) -> anyhow::Result<Vec<u8>> {
        if self.begin == 0 || self.begin > self.end || self.end > genome.len() {
            bail!(
                "gene {} at {}..{} lies outside of a genome of length {}",
                self.id,
                self.begin,
                self.end,
                genome.len()
            );
        }

        let seq = &genome[self.begin - 1..self.end];
        Ok(match self.strand {
            Strand::Forward => seq.to_vec(),
            Strand::Reverse => reverse_complement(seq),
        })
    }
}

/// Genes of a prodigal GFF file, comment lines skipped.
pub fn parse_gff(contents: &str) -> anyhow::Result<Vec<Gene>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(idx, line)| {
            Gene::from_gff(line).with_context(|| format!("malformed GFF row at line {}", idx + 1))
        })
        .collect()
}

/// Thin wrapper around the prodigal executable.
#[derive(Debug, Clone)]
pub struct Prodigal {
    bin: String,
}

impl Prodigal {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }

    /// Predicts genes of `fasta` and returns the GFF text.
    ///
    /// # Arguments
    ///
    /// * `fasta` - genome in FASTA format
    /// * `gff` - keep the GFF at this path, otherwise it is read from stdout
    pub fn predict(&self, fasta: &Path, gff: Option<&Path>) -> anyhow::Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-i").arg(fasta).arg("-f").arg("gff").arg("-q");
        if let Some(gff) = gff {
            cmd.arg("-o").arg(gff);
        }

        info!("INFO: executing -> {cmd:?}");

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!(
                    "could not find prodigal executable '{}', install it or set {PRODIGAL_ENV}",
                    self.bin
                )
            } else {
                anyhow::anyhow!("could not run prodigal '{}' -> {e}", self.bin)
            }
        })?;

        if !output.status.success() {
            bail!(
                "prodigal failed for {} ({}) -> {}",
                fasta.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        match gff {
            Some(gff) => crate::utils::reader(gff),
            None => String::from_utf8(output.stdout).context("prodigal wrote invalid UTF-8"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NucleotideCount {
    pub a: usize,
    pub t: usize,
    pub c: usize,
    pub g: usize,
    pub n: usize,
    pub other: usize,
}

pub fn nucleotide_count(seq: &[u8]) -> NucleotideCount {
    let mut count = NucleotideCount::default();
    for base in seq {
        match base.to_ascii_uppercase() {
            b'A' => count.a += 1,
            b'T' => count.t += 1,
            b'C' => count.c += 1,
            b'G' => count.g += 1,
            b'N' => count.n += 1,
            _ => count.other += 1,
        }
    }
    count
}

/// Fractions of the 64 literal codons in table order.
///
/// Codons with ambiguous bases are not counted. All zeros when no
/// literal codon was seen.
pub fn codon_usage(counts: &HashMap<Codon, usize>) -> Vec<(Codon, f64)> {
    let total = CODE
        .entries()
        .iter()
        .map(|(codon, _)| counts.get(codon).copied().unwrap_or(0))
        .sum::<usize>();

    CODE.entries()
        .iter()
        .map(|(codon, _)| {
            let count = counts.get(codon).copied().unwrap_or(0);
            let fraction = if total > 0 {
                count as f64 / total as f64
            } else {
                0.0
            };
            (*codon, fraction)
        })
        .collect()
}

/// Codons of all six frames of `seq`.
pub fn six_frame_codon_counts(seq: &[u8]) -> HashMap<Codon, usize> {
    let mut counts = HashMap::new();
    for frame in frames(seq).iter() {
        for (_, codon) in frame {
            *counts.entry(*codon).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenomeStats {
    pub id: SmolStr,
    pub genome_length: usize,
    pub genes_total_length: usize,
    pub gene_count: usize,
    pub gene_lengths: Summary,
    pub genome_gc: f64,
    pub gene_gc: Summary,
    /// Total gene length over both strands of the genome.
    pub coding_density: f64,
    /// Counts of ATG, GTG, TTG and Edge starts.
    pub start_codons: [usize; 4],
    pub genome_codons: Vec<(Codon, f64)>,
    pub gene_codons: Vec<(Codon, f64)>,
}

impl GenomeStats {
    /// Computes the statistics of a genome and its genes.
    ///
    /// # Arguments
    ///
    /// * `id` - genome identifier
    /// * `genome` - upper case genome sequence
    /// * `genes` - genes predicted on `genome`
    ///
    /// # Returns
    ///
    /// An error when there are no genes or a gene lies outside the genome.
    pub fn new(id: SmolStr, genome: &[u8], genes: &[Gene]) -> anyhow::Result<Self> {
        if genes.is_empty() {
            bail!("no genes found in {id}");
        }

        let sequences = genes
            .iter()
            .map(|gene| gene.sequence(genome))
            .collect::<anyhow::Result<Vec<Vec<u8>>>>()?;

        let lengths = genes.iter().map(|g| g.len() as f64).collect::<Vec<f64>>();
        let genes_total_length = genes.iter().map(Gene::len).sum::<usize>();
        let gcs = sequences
            .par_iter()
            .map(|seq| gc_content(seq))
            .collect::<Vec<f64>>();

        let mut start_codons = [0; 4];
        for gene in genes {
            match START_TYPES.iter().position(|&t| gene.start_type == t) {
                Some(idx) => start_codons[idx] += 1,
                None => warn!(
                    "WARN: unknown start type '{}' of gene {}",
                    gene.start_type, gene.id
                ),
            }
        }

        let genome_counts = six_frame_codon_counts(genome);
        let gene_counts = codon_frequency(sequences.iter().map(|s| s.as_slice()));

        Ok(Self {
            id,
            genome_length: genome.len(),
            genes_total_length,
            gene_count: genes.len(),
            gene_lengths: Summary::from_values(&lengths).context("no gene lengths")?,
            genome_gc: gc_content(genome),
            gene_gc: Summary::from_values(&gcs).context("no gene GC values")?,
            coding_density: genes_total_length as f64 / (2 * genome.len().max(1)) as f64,
            start_codons,
            genome_codons: codon_usage(&genome_counts),
            gene_codons: codon_usage(&gene_counts),
        })
    }

    /// Column names matching [`GenomeStats::row`].
    pub fn header() -> Vec<String> {
        let mut header = [
            "id",
            "genome_length",
            "genes_total_length",
            "gene_count",
            "length_min",
            "length_q1",
            "length_median",
            "length_q3",
            "length_max",
            "genome_gc",
            "gc_min",
            "gc_q1",
            "gc_median",
            "gc_q3",
            "gc_max",
            "coding_density",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

        header.extend(START_TYPES.iter().map(|t| format!("start_{t}")));
        for prefix in ["genome", "genes"] {
            header.extend(
                CODE.entries()
                    .iter()
                    .map(|(codon, _)| format!("{prefix}_{}", String::from_utf8_lossy(codon))),
            );
        }

        header
    }

    pub fn row(&self) -> Vec<String> {
        let mut row = vec![
            self.id.to_string(),
            self.genome_length.to_string(),
            self.genes_total_length.to_string(),
            self.gene_count.to_string(),
        ];

        row.extend(self.gene_lengths.values().iter().map(|v| v.to_string()));
        row.push(self.genome_gc.to_string());
        row.extend(self.gene_gc.values().iter().map(|v| v.to_string()));
        row.push(self.coding_density.to_string());
        row.extend(self.start_codons.iter().map(|c| c.to_string()));
        row.extend(self.genome_codons.iter().map(|(_, f)| f.to_string()));
        row.extend(self.gene_codons.iter().map(|(_, f)| f.to_string()));

        row
    }

    /// Logs a human-readable summary.
    pub fn log_summary(&self) {
        let lengths = &self.gene_lengths;
        let gc = self.gene_gc.scaled(100.0);

        info!("Length of genome: {}", self.genome_length);
        info!("Total length of all genes: {} bases", self.genes_total_length);
        info!("Number of genes: {}", self.gene_count);
        info!(
            "Gene length min/quartiles/max: {}, {}, {}, {}, {}",
            lengths.min, lengths.q1, lengths.median, lengths.q3, lengths.max
        );
        info!("Whole genome GC content: {:.4}%", self.genome_gc * 100.0);
        info!(
            "Gene GC min/quartiles/max: {:.4}%, {:.4}%, {:.4}%, {:.4}%, {:.4}%",
            gc.min, gc.q1, gc.median, gc.q3, gc.max
        );
        info!("Coding density: {:.4}%", self.coding_density * 100.0);

        let starts = START_TYPES
            .iter()
            .zip(self.start_codons.iter())
            .map(|(t, c)| (*t, *c))
            .collect::<Vec<(&str, usize)>>();
        info!("Start codon distribution: {}", distribution(starts));

        let usages = [
            ("whole genome", &self.genome_codons),
            ("genes", &self.gene_codons),
        ];
        for (label, usage) in usages {
            let codons = usage
                .iter()
                .map(|(codon, f)| (String::from_utf8_lossy(codon).to_string(), *f))
                .collect::<Vec<(String, f64)>>();
            info!("Codon distribution {label}: {}", fractions(codons));
        }
    }
}

/// `name: pct%` pairs, most frequent first.
fn distribution(counts: Vec<(&str, usize)>) -> String {
    let total = counts.iter().map(|(_, c)| c).sum::<usize>().max(1);
    fractions(
        counts
            .into_iter()
            .map(|(name, c)| (name.to_string(), c as f64 / total as f64))
            .collect(),
    )
}

fn fractions(mut values: Vec<(String, f64)>) -> String {
    values.sort_by(|a, b| b.1.total_cmp(&a.1));
    values
        .iter()
        .map(|(name, f)| format!("{name}: {:.4}%", f * 100.0))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Prints one row of genome statistics per FASTA file.
///
/// # Arguments
///
/// * `args` - genome files, prodigal executable, GFF directory
///
/// # Example
///
/// ```rust, ignore
/// let args = GenomeArgs::parse();
/// run_genome(args)?;
/// ```
pub fn run_genome(args: GenomeArgs) -> anyhow::Result<()> {
    let prodigal = Prodigal::new(&args.prodigal);

    if let Some(dir) = &args.outdir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create directory {}", dir.display()))?;
    }

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    if args.header {
        writeln!(writer, "{}", GenomeStats::header().join("\t"))?;
    }

    for file in args.files.iter() {
        info!("INFO: reading fasta from {}", file.display());
        let mut records = read_fasta(file)?;

        // TODO: accept multi-contig assemblies and pool genes across contigs
        if records.len() != 1 {
            bail!(
                "expected exactly one sequence in {}, found {}",
                file.display(),
                records.len()
            );
        }
        let mut record = records.remove(0);
        record.seq.make_ascii_uppercase();

        let counts = nucleotide_count(&record.seq);
        if counts.other > 0 {
            warn!(
                "WARN: {} bases of {} are not A, C, G, T or N",
                counts.other, record.id
            );
        }

        info!("INFO: finding genes in {}", record.id);
        let gff = args
            .outdir
            .as_ref()
            .map(|dir| file_stem(file).map(|stem| dir.join(format!("{stem}.gff"))))
            .transpose()?;
        let genes = parse_gff(&prodigal.predict(file, gff.as_deref())?)?;

        info!("INFO: calculating statistics for {} genes", genes.len());
        let stats = GenomeStats::new(record.id.clone(), &record.seq, &genes)?;
        stats.log_summary();

        writeln!(writer, "{}", stats.row().join("\t"))?;
    }

    writer.flush()?;
    Ok(())
}
