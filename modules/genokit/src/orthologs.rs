//! Ortholog detection by reciprocal best hits
//! Alejandro Gonzales-Irribarren, 2025
//!
//! A target proteome is searched against every reference proteome and
//! back with diamond blastp. Protein A of the target and protein B of a
//! reference are called orthologs when B is A's best hit and A is B's
//! best hit. The result is one table row per target protein with its
//! partner in each reference.

use anyhow::{bail, Context};
use hashbrown::HashMap;
use smol_str::SmolStr;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{
    cli::OrthologArgs,
    consts::*,
    fasta::read_fasta,
    utils::{create_writer, file_stem, has_extension, reader},
};

/// Reciprocal best hits of `target` in each reference proteome.
///
/// # Arguments
///
/// * `args` - target proteome, reference directory, diamond options
///
/// # Returns
///
/// Writes `<outdir>/<target>_v_<reference>.tsv` hit tables (unless they
/// are precomputed) and the reciprocal table to `--output`.
///
/// # Example
///
/// ```rust, ignore
/// let args = OrthologArgs::parse();
/// run_orthologs(args)?;
/// ```
pub fn run_orthologs(args: OrthologArgs) -> anyhow::Result<()> {
    if !has_extension(&args.target, &[PROTEOME_EXTENSION]) {
        bail!(
            "only works with .{PROTEOME_EXTENSION} file endings, got {}",
            args.target.display()
        );
    }

    let target_name = file_stem(&args.target)?;
    log::info!("INFO: target -> {target_name}");

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("could not create directory {}", args.outdir.display()))?;

    let references = list_references(&args.proteomes, &args.target)?;
    if references.is_empty() {
        bail!(
            "no reference .{PROTEOME_EXTENSION} files besides the target in {}",
            args.proteomes.display()
        );
    }

    let proteins = read_fasta(&args.target)?
        .into_iter()
        .map(|record| record.id)
        .collect::<Vec<SmolStr>>();
    log::info!("INFO: {} proteins in target", proteins.len());

    let diamond = Diamond::new(&args.diamond, args.diamond_threads);
    let mut names = Vec::with_capacity(references.len());
    let mut pairs = Vec::with_capacity(references.len());

    for reference in references.iter() {
        let reference_name = file_stem(reference)?;

        let forward = args.outdir.join(format!(
            "{target_name}_v_{reference_name}.{MATCHES_EXTENSION}"
        ));
        let reverse = args.outdir.join(format!(
            "{reference_name}_v_{target_name}.{MATCHES_EXTENSION}"
        ));

        if !args.precomputed {
            log::info!("INFO: query target in {reference_name}");
            diamond.blastp(reference, &args.target, &forward)?;

            log::info!("INFO: query {reference_name} in target");
            diamond.blastp(&args.target, reference, &reverse)?;
        }

        let forward_hits = read_matches(&forward, args.evalue)?;
        let reverse_hits = read_matches(&reverse, args.evalue)?;
        let reciprocal = reciprocal_best_hits(&forward_hits, &reverse_hits);

        log::info!(
            "INFO: {} reciprocal best hits between {target_name} and {reference_name}",
            reciprocal.len()
        );

        names.push(reference_name);
        pairs.push(reciprocal);
    }

    let output = args
        .output
        .unwrap_or_else(|| args.outdir.join(RECIPROCAL));
    let mut writer = create_writer(&output)?;
    write_reciprocal(&mut writer, &proteins, &names, &pairs)?;
    writer.flush()?;

    log::info!("INFO: reciprocal table written to {}", output.display());
    Ok(())
}

/// Reference proteomes in `dir`, sorted by name, without the target itself.
pub fn list_references(dir: &Path, target: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let target = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());

    let mut references = std::fs::read_dir(dir)
        .with_context(|| format!("could not read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_extension(path, &[PROTEOME_EXTENSION]))
        .filter(|path| std::fs::canonicalize(path).map_or(true, |p| p != target))
        .collect::<Vec<PathBuf>>();

    references.sort();
    Ok(references)
}

/// Thin wrapper around the diamond executable.
#[derive(Debug, Clone)]
pub struct Diamond {
    bin: String,
    threads: Option<usize>,
}

impl Diamond {
    pub fn new(bin: &str, threads: Option<usize>) -> Self {
        Self {
            bin: bin.to_string(),
            threads,
        }
    }

    /// Runs `diamond blastp` with the default tabular output.
    ///
    /// # Arguments
    ///
    /// * `db` - database or protein FASTA to search in
    /// * `query` - protein FASTA with the queries
    /// * `out` - output table
    pub fn blastp(&self, db: &Path, query: &Path, out: &Path) -> anyhow::Result<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("blastp")
            .arg("-d")
            .arg(db)
            .arg("-q")
            .arg(query)
            .arg("-o")
            .arg(out);

        if let Some(threads) = self.threads {
            cmd.arg("--threads").arg(threads.to_string());
        }

        log::info!("INFO: executing -> {cmd:?}");

        let status = cmd.status().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!(
                    "could not find diamond executable '{}', install it or set {DIAMOND_ENV}",
                    self.bin
                )
            } else {
                anyhow::anyhow!("could not run diamond '{}' -> {e}", self.bin)
            }
        })?;

        if !status.success() {
            bail!(
                "diamond blastp failed for query {} against {} ({status})",
                query.display(),
                db.display()
            );
        }

        Ok(())
    }
}

/// Represents a single row of a diamond/BLAST tabular report.
#[derive(Debug, Clone, PartialEq)]
pub struct BlastRecord {
    pub qseqid: SmolStr,
    pub sseqid: SmolStr,
    pub pident: f32,
    pub evalue: f64,
    pub bitscore: f64,
}

impl BlastRecord {
    /// Creates a new `BlastRecord` from the columns of one report line.
    ///
    /// The expected format is `--outfmt 6` with its default columns:
    ///
    /// qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore
    ///
    /// # Errors
    ///
    /// Fails if there are fewer than 12 columns or a numeric column does
    /// not parse.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let parts = ["p1", "q7", "98.2", "120", "2", "0", "1", "120", "1", "120", "1.1e-80", "240.3"];
    /// let record = BlastRecord::from_parts(&parts)?;
    /// ```
    pub fn from_parts(parts: &[&str]) -> anyhow::Result<Self> {
        if parts.len() < BLAST_TAB_FIELDS {
            bail!(
                "expected {BLAST_TAB_FIELDS} columns, found {} -> {parts:?}",
                parts.len()
            );
        }

        let pident = parts[2]
            .parse::<f32>()
            .with_context(|| format!("failed to parse percent identity from {parts:?}"))?;
        let evalue = parts[10]
            .parse::<f64>()
            .with_context(|| format!("failed to parse e-value from {parts:?}"))?;
        let bitscore = parts[11]
            .trim()
            .parse::<f64>()
            .with_context(|| format!("failed to parse bitscore from {parts:?}"))?;

        Ok(Self {
            qseqid: SmolStr::new(parts[0]),
            sseqid: SmolStr::new(parts[1]),
            pident,
            evalue,
            bitscore,
        })
    }
}

/// Best hit of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub subject: SmolStr,
    pub evalue: f64,
    pub bitscore: f64,
}

/// Reads the best hit of every query from a tabular report.
///
/// # Arguments
///
/// * `path` - diamond `--outfmt 6` report
/// * `max_evalue` - rows with a larger e-value are ignored
///
/// # Returns
///
/// Query id to its highest scoring hit. On equal bitscores the earlier
/// row wins.
pub fn read_matches(path: &Path, max_evalue: f64) -> anyhow::Result<HashMap<SmolStr, Hit>> {
    let contents = reader(path)?;
    parse_matches(&contents, max_evalue).with_context(|| format!("in {}", path.display()))
}

pub fn parse_matches(contents: &str, max_evalue: f64) -> anyhow::Result<HashMap<SmolStr, Hit>> {
    let mut matches: HashMap<SmolStr, Hit> = HashMap::new();

    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let parts = line.split('\t').collect::<Vec<&str>>();
        let record = BlastRecord::from_parts(&parts)
            .with_context(|| format!("malformed hit at line {}", idx + 1))?;

        if record.evalue > max_evalue {
            continue;
        }

        let hit = Hit {
            subject: record.sseqid,
            evalue: record.evalue,
            bitscore: record.bitscore,
        };

        match matches.get_mut(&record.qseqid) {
            Some(best) if best.bitscore >= hit.bitscore => {}
            Some(best) => *best = hit,
            None => {
                matches.insert(record.qseqid, hit);
            }
        }
    }

    Ok(matches)
}

/// Pairs whose best hits point at each other.
///
/// # Arguments
///
/// * `forward` - best hits of target proteins in the reference
/// * `reverse` - best hits of reference proteins in the target
///
/// # Returns
///
/// Target protein to its reciprocal partner in the reference.
pub fn reciprocal_best_hits(
    forward: &HashMap<SmolStr, Hit>,
    reverse: &HashMap<SmolStr, Hit>,
) -> HashMap<SmolStr, SmolStr> {
    forward
        .iter()
        .filter_map(|(protein, hit)| {
            let back = reverse.get(&hit.subject)?;
            (back.subject == *protein).then(|| (protein.clone(), hit.subject.clone()))
        })
        .collect()
}

/// Writes the reciprocal table, one row per target protein.
pub fn write_reciprocal<W: Write>(
    writer: &mut W,
    proteins: &[SmolStr],
    references: &[String],
    pairs: &[HashMap<SmolStr, SmolStr>],
) -> std::io::Result<()> {
    writeln!(writer, "protein\t{}", references.join("\t"))?;

    for protein in proteins {
        let row = pairs
            .iter()
            .map(|pairs| pairs.get(protein).map_or(NO_RECIPROCAL, |p| p.as_str()))
            .collect::<Vec<&str>>();

        writeln!(writer, "{protein}\t{}", row.join("\t"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(q: &str, s: &str, evalue: &str, bitscore: &str) -> String {
        format!("{q}\t{s}\t90.0\t100\t10\t0\t1\t100\t1\t100\t{evalue}\t{bitscore}\n")
    }

    #[test]
    fn test_blast_record_from_parts() {
        let parts = [
            "p1", "q7", "98.2", "120", "2", "0", "1", "120", "1", "120", "1.1e-80", "240.3",
        ];
        let record = BlastRecord::from_parts(&parts).unwrap();

        assert_eq!(record.qseqid, "p1");
        assert_eq!(record.sseqid, "q7");
        assert_eq!(record.evalue, 1.1e-80);
        assert_eq!(record.bitscore, 240.3);
    }

    #[test]
    fn test_blast_record_rejects_short_rows() {
        let parts = ["p1", "q7", "98.2"];
        assert!(BlastRecord::from_parts(&parts).is_err());

        let parts = [
            "p1", "q7", "98.2", "120", "2", "0", "1", "120", "1", "120", "x", "240.3",
        ];
        assert!(BlastRecord::from_parts(&parts).is_err());
    }

    #[test]
    fn test_parse_matches_keeps_highest_bitscore() {
        let contents = [
            row("a", "x", "1e-50", "100"),
            row("a", "y", "1e-60", "150"),
            row("a", "z", "1e-60", "150"),
            row("b", "x", "1e-5", "300"),
            row("c", "w", "0", "80"),
        ]
        .concat();

        let matches = parse_matches(&contents, EVALUE_EPSILON).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches["a"].subject, "y");
        assert_eq!(matches["c"].subject, "w");
        assert!(!matches.contains_key("b"));
    }

    #[test]
    fn test_parse_matches_reports_line() {
        let contents = format!("{}broken\tline\n", row("a", "x", "0", "1"));
        let err = parse_matches(&contents, EVALUE_EPSILON).unwrap_err();

        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_reciprocal_best_hits() {
        let forward = parse_matches(
            &[
                row("a1", "b1", "0", "100"),
                row("a2", "b2", "0", "100"),
                row("a3", "b9", "0", "100"),
            ]
            .concat(),
            EVALUE_EPSILON,
        )
        .unwrap();
        let reverse = parse_matches(
            &[row("b1", "a1", "0", "100"), row("b2", "a3", "0", "100")].concat(),
            EVALUE_EPSILON,
        )
        .unwrap();

        let pairs = reciprocal_best_hits(&forward, &reverse);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs["a1"], "b1");
    }

    #[test]
    fn test_write_reciprocal() {
        let proteins = vec![SmolStr::new("a1"), SmolStr::new("a2")];
        let mut first = HashMap::new();
        first.insert(SmolStr::new("a1"), SmolStr::new("b1"));
        let second = HashMap::new();

        let mut out = Vec::new();
        write_reciprocal(
            &mut out,
            &proteins,
            &["ref1".to_string(), "ref2".to_string()],
            &[first, second],
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "protein\tref1\tref2\na1\tb1\tno reciprocal\na2\tno reciprocal\tno reciprocal\n"
        );
    }

    #[test]
    fn test_list_references_skips_target_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.faa", "a.faa", "notes.txt", "target.faa"] {
            std::fs::write(dir.path().join(name), ">p\nMK\n").unwrap();
        }

        let references = list_references(dir.path(), &dir.path().join("target.faa")).unwrap();
        let names = references
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect::<Vec<String>>();

        assert_eq!(names, vec!["a.faa", "b.faa"]);
    }
}
