//! Helpers shared by the genokit tools
//! Alejandro Gonzales-Irribarren, 2025
//!
//! File handling, strand complements and the handful of descriptive
//! statistics every report needs.

use anyhow::Context;

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Reads the entire content of a file into a `String`.
///
/// # Arguments
///
/// * `file` - The path to the file to read.
///
/// # Returns
///
/// The file's contents, or an error naming the file.
pub fn reader<P: AsRef<Path>>(file: P) -> anyhow::Result<String> {
    let path = file.as_ref();
    let mut file =
        File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("could not read {}", path.display()))?;
    Ok(contents)
}

/// Creates a buffered writer for `file`, `-` writes to stdout.
///
/// An existing file is overwritten.
///
/// # Example
///
/// ```rust, ignore
/// let mut writer = create_writer(Path::new("out/reciprocal.tsv"))?;
/// writeln!(writer, "protein")?;
/// ```
pub fn create_writer(file: &Path) -> anyhow::Result<Box<dyn Write>> {
    if file == Path::new("-") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create directory {}", parent.display()))?;
    }

    let writer = File::create(file)
        .with_context(|| format!("could not create file {}", file.display()))?;

    Ok(Box::new(BufWriter::new(writer)))
}

/// Checks the extension of `path` against `extensions`, case-insensitively.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// File name without its last extension, e.g. `proteomes/ecoli.faa` -> `ecoli`.
pub fn file_stem(path: &Path) -> anyhow::Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("could not get file stem of {}", path.display()))
}

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        // INFO: ambiguity codes and gaps stay as they are
        other => other,
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

pub fn gc_count(seq: &[u8]) -> usize {
    seq.iter()
        .filter(|&&b| matches!(b, b'G' | b'C' | b'g' | b'c'))
        .count()
}

/// Fraction of `G` and `C` in `seq`, `0.0` for an empty sequence.
pub fn gc_content(seq: &[u8]) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }

    gc_count(seq) as f64 / seq.len() as f64
}

/// Percentile with linear interpolation between the closest ranks.
///
/// # Arguments
///
/// * `sorted` - values sorted ascending
/// * `p` - percentile in `[0, 100]`
///
/// # Returns
///
/// `None` for an empty slice.
///
/// # Example
///
/// ```rust, ignore
/// assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 25.0), Some(1.75));
/// ```
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Five-number summary of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            min: *sorted.first()?,
            q1: percentile(&sorted, 25.0)?,
            median: percentile(&sorted, 50.0)?,
            q3: percentile(&sorted, 75.0)?,
            max: *sorted.last()?,
        })
    }

    pub fn values(&self) -> [f64; 5] {
        [self.min, self.q1, self.median, self.q3, self.max]
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            min: self.min * factor,
            q1: self.q1 * factor,
            median: self.median * factor,
            q3: self.q3 * factor,
            max: self.max * factor,
        }
    }
}

/// Pearson correlation coefficient, `None` when undefined.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x * var_y).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 25.0), Some(1.75));
        assert_eq!(percentile(&values, 50.0), Some(2.5));
        assert_eq!(percentile(&values, 100.0), Some(4.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_summary_from_unsorted_values() {
        let summary = Summary::from_values(&[100.0, 200.0, 150.0, 120.0, 180.0]).unwrap();

        assert_eq!(summary.min, 100.0);
        assert_eq!(summary.q1, 120.0);
        assert_eq!(summary.median, 150.0);
        assert_eq!(summary.q3, 180.0);
        assert_eq!(summary.max, 200.0);
        assert!(Summary::from_values(&[]).is_none());
    }

    #[test]
    fn test_gc_content() {
        assert_eq!(gc_content(b"GGCC"), 1.0);
        assert_eq!(gc_content(b"ATgc"), 0.5);
        assert_eq!(gc_content(b"ATNN"), 0.0);
        assert_eq!(gc_content(b""), 0.0);
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ATGCN"), b"NGCAT");
        assert_eq!(reverse_complement(b"aacg"), b"cgtt");
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let r = pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let r = pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);

        assert_eq!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_extensions_and_stems() {
        assert!(has_extension(Path::new("a/b.FAA"), &["faa"]));
        assert!(!has_extension(Path::new("a/b.fasta.gz"), &["fasta"]));
        assert!(!has_extension(Path::new("noext"), &["faa"]));
        assert_eq!(file_stem(Path::new("proteomes/ecoli.faa")).unwrap(), "ecoli");
    }
}
