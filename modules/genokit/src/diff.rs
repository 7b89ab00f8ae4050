//! Compares getorf and prodigal gene calls
//! Alejandro Gonzales-Irribarren, 2025
//!
//! A gene is identified by its stop position and strand. getorf leaves
//! the stop codon out of its coordinates while prodigal includes it, so
//! getorf stops are shifted by three bases before matching.

use anyhow::{bail, Context};
use hashbrown::{HashMap, HashSet};
use log::info;
use smol_str::SmolStr;

use std::io::{BufWriter, Write};

use crate::{
    cli::DiffArgs,
    genome::{parse_gff, Strand},
    utils::reader,
};

const MISSING_ID: &str = "@";
const MISSING_POS: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: SmolStr,
    pub start: i64,
    pub stop: i64,
    pub strand: Strand,
}

impl Prediction {
    pub fn key(&self) -> (i64, Strand) {
        (self.stop, self.strand)
    }
}

/// Parses a getorf header `>ID [begin - end] ...`.
///
/// # Example
///
/// ```rust, ignore
/// let orf = getorf_header(">chr_1 [301 - 200] (REVERSE SENSE)")?;
/// assert_eq!((orf.start, orf.stop), (301, 197));
/// ```
pub fn getorf_header(line: &str) -> anyhow::Result<Prediction> {
    let parts = line.split_whitespace().collect::<Vec<&str>>();
    if parts.len() < 4 || !parts[1].starts_with('[') || !parts[3].ends_with(']') {
        bail!("expected '>ID [begin - end]', found {line}");
    }

    let id = parts[0].trim_start_matches('>');
    let begin = parts[1][1..]
        .parse::<i64>()
        .with_context(|| format!("failed to parse begin from {line}"))?;
    let end = parts[3][..parts[3].len() - 1]
        .parse::<i64>()
        .with_context(|| format!("failed to parse end from {line}"))?;

    // INFO: getorf omits the stop codon, prodigal does not
    let (stop, strand) = if begin <= end {
        (end + 3, Strand::Forward)
    } else {
        (end - 3, Strand::Reverse)
    };

    Ok(Prediction {
        id: SmolStr::new(id),
        start: begin,
        stop,
        strand,
    })
}

/// Reading frames of a getorf output file, in file order.
pub fn parse_getorf(contents: &str) -> anyhow::Result<Vec<Prediction>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with('>'))
        .map(|(idx, line)| {
            getorf_header(line).with_context(|| format!("malformed header at line {}", idx + 1))
        })
        .collect()
}

/// Genes of a prodigal GFF file, named `<seqid>/<ID>`.
pub fn parse_prodigal(contents: &str) -> anyhow::Result<Vec<Prediction>> {
    Ok(parse_gff(contents)?
        .into_iter()
        .map(|gene| {
            let (start, stop) = match gene.strand {
                Strand::Forward => (gene.begin, gene.end),
                Strand::Reverse => (gene.end, gene.begin),
            };

            Prediction {
                id: SmolStr::new(format!("{}/{}", gene.seqid, gene.id)),
                start: start as i64,
                stop: stop as i64,
                strand: gene.strand,
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffRow {
    pub strand: Strand,
    pub getorf: Option<Prediction>,
    pub prodigal: Option<Prediction>,
}

fn side(prediction: &Option<Prediction>) -> (&str, i64, i64) {
    match prediction {
        Some(p) => (p.id.as_str(), p.start, p.stop),
        None => (MISSING_ID, MISSING_POS, MISSING_POS),
    }
}

impl std::fmt::Display for DiffRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (getorf_id, start_g, stop_g) = side(&self.getorf);
        let (prodigal_id, start_p, stop_p) = side(&self.prodigal);

        write!(
            f,
            "{getorf_id}\t{prodigal_id}\t{}\t{start_g}\t{stop_g}\t{start_p}\t{stop_p}",
            self.strand
        )
    }
}

/// Joins both prediction sets on `(stop, strand)`.
///
/// Rows follow the getorf order, prodigal-only genes come last. When a
/// key repeats within one set the later prediction wins but the row
/// keeps its first position.
pub fn merge(getorf: Vec<Prediction>, prodigal: Vec<Prediction>) -> Vec<DiffRow> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    for p in getorf.iter().chain(prodigal.iter()) {
        if seen.insert(p.key()) {
            order.push(p.key());
        }
    }

    let index = |predictions: Vec<Prediction>| {
        predictions
            .into_iter()
            .map(|p| (p.key(), p))
            .collect::<HashMap<(i64, Strand), Prediction>>()
    };
    let mut getorf = index(getorf);
    let mut prodigal = index(prodigal);

    order
        .into_iter()
        .map(|key| DiffRow {
            strand: key.1,
            getorf: getorf.remove(&key),
            prodigal: prodigal.remove(&key),
        })
        .collect()
}

/// Prints the joined getorf and prodigal predictions.
///
/// # Example
///
/// ```rust, ignore
/// let args = DiffArgs::parse();
/// run_diff(args)?;
/// ```
pub fn run_diff(args: DiffArgs) -> anyhow::Result<()> {
    let getorf = parse_getorf(&reader(&args.getorf)?)
        .with_context(|| format!("in {}", args.getorf.display()))?;
    let prodigal = parse_prodigal(&reader(&args.gff)?)
        .with_context(|| format!("in {}", args.gff.display()))?;

    info!(
        "INFO: {} getorf frames, {} prodigal genes",
        getorf.len(),
        prodigal.len()
    );

    let rows = merge(getorf, prodigal);
    let shared = rows
        .iter()
        .filter(|r| r.getorf.is_some() && r.prodigal.is_some())
        .count();
    info!("INFO: {shared} of {} stops found by both", rows.len());

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    for row in rows.iter() {
        writeln!(writer, "{row}")?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GETORF: &str = ">chr_1 [1 - 297] \nATG\n>chr_2 [700 - 401] (REVERSE SENSE) \nATG\n>chr_3 [900 - 1001] \nATG\n";
    const GFF: &str = "# Sequence Data: seqnum=1\n\
chr\tProdigal_v2.6.3\tCDS\t1\t300\t50.1\t+\t0\tID=1_1;partial=00;start_type=ATG;\n\
chr\tProdigal_v2.6.3\tCDS\t398\t700\t20.0\t-\t0\tID=1_2;partial=00;start_type=GTG;\n\
chr\tProdigal_v2.6.3\tCDS\t1200\t1400\t20.0\t+\t0\tID=1_3;partial=00;start_type=ATG;\n";

    #[test]
    fn test_getorf_header() {
        let orf = getorf_header(">chr_1 [1 - 297] ").unwrap();
        assert_eq!((orf.start, orf.stop, orf.strand), (1, 300, Strand::Forward));

        let orf = getorf_header(">chr_2 [700 - 401] (REVERSE SENSE)").unwrap();
        assert_eq!((orf.start, orf.stop, orf.strand), (700, 398, Strand::Reverse));

        assert!(getorf_header(">chr_2 700 401").is_err());
        assert!(getorf_header(">chr_2 [x - 401]").is_err());
    }

    #[test]
    fn test_parse_prodigal() {
        let genes = parse_prodigal(GFF).unwrap();

        assert_eq!(genes[0].id, "chr/1_1");
        assert_eq!(genes[1].key(), (398, Strand::Reverse));
        assert_eq!(genes[1].start, 700);
    }

    #[test]
    fn test_merge() {
        let rows = merge(parse_getorf(GETORF).unwrap(), parse_prodigal(GFF).unwrap());
        let lines = rows.iter().map(|r| r.to_string()).collect::<Vec<String>>();

        assert_eq!(
            lines,
            vec![
                "chr_1\tchr/1_1\t+\t1\t300\t1\t300",
                "chr_2\tchr/1_2\t-\t700\t398\t700\t398",
                "chr_3\t@\t+\t900\t1004\t-1\t-1",
                "@\tchr/1_3\t+\t-1\t-1\t1200\t1400",
            ]
        );
    }

    #[test]
    fn test_merge_same_stop_other_strand() {
        let forward = getorf_header(">a [1 - 97]").unwrap();
        let reverse = getorf_header(">b [203 - 103]").unwrap();
        assert_eq!(forward.stop, reverse.stop);

        let rows = merge(vec![forward, reverse], vec![]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_diff_row_missing_sides() {
        let orf = getorf_header(">chr_9 [10 - 96]").unwrap();
        let row = DiffRow {
            strand: Strand::Forward,
            getorf: Some(orf),
            prodigal: None,
        };
        assert_eq!(row.to_string(), "chr_9\t@\t+\t10\t99\t-1\t-1");

        let row = DiffRow {
            strand: Strand::Reverse,
            getorf: None,
            prodigal: None,
        };
        assert_eq!(row.to_string(), "@\t@\t-\t-1\t-1\t-1\t-1");
    }

    #[test]
    fn test_parse_getorf_reports_line() {
        let err = parse_getorf(">ok [1 - 3]\nATG\n>broken\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }
}
