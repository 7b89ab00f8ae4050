//! FASTA reader
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Records are kept in file order. A header line starts with `>`; the id
//! is everything up to the first whitespace and the sequence is every
//! following line up to the next header, with line breaks removed.

use anyhow::Context;
use hashbrown::HashMap;
use log::warn;
use memchr::memchr;
use memmap2::Mmap;
use smol_str::SmolStr;

use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: SmolStr,
    pub description: String,
    pub seq: Vec<u8>,
}

impl FastaRecord {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Reads every record of a FASTA file.
///
/// # Arguments
///
/// * `path` - path to the FASTA file, `-` reads from stdin
///
/// # Returns
///
/// The records in file order. An empty file yields no records.
///
/// # Example
///
/// ```rust, ignore
/// let records = read_fasta("genome.fna")?;
/// println!("{} -> {} bases", records[0].id, records[0].len());
/// ```
pub fn read_fasta<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<FastaRecord>> {
    let path = path.as_ref();

    if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("could not read FASTA from stdin")?;
        return Ok(parse_fasta(&data));
    }

    let file =
        File::open(path).with_context(|| format!("could not open {}", path.display()))?;

    // INFO: mapping a zero-length file fails on some platforms
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }

    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("could not map {}", path.display()))?;

    Ok(parse_fasta(mmap.as_ref()))
}

/// Parses FASTA records from a buffer.
///
/// Sequence lines before the first header are dropped. A header whose id
/// was already seen resets that record, which keeps its original position.
pub fn parse_fasta(data: &[u8]) -> Vec<FastaRecord> {
    let mut records: Vec<FastaRecord> = Vec::new();
    let mut index: HashMap<SmolStr, usize> = HashMap::new();
    let mut current: Option<usize> = None;
    let mut orphans = 0;

    let mut pos = 0;
    while pos < data.len() {
        let end = memchr(b'\n', &data[pos..]).map_or(data.len(), |e| pos + e);
        let line = data[pos..end].trim_ascii();
        pos = end + 1;

        if line.is_empty() {
            continue;
        }

        if line[0] == b'>' {
            let description = String::from_utf8_lossy(&line[1..]).trim().to_string();
            let id = SmolStr::new(description.split_whitespace().next().unwrap_or(""));

            match index.get(&id) {
                Some(&idx) => {
                    warn!("WARN: duplicate FASTA id {id}, replacing earlier sequence");
                    records[idx].seq.clear();
                    records[idx].description = description;
                    current = Some(idx);
                }
                None => {
                    index.insert(id.clone(), records.len());
                    current = Some(records.len());
                    records.push(FastaRecord {
                        id,
                        description,
                        seq: Vec::new(),
                    });
                }
            }
        } else {
            match current {
                Some(idx) => records[idx].seq.extend_from_slice(line),
                None => orphans += line.len(),
            }
        }
    }

    if orphans > 0 {
        warn!("WARN: sequence without header, ignoring {orphans} leading bases");
    }

    records
}
