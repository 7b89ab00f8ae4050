//! Codon to amino acid translation
//! Alejandro Gonzales-Irribarren, 2025
//!
//! The table is not spelled out codon by codon. It is built once from the
//! degenerate patterns in [`CODON_PATTERNS`] by substituting every IUPAC
//! ambiguity code with the bases it stands for, and checked to cover the
//! 64 literal codons exactly once.

use hashbrown::HashMap;

use std::io::{BufWriter, Write};
use std::sync::LazyLock;

use crate::{cli::CodeArgs, consts::*};

pub type Codon = [u8; 3];

/// Translation table 11, built on first use.
pub static CODE: LazyLock<CodonTable> = LazyLock::new(|| {
    CodonTable::new(&CODON_PATTERNS, &IUPAC_CODES)
        .unwrap_or_else(|e| panic!("ERROR: built-in codon table is invalid -> {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodonTableError {
    UnknownBase { codon: String, amino_acid: char },
    Duplicate { codon: String, first: char, second: char },
    Missing { codon: String },
}

impl std::fmt::Display for CodonTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodonTableError::UnknownBase { codon, amino_acid } => write!(
                f,
                "pattern for {amino_acid} expands to {codon}, which is not a literal codon"
            ),
            CodonTableError::Duplicate {
                codon,
                first,
                second,
            } => write!(f, "codon {codon} is assigned to both {first} and {second}"),
            CodonTableError::Missing { codon } => {
                write!(f, "codon {codon} is not covered by any pattern")
            }
        }
    }
}

impl std::error::Error for CodonTableError {}

/// Expanded codon table, kept in [`codon_sort_key`] order.
#[derive(Debug, Clone)]
pub struct CodonTable {
    entries: Vec<(Codon, u8)>,
    lookup: [u8; 64],
}

impl CodonTable {
    /// Builds a table from degenerate patterns.
    ///
    /// # Arguments
    ///
    /// * `patterns` - amino acid to codon patterns, e.g. `(b'L', &[b"TTR", b"CTN"])`
    /// * `iupac` - ambiguity codes and the bases they expand to
    ///
    /// # Returns
    ///
    /// The table, or the first inconsistency found while expanding.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let table = CodonTable::new(&CODON_PATTERNS, &IUPAC_CODES)?;
    /// assert_eq!(table.get(b"CTG"), Some(b'L'));
    /// ```
    pub fn new(
        patterns: &[(u8, &[&Codon])],
        iupac: &[(u8, &[u8])],
    ) -> Result<Self, CodonTableError> {
        let entries = expand_codons(patterns, iupac)?;

        let mut lookup = [UNKNOWN_AMINO_ACID; 64];
        for (codon, aa) in entries.iter() {
            // INFO: expand_codons only lets literal codons through
            if let Some(idx) = codon_index(codon) {
                lookup[idx] = *aa;
            }
        }

        Ok(Self { entries, lookup })
    }

    pub fn get(&self, codon: &[u8]) -> Option<u8> {
        codon_index(codon).map(|idx| self.lookup[idx])
    }

    pub fn entries(&self) -> &[(Codon, u8)] {
        &self.entries
    }

    /// Codons coding for `aa`, in table order.
    pub fn codons_for(&self, aa: u8) -> impl Iterator<Item = &Codon> + '_ {
        self.entries
            .iter()
            .filter(move |(_, other)| *other == aa)
            .map(|(codon, _)| codon)
    }
}

fn base_index(base: u8) -> Option<usize> {
    NUCLEOTIDES.iter().position(|&b| b == base)
}

fn codon_index(codon: &[u8]) -> Option<usize> {
    if codon.len() != 3 {
        return None;
    }

    let mut idx = 0;
    for &base in codon {
        idx = idx * 4 + base_index(base)?;
    }

    Some(idx)
}

/// Sort key placing codons in textbook table order.
///
/// Bases are ranked T < C < A < G. Codons are ordered by their second
/// base, then their first, then their third.
///
/// # Example
///
/// ```rust, ignore
/// let mut codons = vec![*b"CTT", *b"TCT", *b"TTT"];
/// codons.sort_by_key(|c| codon_sort_key(c));
/// assert_eq!(codons, vec![*b"TTT", *b"CTT", *b"TCT"]);
/// ```
pub fn codon_sort_key(codon: &[u8]) -> [u8; 3] {
    let rank = |base: Option<&u8>| match base {
        Some(&b) => base_index(b).map_or(b, |idx| b'A' + idx as u8),
        None => 0,
    };

    [rank(codon.get(1)), rank(codon.get(0)), rank(codon.get(2))]
}

fn expand_pattern(pattern: &Codon, iupac: &[(u8, &[u8])]) -> Vec<Codon> {
    let mut codons = vec![*pattern];

    for (code, replacements) in iupac {
        let mut expanded = Vec::with_capacity(codons.len() * replacements.len());
        while let Some(codon) = codons.pop() {
            match codon.iter().position(|b| b == code) {
                Some(idx) => {
                    for &replacement in replacements.iter() {
                        let mut next = codon;
                        next[idx] = replacement;
                        // INFO: the same code may appear twice in one pattern
                        codons.push(next);
                    }
                }
                None => expanded.push(codon),
            }
        }
        codons = expanded;
    }

    codons
}

/// Expands degenerate patterns into the 64 literal codons.
///
/// # Arguments
///
/// * `patterns` - amino acid to codon patterns
/// * `iupac` - ambiguity codes and the bases they expand to
///
/// # Returns
///
/// `(codon, amino acid)` pairs sorted by [`codon_sort_key`].
///
/// # Errors
///
/// * a pattern expands to something other than `T`, `C`, `A`, `G`
/// * a codon is produced by two patterns
/// * a literal codon is not produced at all
pub fn expand_codons(
    patterns: &[(u8, &[&Codon])],
    iupac: &[(u8, &[u8])],
) -> Result<Vec<(Codon, u8)>, CodonTableError> {
    let mut code: HashMap<Codon, u8> = HashMap::with_capacity(64);

    for (aa, codon_patterns) in patterns {
        for pattern in codon_patterns.iter() {
            for codon in expand_pattern(pattern, iupac) {
                if codon_index(&codon).is_none() {
                    return Err(CodonTableError::UnknownBase {
                        codon: String::from_utf8_lossy(&codon).into_owned(),
                        amino_acid: *aa as char,
                    });
                }

                if let Some(first) = code.insert(codon, *aa) {
                    return Err(CodonTableError::Duplicate {
                        codon: String::from_utf8_lossy(&codon).into_owned(),
                        first: first as char,
                        second: *aa as char,
                    });
                }
            }
        }
    }

    for a in NUCLEOTIDES {
        for b in NUCLEOTIDES {
            for c in NUCLEOTIDES {
                if !code.contains_key(&[a, b, c]) {
                    return Err(CodonTableError::Missing {
                        codon: String::from_utf8_lossy(&[a, b, c]).into_owned(),
                    });
                }
            }
        }
    }

    let mut entries = code.into_iter().collect::<Vec<(Codon, u8)>>();
    entries.sort_by_key(|(codon, _)| codon_sort_key(codon));

    Ok(entries)
}

pub fn translate_codon(codon: &[u8]) -> Option<u8> {
    CODE.get(codon)
}

pub fn translate_or_x(codon: &[u8]) -> u8 {
    translate_codon(codon).unwrap_or(UNKNOWN_AMINO_ACID)
}

/// Translates every complete codon of `sequence`, `X` for unknown codons.
///
/// # Example
///
/// ```rust, ignore
/// assert_eq!(translate(b"ATGGCNTAAG"), "MX*");
/// ```
pub fn translate(sequence: &[u8]) -> String {
    sequence
        .chunks_exact(3)
        .map(|codon| translate_or_x(codon) as char)
        .collect()
}

pub fn amino_acid_name(aa: u8) -> Option<&'static str> {
    AMINO_ACID_NAMES
        .iter()
        .find(|(code, _)| *code == aa)
        .map(|(_, name)| *name)
}

/// Prints the expanded codon table.
pub fn run_code(args: CodeArgs) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    write_code(&mut writer, args.by_amino_acid)?;
    writer.flush()?;

    Ok(())
}

pub fn write_code<W: Write>(writer: &mut W, by_amino_acid: bool) -> std::io::Result<()> {
    if by_amino_acid {
        for (aa, _) in CODON_PATTERNS.iter() {
            let codons = CODE
                .codons_for(*aa)
                .map(|codon| String::from_utf8_lossy(codon).into_owned())
                .collect::<Vec<String>>();

            writeln!(
                writer,
                "{}\t{}\t{}",
                *aa as char,
                amino_acid_name(*aa).unwrap_or("Unknown"),
                codons.join(",")
            )?;
        }
    } else {
        for (codon, aa) in CODE.entries() {
            writeln!(
                writer,
                "{}\t{}\t{}",
                String::from_utf8_lossy(codon),
                *aa as char,
                amino_acid_name(*aa).unwrap_or("Unknown")
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_all_codons_once() {
        let entries = CODE.entries();
        assert_eq!(entries.len(), 64);

        let mut codons = entries.iter().map(|(c, _)| *c).collect::<Vec<Codon>>();
        codons.dedup();
        assert_eq!(codons.len(), 64);
    }

    #[test]
    fn test_table_is_in_textbook_order() {
        let first = CODE
            .entries()
            .iter()
            .take(6)
            .map(|(c, aa)| (String::from_utf8_lossy(c).into_owned(), *aa as char))
            .collect::<Vec<(String, char)>>();

        assert_eq!(
            first,
            vec![
                ("TTT".to_string(), 'F'),
                ("TTC".to_string(), 'F'),
                ("TTA".to_string(), 'L'),
                ("TTG".to_string(), 'L'),
                ("CTT".to_string(), 'L'),
                ("CTC".to_string(), 'L'),
            ]
        );

        let (last, aa) = CODE.entries()[63];
        assert_eq!(&last, b"GGG");
        assert_eq!(aa, b'G');
    }

    #[test]
    fn test_translate_codon_table_11() {
        assert_eq!(translate_codon(b"ATG"), Some(b'M'));
        assert_eq!(translate_codon(b"ATA"), Some(b'I'));
        assert_eq!(translate_codon(b"TGA"), Some(b'*'));
        assert_eq!(translate_codon(b"TAG"), Some(b'*'));
        assert_eq!(translate_codon(b"AGA"), Some(b'R'));
        assert_eq!(translate_codon(b"AGC"), Some(b'S'));
        assert_eq!(translate_codon(b"TGG"), Some(b'W'));
    }

    #[test]
    fn test_translate_codon_rejects_non_literal() {
        assert_eq!(translate_codon(b"atg"), None);
        assert_eq!(translate_codon(b"ANG"), None);
        assert_eq!(translate_codon(b"AT"), None);
        assert_eq!(translate_or_x(b"NNN"), b'X');
    }

    #[test]
    fn test_translate_ignores_partial_codon() {
        assert_eq!(translate(b"ATGGCNTAAG"), "MX*");
        assert_eq!(translate(b""), "");
    }

    #[test]
    fn test_codon_sort_key_orders_second_base_first() {
        let mut codons = vec![*b"GCA", *b"CTT", *b"TCT", *b"TTT", *b"AGG"];
        codons.sort_by_key(|c| codon_sort_key(c));

        assert_eq!(
            codons,
            vec![*b"TTT", *b"CTT", *b"TCT", *b"GCA", *b"AGG"]
        );
    }

    #[test]
    fn test_expand_codons_detects_duplicates() {
        let patterns: [(u8, &[&Codon]); 2] = [(b'F', &[b"TTN"]), (b'L', &[b"TTR"])];
        let err = expand_codons(&patterns, &IUPAC_CODES).unwrap_err();

        assert!(matches!(err, CodonTableError::Duplicate { .. }));
    }

    #[test]
    fn test_expand_codons_detects_gaps() {
        let patterns: [(u8, &[&Codon]); 1] = [(b'F', &[b"TTY"])];
        let err = expand_codons(&patterns, &IUPAC_CODES).unwrap_err();

        assert_eq!(
            err,
            CodonTableError::Missing {
                codon: "TTA".to_string()
            }
        );
    }

    #[test]
    fn test_expand_pattern_handles_repeated_codes() {
        let mut codons = expand_pattern(b"NNA", &IUPAC_CODES);
        codons.sort();

        assert_eq!(codons.len(), 16);
        assert!(codons.iter().all(|c| c[2] == b'A'));
    }

    #[test]
    fn test_codons_for_amino_acid() {
        let stops = CODE.codons_for(b'*').copied().collect::<Vec<Codon>>();
        assert_eq!(stops, vec![*b"TAA", *b"TAG", *b"TGA"]);
        assert_eq!(amino_acid_name(b'*'), Some("Stop"));
        assert_eq!(amino_acid_name(b'Z'), None);
    }

    #[test]
    fn test_write_code_by_amino_acid() {
        let mut out = Vec::new();
        write_code(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 21);
        assert!(text.lines().any(|l| l == "M\tMethionine\tATG"));
    }
}
