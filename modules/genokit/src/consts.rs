//! Constants shared by the genokit tools
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Degenerate codon patterns for translation table 11, the IUPAC
//! ambiguity codes needed to expand them, and the defaults used by the
//! command line.

pub const DIAMOND: &str = "diamond";
pub const DIAMOND_ENV: &str = "GENOKIT_DIAMOND";
pub const PRODIGAL: &str = "prodigal";
pub const PRODIGAL_ENV: &str = "GENOKIT_PRODIGAL";

pub const PROTEOME_EXTENSION: &str = "faa";
pub const FASTA_EXTENSIONS: [&str; 3] = ["fasta", "fa", "fna"];
pub const MATCHES_EXTENSION: &str = "tsv";
pub const RECIPROCAL: &str = "reciprocal.tsv";
pub const NO_RECIPROCAL: &str = "no reciprocal";

// INFO: diamond --outfmt 6 defaults; e-value and bitscore are the last two
pub const BLAST_TAB_FIELDS: usize = 12;
pub const EVALUE_EPSILON: f64 = 1e-20;

pub const WINDOW_LENGTH: usize = 500;
pub const MIN_ORF_CODONS: usize = 30;
pub const PRETTY_BLOCKS: usize = 10;
pub const MAX_PRETTY_BLOCKS: usize = 10_000;
pub const OFFSET_WIDTH: usize = 10;

pub const START_CODON: &[u8; 3] = b"ATG";
pub const STOP_CODONS: [&[u8; 3]; 3] = [b"TAG", b"TGA", b"TAA"];
pub const START_TYPES: [&str; 4] = ["ATG", "GTG", "TTG", "Edge"];
pub const UNKNOWN_AMINO_ACID: u8 = b'X';

/// Literal nucleotides in table order.
pub const NUCLEOTIDES: [u8; 4] = [b'T', b'C', b'A', b'G'];

/// IUPAC codes used by [`CODON_PATTERNS`], expanded in this order.
pub const IUPAC_CODES: [(u8, &[u8]); 4] = [
    (b'N', b"TCAG"),
    (b'R', b"AG"),
    (b'Y', b"TC"),
    (b'H', b"TCA"),
];

/// Translation table 11 (bacterial, archaeal and plant plastid code).
pub const CODON_PATTERNS: [(u8, &[&[u8; 3]]); 21] = [
    // Phenylalanine (F)
    (b'F', &[b"TTY"]),
    // Leucine (L)
    (b'L', &[b"TTR", b"CTN"]),
    // Isoleucine (I)
    (b'I', &[b"ATH"]),
    // Methionine (M) - Start codon
    (b'M', &[b"ATG"]),
    // Valine (V)
    (b'V', &[b"GTN"]),
    // Serine (S)
    (b'S', &[b"TCN", b"AGY"]),
    // Proline (P)
    (b'P', &[b"CCN"]),
    // Threonine (T)
    (b'T', &[b"ACN"]),
    // Alanine (A)
    (b'A', &[b"GCN"]),
    // Tyrosine (Y)
    (b'Y', &[b"TAY"]),
    // Stop codons (*)
    (b'*', &[b"TAR", b"TGA"]),
    // Histidine (H)
    (b'H', &[b"CAY"]),
    // Glutamine (Q)
    (b'Q', &[b"CAR"]),
    // Asparagine (N)
    (b'N', &[b"AAY"]),
    // Lysine (K)
    (b'K', &[b"AAR"]),
    // Aspartic acid (D)
    (b'D', &[b"GAY"]),
    // Glutamic acid (E)
    (b'E', &[b"GAR"]),
    // Cysteine (C)
    (b'C', &[b"TGY"]),
    // Tryptophan (W)
    (b'W', &[b"TGG"]),
    // Arginine (R)
    (b'R', &[b"CGN", b"AGR"]),
    // Glycine (G)
    (b'G', &[b"GGN"]),
];

pub const AMINO_ACID_NAMES: [(u8, &str); 21] = [
    (b'F', "Phenylalanine"),
    (b'L', "Leucine"),
    (b'I', "Isoleucine"),
    (b'M', "Methionine"),
    (b'V', "Valine"),
    (b'S', "Serine"),
    (b'P', "Proline"),
    (b'T', "Threonine"),
    (b'A', "Alanine"),
    (b'Y', "Tyrosine"),
    (b'*', "Stop"),
    (b'H', "Histidine"),
    (b'Q', "Glutamine"),
    (b'N', "Asparagine"),
    (b'K', "Lysine"),
    (b'D', "Aspartic acid"),
    (b'E', "Glutamic acid"),
    (b'C', "Cysteine"),
    (b'W', "Tryptophan"),
    (b'R', "Arginine"),
    (b'G', "Glycine"),
];

pub const MAX_PLOT_POINTS: usize = 10_000;
