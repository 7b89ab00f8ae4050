//! Six-frame codon views of a nucleotide sequence
//! Alejandro Gonzales-Irribarren, 2025
//!
//! A frame is a list of `(position, codon)` pairs. Forward frames start
//! at offsets 0, 1 and 2 and report the position of the first base of
//! each codon; their complementary frames run in the opposite direction
//! and report the position of the codon's last forward base, which is
//! where the codon starts on the reverse strand.

use std::io::{BufWriter, Write};

use crate::{
    cli::OrfArgs,
    code::{translate, Codon},
    consts::*,
    fasta::read_fasta,
    utils::complement,
};

pub type Frame = Vec<(usize, Codon)>;

/// Complete codons of `seq`, positions shifted by `offset`.
pub fn codons(seq: &[u8], offset: usize) -> Frame {
    seq.chunks_exact(3)
        .enumerate()
        .map(|(i, c)| (offset + i * 3, [c[0], c[1], c[2]]))
        .collect()
}

/// Reverse complement of a forward frame.
///
/// # Example
///
/// ```rust, ignore
/// let forward = codons(b"ATGAAA", 0);
/// assert_eq!(complementary_frame(&forward), vec![(5, *b"TTT"), (2, *b"CAT")]);
/// ```
pub fn complementary_frame(frame: &[(usize, Codon)]) -> Frame {
    frame
        .iter()
        .rev()
        .map(|(i, c)| (i + 2, [complement(c[2]), complement(c[1]), complement(c[0])]))
        .collect()
}

/// The three forward frames followed by their complementary frames.
pub fn frames(seq: &[u8]) -> [Frame; 6] {
    let f0 = codons(seq, 0);
    let f1 = codons(seq.get(1..).unwrap_or_default(), 1);
    let f2 = codons(seq.get(2..).unwrap_or_default(), 2);

    let r0 = complementary_frame(&f0);
    let r1 = complementary_frame(&f1);
    let r2 = complementary_frame(&f2);

    [f0, f1, f2, r0, r1, r2]
}

/// Start/stop codon index pairs of a frame.
///
/// Every `ATG` is paired with the first stop codon at or after it, so
/// nested start codons share their stop. Starts without a downstream
/// stop are not reported.
pub fn reading_frames(frame: &[(usize, Codon)]) -> Vec<(usize, usize)> {
    let mut next_stop = None;
    let mut orfs = Vec::new();

    for (idx, (_, codon)) in frame.iter().enumerate().rev() {
        if STOP_CODONS.contains(&codon) {
            next_stop = Some(idx);
        }

        if codon == START_CODON {
            if let Some(stop) = next_stop {
                orfs.push((idx, stop));
            }
        }
    }

    orfs.reverse();
    orfs
}

/// Lists long ATG..stop reading frames over all six frames of every record.
///
/// # Arguments
///
/// * `args` - input FASTA, minimum span in codons and output mode
///
/// # Example
///
/// ```rust, ignore
/// let args = OrfArgs::parse();
/// run_orfs(args)?;
/// ```
pub fn run_orfs(args: OrfArgs) -> anyhow::Result<()> {
    let records = read_fasta(&args.fasta)?;
    log::info!("INFO: scanning {} records for ORFs", records.len());

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    for record in records.iter() {
        writeln!(writer, ">{}", record.id)?;
        let count = write_orfs(&mut writer, &record.seq, args.min_codons, args.translate)?;
        log::info!("INFO: {} -> {count} ORFs", record.id);
    }

    writer.flush()?;
    Ok(())
}

pub fn write_orfs<W: Write>(
    writer: &mut W,
    seq: &[u8],
    min_codons: usize,
    translated: bool,
) -> std::io::Result<usize> {
    let mut count = 0;

    for (c, frame) in frames(seq).iter().enumerate() {
        for (i, j) in reading_frames(frame) {
            if j - i < min_codons {
                continue;
            }

            let orf = &frame[i..=j];
            let body = if translated {
                let nucleotides = orf.iter().flat_map(|(_, codon)| *codon).collect::<Vec<u8>>();
                translate(&nucleotides)
            } else {
                // INFO: every codon is followed by a space, the last one too
                orf.iter()
                    .map(|(_, codon)| format!("{} ", String::from_utf8_lossy(codon)))
                    .collect::<String>()
            };

            writeln!(writer, "seq {c}: {: >5} {}: {body}", frame[i].0, frame[j].0)?;
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codons_drops_partial_codon() {
        assert_eq!(
            codons(b"ATGAA", 4),
            vec![(4, *b"ATG")]
        );
        assert!(codons(b"AT", 0).is_empty());
    }

    #[test]
    fn test_frames_positions() {
        let [f0, f1, f2, r0, _, r2] = frames(b"ATGAAATAG");

        assert_eq!(f0, vec![(0, *b"ATG"), (3, *b"AAA"), (6, *b"TAG")]);
        assert_eq!(f1, vec![(1, *b"TGA"), (4, *b"AAT")]);
        assert_eq!(f2, vec![(2, *b"GAA"), (5, *b"ATA")]);
        assert_eq!(r0, vec![(8, *b"CTA"), (5, *b"TTT"), (2, *b"CAT")]);
        assert_eq!(r2, vec![(7, *b"TAT"), (4, *b"TTC")]);
    }

    #[test]
    fn test_frames_short_sequence() {
        let all = frames(b"A");
        assert!(all.iter().all(|f| f.is_empty()));
    }

    #[test]
    fn test_reading_frames_nested_starts_share_stop() {
        let frame = codons(b"ATGATGCCCTAAATG", 0);
        assert_eq!(reading_frames(&frame), vec![(0, 3), (1, 3)]);
    }

    #[test]
    fn test_reading_frames_start_is_own_region() {
        let frame = codons(b"TAAATGTGA", 0);
        assert_eq!(reading_frames(&frame), vec![(1, 2)]);
    }

    #[test]
    fn test_write_orfs_filters_short_frames() {
        let seq = b"ATGAAAAAATAA";
        let mut out = Vec::new();

        let count = write_orfs(&mut out, seq, 3, false).unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "seq 0:     0 9: ATG AAA AAA TAA \n"
        );

        let mut out = Vec::new();
        assert_eq!(write_orfs(&mut out, seq, 4, false).unwrap(), 0);
    }

    #[test]
    fn test_write_orfs_translated() {
        let mut out = Vec::new();
        write_orfs(&mut out, b"ATGAAAAAATAA", 3, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "seq 0:     0 9: MKK*\n");
    }
}
