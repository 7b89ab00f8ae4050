//! Nucleotide pretty-printer
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Turns raw nucleotide lines into rows of `blocks` triplets, each row
//! prefixed with the offset of its first base and followed by the
//! translated amino acids:
//!
//! ```text
//! 0000000000: ATG AAA TTT  MKF
//! ```
//!
//! Input may arrive in chunks of any size; a codon or a row can span
//! several input lines.

use anyhow::Context;
use log::warn;

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::{
    cli::PrettyArgs,
    code::{translate_or_x, Codon},
    consts::{MAX_PRETTY_BLOCKS, OFFSET_WIDTH},
    utils::create_writer,
};

/// Streaming row formatter.
///
/// Every byte fed is taken as a nucleotide, there is no validation.
/// Call [`Tabulator::finish`] to pad and close the last row.
pub struct Tabulator<W: Write> {
    writer: W,
    /// bases per row
    width: usize,
    begin: i64,
    dir: i64,
    /// bases written so far
    i: usize,
    codon: Codon,
    codons: Vec<Codon>,
}

impl<W: Write> Tabulator<W> {
    /// Creates a tabulator writing rows of `blocks` triplets.
    ///
    /// # Arguments
    ///
    /// * `writer` - destination of the rows
    /// * `blocks` - triplets per row, clamped to `1..=MAX_PRETTY_BLOCKS`
    /// * `begin` - offset printed for the first base
    /// * `dir` - `1` counts offsets up, `-1` counts them down
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let mut tab = Tabulator::new(Vec::new(), 10, 0, 1);
    /// tab.feed(b"ATGAAA")?;
    /// let out = tab.finish()?;
    /// ```
    pub fn new(writer: W, blocks: usize, begin: i64, dir: i64) -> Self {
        Self {
            writer,
            width: blocks.clamp(1, MAX_PRETTY_BLOCKS) * 3,
            begin,
            dir,
            i: 0,
            codon: [0; 3],
            codons: Vec::new(),
        }
    }

    pub fn feed(&mut self, bases: &[u8]) -> std::io::Result<()> {
        for &base in bases {
            let pos = self.i % 3;

            if pos == 0 {
                if self.i % self.width == 0 {
                    if self.i != 0 {
                        self.annotate()?;
                        writeln!(self.writer)?;
                        self.codons.clear();
                    }

                    let offset = self.begin + self.dir * self.i as i64;
                    write!(self.writer, "{:0>width$}: ", offset, width = OFFSET_WIDTH)?;
                } else {
                    write!(self.writer, " ")?;
                }
            }

            self.writer.write_all(&[base])?;
            self.codon[pos] = base;
            self.i += 1;

            if pos == 2 {
                self.codons.push(self.codon);
            }
        }

        Ok(())
    }

    fn annotate(&mut self) -> std::io::Result<()> {
        let aa = self
            .codons
            .iter()
            .map(|codon| translate_or_x(codon))
            .collect::<Vec<u8>>();

        write!(self.writer, "  ")?;
        self.writer.write_all(&aa)
    }

    /// Pads and annotates the last row, then hands back the writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        let rest = self.i % self.width;

        if rest != 0 {
            // INFO: blank out the rest of the last triplet, then whole triplets
            let missing = 2 - (self.i - 1) % 3;
            write!(self.writer, "{}", " ".repeat(missing))?;

            let mut j = self.i + missing;
            while j % self.width != 0 {
                write!(self.writer, "    ")?;
                j += 3;
            }
        }

        if self.i != 0 && rest != 1 && rest != 2 {
            self.annotate()?;
        }

        if self.i != 0 {
            writeln!(self.writer)?;
        }

        Ok(self.writer)
    }
}

/// Offset origin of a prodigal header `>id # begin # end # dir # notes`.
///
/// # Returns
///
/// `Ok(None)` for other headers, `(begin, 1)` for forward genes and
/// `(end, dir)` otherwise.
pub fn header_origin(header: &str) -> anyhow::Result<Option<(i64, i64)>> {
    let parts = header.split('#').collect::<Vec<&str>>();
    if parts.len() != 5 {
        return Ok(None);
    }

    let number = |field: &str, name: &str| {
        field
            .trim()
            .parse::<i64>()
            .with_context(|| format!("invalid {name} '{}' in header {header}", field.trim()))
    };

    let begin = number(parts[1], "begin")?;
    let end = number(parts[2], "end")?;
    let dir = number(parts[3], "direction")?;

    Ok(Some(if dir == 1 { (begin, dir) } else { (end, dir) }))
}

/// Pretty-prints every record of a FASTA-like stream.
///
/// Header lines are echoed and start a new table; a prodigal header
/// sets the offsets of the table that follows it.
///
/// # Arguments
///
/// * `reader` - nucleotide lines and `>` headers
/// * `writer` - destination of the tables
/// * `blocks` - triplets per row
pub fn prettify<R: BufRead, W: Write>(reader: R, writer: W, blocks: usize) -> anyhow::Result<W> {
    let mut tab = Tabulator::new(writer, blocks, 0, 1);

    for line in reader.split(b'\n') {
        let line = line.context("could not read input")?;
        let line = line.trim_ascii();

        if line.first() == Some(&b'>') {
            let mut writer = tab.finish()?;
            writer.write_all(line)?;
            writeln!(writer)?;

            let header = String::from_utf8_lossy(line);
            let (begin, dir) = match header_origin(&header) {
                Ok(origin) => origin.unwrap_or((0, 1)),
                Err(e) => {
                    warn!("WARN: {e:#}, counting from 0");
                    (0, 1)
                }
            };

            tab = Tabulator::new(writer, blocks, begin, dir);
        } else {
            tab.feed(line)?;
        }
    }

    Ok(tab.finish()?)
}

/// Pretty-prints nucleotide sequences.
///
/// # Arguments
///
/// * `args` - input and output paths (`-` for stdin/stdout), triplets per row
///
/// # Example
///
/// ```rust, ignore
/// let args = PrettyArgs::parse();
/// run_pretty(args)?;
/// ```
pub fn run_pretty(args: PrettyArgs) -> anyhow::Result<()> {
    let writer = create_writer(&args.output)?;

    let mut writer = if args.input == Path::new("-") {
        prettify(std::io::stdin().lock(), writer, args.blocks)?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("could not open {}", args.input.display()))?;
        prettify(BufReader::new(file), writer, args.blocks)?
    };

    writer.flush()?;
    Ok(())
}
