use crate::bio::sequence::Sequence;
use crate::DendrosortError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::tag,
    character::complete::{line_ending, not_line_ending},
    sequence::delimited,
    IResult,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Residues per line in written FASTA output.
const LINE_WIDTH: usize = 80;

/// Parse a FASTA header line: the id runs to the first whitespace, the rest
/// of the line is the free-text description.
fn parse_header(input: &[u8]) -> IResult<&[u8], (String, Option<String>)> {
    let (rest, line) = delimited(tag(b">"), not_line_ending, line_ending)(input)?;

    let text = String::from_utf8_lossy(line);
    let mut fields = text.splitn(2, char::is_whitespace);
    let id = fields.next().unwrap_or_default().to_string();
    let description = fields
        .next()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok((rest, (id, description)))
}

/// Consume residue lines up to the next header (a '>' at the start of a
/// line) or EOF, stripping whitespace and upper-casing.
fn parse_residues(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut boundary = input.len();
    let mut at_line_start = true;

    for (pos, &byte) in input.iter().enumerate() {
        if at_line_start && byte == b'>' {
            boundary = pos;
            break;
        }
        at_line_start = byte == b'\n';
    }

    let residues = input[..boundary]
        .iter()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| b.to_ascii_uppercase())
        .collect();

    Ok((&input[boundary..], residues))
}

fn parse_record(input: &[u8]) -> IResult<&[u8], Sequence> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, residues) = parse_residues(input)?;

    let mut seq = Sequence::new(id, residues);
    if let Some(desc) = description {
        seq = seq.with_description(desc);
    }

    Ok((input, seq))
}

/// Parse FASTA records from an in-memory buffer.
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<Sequence>, DendrosortError> {
    let mut input = data;
    let mut sequences = Vec::new();

    while !input.is_empty() {
        // Skip blank lines between records
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        if input[0] != b'>' {
            return Err(DendrosortError::Parse(
                "expected '>' at start of FASTA record".to_string(),
            ));
        }

        match parse_record(input) {
            Ok((remaining, seq)) => {
                sequences.push(seq);
                input = remaining;
            }
            Err(e) => {
                return Err(DendrosortError::Parse(format!(
                    "failed to parse FASTA record: {:?}",
                    e
                )));
            }
        }
    }

    Ok(sequences)
}

/// Parse a FASTA file into sequences (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>, DendrosortError> {
    let path = path.as_ref();

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut buffer = Vec::new();
        decoder.read_to_end(&mut buffer)?;
        parse_fasta_from_bytes(&buffer)
    } else {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        parse_fasta_from_bytes(&mmap[..])
    }
}

/// Read several FASTA files and concatenate their records in argument order.
/// Record order within each file is preserved; the combined order is what the
/// sorter treats as the original input order.
pub fn parse_fasta_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Sequence>, DendrosortError> {
    let mut sequences = Vec::new();
    for path in paths {
        sequences.extend(parse_fasta(path)?);
    }
    Ok(sequences)
}

/// Write sequences to a FASTA file (gzip-compressed when the path ends in .gz)
pub fn write_fasta<P: AsRef<Path>>(path: P, sequences: &[Sequence]) -> Result<(), DendrosortError> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let file = File::create(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_fasta_to_writer(&mut writer, sequences)?;
        writer.flush()?;
    }

    Ok(())
}

/// Write sequences to any writer
pub fn write_fasta_to_writer<W: Write>(
    writer: &mut W,
    sequences: &[Sequence],
) -> Result<(), DendrosortError> {
    for seq in sequences {
        writer.write_all(seq.header().as_bytes())?;
        writer.write_all(b"\n")?;

        let mut offset = 0;
        while offset < seq.residues.len() {
            let end = seq.residues.len().min(offset + LINE_WIDTH);
            writer.write_all(&seq.residues[offset..end])?;
            writer.write_all(b"\n")?;
            offset = end;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let input = b">sp|P12345|PROTEIN_HUMAN Description here\nACGT";
        let (remaining, (id, desc)) = parse_header(input).unwrap();
        assert_eq!(id, "sp|P12345|PROTEIN_HUMAN");
        assert_eq!(desc.as_deref(), Some("Description here"));
        assert_eq!(remaining, b"ACGT");
    }

    #[test]
    fn test_parse_header_without_description() {
        let (_, (id, desc)) = parse_header(b">bare-id\n").unwrap();
        assert_eq!(id, "bare-id");
        assert_eq!(desc, None);

        // Trailing whitespace is not a description
        let (_, (_, desc)) = parse_header(b">bare-id   \n").unwrap();
        assert_eq!(desc, None);
    }

    #[test]
    fn test_parse_multiline_record() {
        let fasta = b">seq1 first record\nACGT\nacgt\n\n>seq2\nTTTT\n";
        let sequences = parse_fasta_from_bytes(fasta).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].id, "seq1");
        assert_eq!(sequences[0].description.as_deref(), Some("first record"));
        assert_eq!(sequences[0].residues, b"ACGTACGT");
        assert_eq!(sequences[1].id, "seq2");
        assert_eq!(sequences[1].residues, b"TTTT");
    }

    #[test]
    fn test_parse_rejects_leading_garbage() {
        let fasta = b"not a header\nACGT\n";
        assert!(parse_fasta_from_bytes(fasta).is_err());
    }

    #[test]
    fn test_write_wraps_long_sequences() {
        let seq = Sequence::new("long".to_string(), vec![b'A'; 200]);
        let mut out = Vec::new();
        write_fasta_to_writer(&mut out, &[seq]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">long");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 40);
    }

    #[test]
    fn test_roundtrip_preserves_records() {
        let original = vec![
            Sequence::new("a".to_string(), b"ACGTACGT".to_vec())
                .with_description("sample".to_string()),
            Sequence::new("b".to_string(), b"GGGGCCCC".to_vec()),
        ];

        let mut buffer = Vec::new();
        write_fasta_to_writer(&mut buffer, &original).unwrap();
        let parsed = parse_fasta_from_bytes(&buffer).unwrap();

        assert_eq!(parsed, original);
    }
}
