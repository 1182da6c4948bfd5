use std::io::{self, Write};

/// Writes one read in the four-line FASTQ layout.
pub fn write_fastq_record<W: Write>(
    writer: &mut W,
    id: &str,
    seq: &[u8],
    qual: &[u8],
) -> io::Result<()> {
    // Header
    writer.write_all(b"@")?;
    writer.write_all(id.as_bytes())?;
    writer.write_all(b"\n")?;

    // Sequence
    writer.write_all(seq)?;
    writer.write_all(b"\n")?;

    // Separator
    writer.write_all(b"+")?;
    writer.write_all(b"\n")?;

    // Quality scores
    writer.write_all(qual)?;
    writer.write_all(b"\n")?;
    Ok(())
}
