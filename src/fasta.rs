//! Very thin Fasta reader. Only support batch IO.
//! Aligned FASTA (gaps as `-` or `.`) is read the same way.
use std::io::{BufRead, BufReader};
pub type FASTARecord = (String, Vec<u8>);

/// Read file or stdin, return parsed fasta records.
pub fn read_fasta<P: AsRef<std::path::Path>>(
    file: &Option<P>,
) -> std::io::Result<Vec<FASTARecord>> {
    let stdin = std::io::stdin();
    let mut reader: Box<dyn BufRead> = match file {
        Some(file) => std::fs::File::open(file)
            .map(BufReader::new)
            .map(Box::new)?,
        None => {
            let lock = stdin.lock();
            Box::new(BufReader::new(lock))
        }
    };
    let mut contents = vec![];
    reader.read_to_end(&mut contents)?;
    parse_fasta(&contents)
}

/// Parse records. Text before the first `>` is an error.
pub fn parse_fasta(contents: &[u8]) -> std::io::Result<Vec<FASTARecord>> {
    let mut contents = contents.split(|&x| x == b'>');
    if let Some(first) = contents.next() {
        if first.iter().any(|x| !x.is_ascii_whitespace()) {
            let why = "FASTA input does not start with '>'";
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, why));
        }
    }
    let records = contents
        .filter_map(|record| {
            let mut record = record.splitn(2, |&x| x == b'\n');
            let id = record.next()?.split(|&x| x == b' ').next()?;
            let contents = record.next()?;
            let contents: Vec<_> = contents
                .iter()
                .filter(|x| !x.is_ascii_whitespace())
                .copied()
                .collect();
            Some((String::from_utf8_lossy(id).trim().to_string(), contents))
        })
        .collect();
    Ok(records)
}
