//! Digital multiple sequence alignment. Columns are numbered 1..=alen.
use crate::alphabet::{Alphabet, SENTINEL};
use crate::error::Result;
use crate::fasta::FASTARecord;

#[derive(Debug, Clone)]
pub struct Msa {
    pub names: Vec<String>,
    pub abc: Alphabet,
    pub alen: usize,
    /// `ax[idx][col]` for col in 1..=alen; `ax[idx][0]` is the sentinel.
    pub ax: Vec<Vec<u8>>,
}

impl Msa {
    /// Digitize aligned rows. Every row must have the same length.
    pub fn new<T: std::borrow::Borrow<[u8]>>(
        abc: Alphabet,
        names: Vec<String>,
        rows: &[T],
    ) -> Result<Self> {
        if names.len() != rows.len() {
            return format_err!("{} names for {} rows", names.len(), rows.len());
        }
        let alen = rows.first().map(|r| r.borrow().len()).unwrap_or(0);
        let mut ax = Vec::with_capacity(rows.len());
        for (name, row) in names.iter().zip(rows.iter()) {
            let row = row.borrow();
            if row.len() != alen {
                return format_err!("row {} has {} columns, expected {}", name, row.len(), alen);
            }
            match abc.digitize(row) {
                Ok(dsq) => ax.push(dsq),
                Err(why) => return format_err!("row {}: {}", name, why),
            }
        }
        Ok(Self {
            names,
            abc,
            alen,
            ax,
        })
    }
    pub fn from_records(abc: Alphabet, records: &[FASTARecord]) -> Result<Self> {
        let names: Vec<_> = records.iter().map(|(id, _)| id.clone()).collect();
        let rows: Vec<_> = records.iter().map(|(_, seq)| seq.as_slice()).collect();
        Self::new(abc, names, &rows)
    }
    pub fn nseq(&self) -> usize {
        self.ax.len()
    }
    /// Number of residues (non-gap, non-missing cells) in a row.
    pub fn residue_count(&self, idx: usize) -> usize {
        let row = &self.ax[idx][1..];
        let gaps = bytecount::count(row, self.abc.gap());
        row.len() - gaps - bytecount::count(row, self.abc.missing())
    }
    /// The row with gaps and missing data removed, as a digital sequence.
    pub fn unaligned(&self, idx: usize) -> Vec<u8> {
        let mut dsq = Vec::with_capacity(self.residue_count(idx) + 1);
        dsq.push(SENTINEL);
        dsq.extend(self.ax[idx][1..].iter().filter(|&&x| self.abc.is_residue(x)));
        dsq
    }
    /// Mark columns whose residue occupancy is at least `symfrac` as match columns.
    pub fn assign_match_columns(&self, symfrac: f32) -> Vec<bool> {
        let nseq = self.nseq().max(1) as f32;
        (1..=self.alen)
            .map(|col| {
                let occupancy = self
                    .ax
                    .iter()
                    .filter(|row| self.abc.is_residue(row[col]))
                    .count();
                0 < occupancy && symfrac <= occupancy as f32 / nseq
            })
            .collect()
    }
}
