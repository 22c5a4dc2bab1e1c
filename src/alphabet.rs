//! Digital alphabets. Canonical residues take codes `0..K`, followed by the gap,
//! the fully degenerate residue, the nonresidue `*` and the missing-data `~` codes.
use crate::error::Result;

/// Value of `dsq[0]` in a digital sequence. Residues live in `dsq[1..=L]`.
pub const SENTINEL: u8 = 255;

const INVALID: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Dna,
    Amino,
}

const DNA_SYMBOLS: &[u8] = b"ACGT-N*~";
const AMINO_SYMBOLS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY-X*~";

const fn symbol_table(symbols: &[u8]) -> [u8; 256] {
    let mut slots = [INVALID; 256];
    let mut i = 0;
    while i < symbols.len() {
        let c = symbols[i];
        slots[c as usize] = i as u8;
        if b'A' <= c && c <= b'Z' {
            slots[(c + 32) as usize] = i as u8;
        }
        i += 1;
    }
    slots
}

const fn dna_table() -> [u8; 256] {
    let mut slots = symbol_table(DNA_SYMBOLS);
    slots[b'U' as usize] = 3;
    slots[b'u' as usize] = 3;
    slots[b'.' as usize] = 4;
    slots[b'_' as usize] = 4;
    slots
}

const fn amino_table() -> [u8; 256] {
    let mut slots = symbol_table(AMINO_SYMBOLS);
    slots[b'.' as usize] = 20;
    slots[b'_' as usize] = 20;
    slots
}

const DNA_TABLE: [u8; 256] = dna_table();
const AMINO_TABLE: [u8; 256] = amino_table();

impl Alphabet {
    /// Number of canonical residues.
    pub fn k(self) -> usize {
        match self {
            Alphabet::Dna => 4,
            Alphabet::Amino => 20,
        }
    }
    /// Total number of digital codes.
    pub fn kp(self) -> usize {
        self.k() + 4
    }
    pub fn gap(self) -> u8 {
        self.k() as u8
    }
    pub fn any(self) -> u8 {
        self.k() as u8 + 1
    }
    pub fn nonresidue(self) -> u8 {
        self.k() as u8 + 2
    }
    pub fn missing(self) -> u8 {
        self.k() as u8 + 3
    }
    fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::Dna => DNA_SYMBOLS,
            Alphabet::Amino => AMINO_SYMBOLS,
        }
    }
    /// Digital code of a text symbol.
    pub fn encode(self, c: u8) -> Option<u8> {
        let code = match self {
            Alphabet::Dna => DNA_TABLE[c as usize],
            Alphabet::Amino => AMINO_TABLE[c as usize],
        };
        (code != INVALID).then(|| code)
    }
    /// Text symbol of a digital code. Unknown codes decode to `?`.
    pub fn symbol(self, code: u8) -> u8 {
        self.symbols().get(code as usize).copied().unwrap_or(b'?')
    }
    pub fn is_canonical(self, code: u8) -> bool {
        (code as usize) < self.k()
    }
    /// Canonical, degenerate or nonresidue: anything that occupies a sequence position.
    pub fn is_residue(self, code: u8) -> bool {
        self.is_canonical(code) || code == self.any() || code == self.nonresidue()
    }
    pub fn is_gap(self, code: u8) -> bool {
        code == self.gap()
    }
    pub fn is_missing(self, code: u8) -> bool {
        code == self.missing()
    }
    /// Digitize unaligned text into `dsq[0..=L]` with a sentinel at position 0.
    pub fn digitize(self, seq: &[u8]) -> Result<Vec<u8>> {
        let mut dsq = Vec::with_capacity(seq.len() + 1);
        dsq.push(SENTINEL);
        for (pos, &c) in seq.iter().enumerate() {
            match self.encode(c) {
                Some(code) => dsq.push(code),
                None => return format_err!("illegal symbol {:?} at {}", c as char, pos + 1),
            }
        }
        Ok(dsq)
    }
    /// Add `weight` worth of observation of `code` into `counts[0..K]`.
    /// Degenerate residues are spread evenly over the canonical ones.
    pub fn count_residue(self, code: u8, weight: f32, counts: &mut [f32]) {
        if self.is_canonical(code) {
            counts[code as usize] += weight;
        } else if code == self.any() {
            let share = weight / self.k() as f32;
            counts.iter_mut().take(self.k()).for_each(|x| *x += share);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn digitize() {
        let dsq = Alphabet::Dna.digitize(b"ACgtN").unwrap();
        assert_eq!(dsq, vec![SENTINEL, 0, 1, 2, 3, 5]);
        assert!(Alphabet::Dna.digitize(b"ACZ").is_err());
        let dsq = Alphabet::Amino.digitize(b"WYX").unwrap();
        assert_eq!(dsq[1..], [18, 19, 21]);
        assert_eq!(Alphabet::Amino.symbol(18), b'W');
    }
    #[test]
    fn codes() {
        let abc = Alphabet::Dna;
        assert!(abc.is_gap(abc.encode(b'.').unwrap()));
        assert!(abc.is_missing(abc.encode(b'~').unwrap()));
        assert!(abc.is_residue(abc.encode(b'N').unwrap()));
        assert!(!abc.is_residue(abc.gap()));
        assert_eq!(abc.kp(), DNA_SYMBOLS.len());
        assert_eq!(Alphabet::Amino.kp(), AMINO_SYMBOLS.len());
    }
    #[test]
    fn degenerate_count() {
        let abc = Alphabet::Dna;
        let mut counts = vec![0f32; abc.k()];
        abc.count_residue(0, 1.0, &mut counts);
        abc.count_residue(abc.any(), 2.0, &mut counts);
        abc.count_residue(abc.gap(), 2.0, &mut counts);
        assert_eq!(counts, vec![1.5, 0.5, 0.5, 0.5]);
    }
}
