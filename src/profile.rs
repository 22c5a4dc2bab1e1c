//! Score tables of a dual-mode (local/glocal) profile, in log-odds units.
//! The recurrences filling DP matrices live elsewhere; traces only need lookups.
use crate::alphabet::Alphabet;
use crate::error::Result;
use crate::state::{is_legal, StateType};

pub const NTRANS: usize = 10;
/// Mk -> Mk+1
pub const MM: usize = 0;
/// Ik -> Mk+1
pub const IM: usize = 1;
/// Dk -> Mk+1
pub const DM: usize = 2;
/// L -> Mk+1, stored at row k.
pub const LM: usize = 3;
/// G -> M1, row 0 only.
pub const GM: usize = 4;
/// Mk -> Dk+1
pub const MD: usize = 5;
/// Dk -> Dk+1
pub const DD: usize = 6;
/// Mk -> Ik
pub const MI: usize = 7;
/// Ik -> Ik
pub const II: usize = 8;
/// G -> D1, row 0 only.
pub const GD: usize = 9;

/// Rows of `xsc`.
pub const XE: usize = 0;
pub const XN: usize = 1;
pub const XJ: usize = 2;
pub const XC: usize = 3;
/// Row of `xsc` for B; column 0 is B->L, column 1 is B->G.
pub const XB: usize = 4;
pub const LOOP: usize = 0;
pub const MOVE: usize = 1;

#[derive(Debug, Clone)]
pub struct Profile {
    /// Number of nodes.
    pub m: usize,
    pub abc: Alphabet,
    /// `tsc[k][t]` for k in 0..=M.
    pub tsc: Vec<[f32; NTRANS]>,
    /// `msc[k * Kp + x]`, row 0 unused.
    pub msc: Vec<f32>,
    /// `isc[k * Kp + x]`, rows 0 and M unused.
    pub isc: Vec<f32>,
    /// `xsc[state][LOOP|MOVE]` for E, N, J, C and B.
    pub xsc: [[f32; 2]; 5],
}

impl Profile {
    /// A profile of `m` nodes with every score at -inf.
    pub fn new(m: usize, abc: Alphabet) -> Self {
        let kp = abc.kp();
        Self {
            m,
            abc,
            tsc: vec![[f32::NEG_INFINITY; NTRANS]; m + 1],
            msc: vec![f32::NEG_INFINITY; (m + 1) * kp],
            isc: vec![f32::NEG_INFINITY; (m + 1) * kp],
            xsc: [[f32::NEG_INFINITY; 2]; 5],
        }
    }
    /// Set canonical match scores of node `k`. The degenerate code gets their mean.
    pub fn set_match(&mut self, k: usize, scores: &[f32]) -> Result<()> {
        if k == 0 || self.m < k {
            return format_err!("match node {} outside 1..={}", k, self.m);
        }
        let kp = self.abc.kp();
        Self::fill_row(self.abc, &mut self.msc[k * kp..(k + 1) * kp], scores)
    }
    pub fn set_insert(&mut self, k: usize, scores: &[f32]) -> Result<()> {
        if k == 0 || self.m <= k {
            return format_err!("insert node {} outside 1..{}", k, self.m);
        }
        let kp = self.abc.kp();
        Self::fill_row(self.abc, &mut self.isc[k * kp..(k + 1) * kp], scores)
    }
    fn fill_row(abc: Alphabet, row: &mut [f32], scores: &[f32]) -> Result<()> {
        if scores.len() != abc.k() {
            return format_err!("{} scores for {} canonical residues", scores.len(), abc.k());
        }
        row[..abc.k()].copy_from_slice(scores);
        row[abc.any() as usize] = scores.iter().sum::<f32>() / scores.len() as f32;
        Ok(())
    }
    pub fn match_score(&self, k: usize, x: u8) -> Result<f32> {
        if k == 0 || self.m < k {
            return format_err!("match node {} outside 1..={}", k, self.m);
        }
        match self.msc.get(k * self.abc.kp() + x as usize) {
            Some(&sc) if (x as usize) < self.abc.kp() => Ok(sc),
            _ => format_err!("residue code {} outside the alphabet", x),
        }
    }
    pub fn insert_score(&self, k: usize, x: u8) -> Result<f32> {
        if k == 0 || self.m <= k {
            return format_err!("insert node {} outside 1..{}", k, self.m);
        }
        match self.isc.get(k * self.abc.kp() + x as usize) {
            Some(&sc) if (x as usize) < self.abc.kp() => Ok(sc),
            _ => format_err!("residue code {} outside the alphabet", x),
        }
    }
    fn tsc(&self, k: usize, t: usize) -> Result<f32> {
        match self.tsc.get(k) {
            Some(row) => Ok(row[t]),
            None => format_err!("node {} outside 0..={}", k, self.m),
        }
    }
    /// Score of the transition `(st1,k1) -> (st2,k2)`.
    /// N/C/J emissions are null-model log-odds, so their loops carry the whole cost.
    pub fn transition_score(
        &self,
        st1: StateType,
        k1: usize,
        st2: StateType,
        k2: usize,
    ) -> Result<f32> {
        use StateType::*;
        if !is_legal(st1, st2) {
            return format_err!("no transition {}{} -> {}{}", st1, k1, st2, k2);
        }
        match (st1.fold(), st2.fold()) {
            (S, N) => Ok(0.0),
            (N, N) => Ok(self.xsc[XN][LOOP]),
            (N, B) => Ok(self.xsc[XN][MOVE]),
            (B, L) => Ok(self.xsc[XB][0]),
            (B, G) => Ok(self.xsc[XB][1]),
            (L, ML) => match k2.checked_sub(1) {
                Some(k) => self.tsc(k, LM),
                None => format_err!("local entry to node 0"),
            },
            (G, ML) => self.tsc(0, GM),
            (G, DL) => self.tsc(0, GD),
            (ML, ML) => self.tsc(k1, MM),
            (ML, IL) => self.tsc(k1, MI),
            (ML, DL) => self.tsc(k1, MD),
            (IL, ML) => self.tsc(k1, IM),
            (IL, IL) => self.tsc(k1, II),
            (DL, ML) => self.tsc(k1, DM),
            (DL, DL) => self.tsc(k1, DD),
            (ML, E) | (DL, E) => Ok(0.0),
            (E, C) => Ok(self.xsc[XE][MOVE]),
            (E, J) => Ok(self.xsc[XE][LOOP]),
            (J, J) => Ok(self.xsc[XJ][LOOP]),
            (J, B) => Ok(self.xsc[XJ][MOVE]),
            (C, C) => Ok(self.xsc[XC][LOOP]),
            (C, T) => Ok(self.xsc[XC][MOVE]),
            _ => format_err!("no transition score for {} -> {}", st1, st2),
        }
    }
}
