//! Traces read off a multiple alignment, given which columns are match columns.
//!
//! Every row becomes a glocal path `S N B G ... E C T`. Residues in insert columns
//! before the first match column are N emissions, after the last one C emissions.
//! The result may contain D->I or I->D transitions, which a profile forbids; use
//! `Trace::doctor` to turn them into match states before scoring or counting.
use crate::error::Result;
use crate::msa::Msa;
use crate::state::StateType;
use crate::trace::Trace;

#[derive(Debug, Clone, Copy)]
pub struct FauxOptions {
    /// Store alignment columns (1..=alen) in `i` instead of residue positions.
    pub msa_coords: bool,
}

impl std::default::Default for FauxOptions {
    fn default() -> Self {
        Self { msa_coords: true }
    }
}

/// One indexed trace per row of `msa`. `matassign[c]` tells whether column `c + 1`
/// is a match column.
pub fn faux_from_msa(msa: &Msa, matassign: &[bool], opts: FauxOptions) -> Result<Vec<Trace>> {
    if matassign.len() != msa.alen {
        return format_err!(
            "{} column assignments for an alignment of {} columns",
            matassign.len(),
            msa.alen
        );
    }
    let m = matassign.iter().filter(|&&b| b).count();
    let (first, last) = match (
        matassign.iter().position(|&b| b),
        matassign.iter().rposition(|&b| b),
    ) {
        (Some(first), Some(last)) => (first + 1, last + 1),
        _ => return format_err!("no match column in the alignment"),
    };
    debug!("FAUX\t{}\t{}\t{}\t{}", msa.nseq(), msa.alen, m, opts.msa_coords);
    (0..msa.nseq())
        .map(|idx| faux_row(msa, idx, matassign, m, (first, last), opts))
        .collect()
}

fn faux_row(
    msa: &Msa,
    idx: usize,
    matassign: &[bool],
    m: usize,
    (first, last): (usize, usize),
    opts: FauxOptions,
) -> Result<Trace> {
    use StateType::*;
    let abc = msa.abc;
    let row = &msa.ax[idx];
    let mut tr = Trace::new();
    tr.grow_to(msa.alen + 6)?;
    tr.append(S, 0, 0)?;
    tr.append(N, 0, 0)?;
    let mut k = 0;
    let mut residues = 0;
    for col in 1..=msa.alen {
        let x = row[col];
        let is_residue = abc.is_residue(x);
        if is_residue {
            residues += 1;
        }
        let pos = if opts.msa_coords { col } else { residues };
        if col == first {
            tr.append(B, 0, 0)?;
            tr.append(G, 0, 0)?;
        }
        if matassign[col - 1] {
            k += 1;
            if is_residue {
                tr.append(MG, k, pos)?;
            } else {
                tr.append(DG, k, 0)?;
            }
        } else if is_residue {
            if col < first {
                tr.append(N, 0, pos)?;
            } else if col < last {
                tr.append(IG, k, pos)?;
            } else {
                tr.append(C, 0, pos)?;
            }
        }
        if col == last {
            tr.append(E, 0, 0)?;
            tr.append(C, 0, 0)?;
        }
    }
    tr.append(T, 0, 0)?;
    let l = if opts.msa_coords { msa.alen } else { residues };
    tr.set_lengths(m, l)?;
    tr.index()?;
    Ok(tr)
}

impl Trace {
    /// Remove D->I and I->D transitions from a faux trace.
    /// D->I: the delete becomes a match emitting the insert's residue.
    /// I->D: the insert becomes a match at the delete's node.
    /// Returns the number of each repair. Emitted residues and domains are kept.
    pub fn doctor(&mut self) -> Result<(usize, usize)> {
        let was_indexed = self.ndom != 0;
        let (mut ndi, mut nid) = (0, 0);
        if self.n == 0 {
            return Ok((0, 0));
        }
        let mut npos = 1;
        for opos in 1..self.n {
            let (prev, cur) = (self.st[npos - 1], self.st[opos]);
            if prev.is_delete() && cur.is_insert() {
                self.st[npos - 1] = if prev.is_glocal() { StateType::MG } else { StateType::ML };
                self.i[npos - 1] = self.i[opos];
                if let Some(pp) = self.pp.as_mut() {
                    pp[npos - 1] = pp[opos];
                }
                ndi += 1;
            } else if prev.is_insert() && cur.is_delete() {
                self.st[npos - 1] = if prev.is_glocal() { StateType::MG } else { StateType::ML };
                self.k[npos - 1] = self.k[opos];
                nid += 1;
            } else {
                self.st[npos] = cur;
                self.k[npos] = self.k[opos];
                self.i[npos] = self.i[opos];
                if let Some(pp) = self.pp.as_mut() {
                    pp[npos] = pp[opos];
                }
                npos += 1;
            }
        }
        self.n = npos;
        if was_indexed {
            self.index()?;
        }
        if 0 < ndi + nid {
            debug!("DOCTOR\t{}\t{}\t{}", ndi, nid, self.n);
        }
        Ok((ndi, nid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;
    use StateType::*;
    fn toy_msa() -> Msa {
        let rows = vec![
            b"ACG-T".to_vec(),
            b"A-GGT".to_vec(),
            b"-CGG-".to_vec(),
            b"AC~-T".to_vec(),
        ];
        let names = (0..rows.len()).map(|i| format!("seq{}", i)).collect();
        Msa::new(Alphabet::Dna, names, &rows).unwrap()
    }
    #[test]
    fn match_columns_enumerate_nodes() {
        let msa = toy_msa();
        let matassign = vec![true, true, true, false, true];
        let traces = faux_from_msa(&msa, &matassign, FauxOptions::default()).unwrap();
        assert_eq!(traces.len(), 4);
        let tr = &traces[0];
        let main: Vec<_> = (0..tr.len())
            .filter(|&z| tr.states()[z].is_match() || tr.states()[z].is_delete())
            .map(|z| tr.nodes()[z])
            .collect();
        assert_eq!(main, vec![1, 2, 3, 4]);
        assert_eq!(tr.positions()[4..8], [1, 2, 3, 5]);
        assert_eq!(tr.domain_count(), 1);
        assert_eq!(tr.model_length(), 4);
        assert_eq!(tr.seq_length(), 5);
        tr.validate(msa.abc, &msa.ax[0]).unwrap();
        // Missing data in a match column is a deletion.
        assert_eq!(traces[3].states()[6], DG);
        assert_eq!(traces[3].nodes()[6], 3);
        let raw = faux_from_msa(&msa, &matassign, FauxOptions { msa_coords: false }).unwrap();
        assert_eq!(raw[1].seq_length(), 4);
        raw[0].validate(msa.abc, &msa.unaligned(0)).unwrap();
    }
    #[test]
    fn flanking_inserts() {
        let rows = vec![b"GACGTT".to_vec(), b"-AC--T".to_vec()];
        let names = vec!["a".to_string(), "b".to_string()];
        let msa = Msa::new(Alphabet::Dna, names, &rows).unwrap();
        let matassign = vec![false, true, true, false, false, false];
        let traces = faux_from_msa(&msa, &matassign, FauxOptions::default()).unwrap();
        let states = traces[0].states();
        assert_eq!(states[..4], [S, N, N, B]);
        assert_eq!(states[states.len() - 5..], [C, C, C, C, T]);
        assert_eq!(traces[0].emission_counts(), (2, 0, 4));
        traces[0].validate(msa.abc, &msa.ax[0]).unwrap();
        traces[1].validate(msa.abc, &msa.ax[1]).unwrap();
    }
    #[test]
    fn bad_assignments() {
        let msa = toy_msa();
        assert!(faux_from_msa(&msa, &[true, true], FauxOptions::default()).is_err());
        assert!(faux_from_msa(&msa, &[false; 5], FauxOptions::default()).is_err());
    }
    #[test]
    fn doctor_repairs() {
        let msa = toy_msa();
        let matassign = vec![true, true, true, false, true];
        let mut traces = faux_from_msa(&msa, &matassign, FauxOptions::default()).unwrap();
        // Row 1 is A-GGT: D2 is never followed by an insert, M3 then I3 is fine.
        assert_eq!(traces[1].doctor().unwrap(), (0, 0));
        // Row 2 is -CGG-: ... I3 -> D4.
        let before = traces[2].emission_counts();
        assert_eq!(traces[2].doctor().unwrap(), (0, 1));
        assert_eq!(traces[2].emission_counts().0, before.0 + before.1);
        traces[2].validate(msa.abc, &msa.ax[2]).unwrap();
        // Row 3 is AC~-T: nothing to repair.
        assert_eq!(traces[3].doctor().unwrap(), (0, 0));
        let rows = vec![b"A-GT".to_vec()];
        let msa = Msa::new(Alphabet::Dna, vec!["x".to_string()], &rows).unwrap();
        let matassign = [true, true, false, true];
        let mut traces = faux_from_msa(&msa, &matassign, FauxOptions::default()).unwrap();
        assert_eq!(traces[0].doctor().unwrap(), (1, 0));
        traces[0].validate(msa.abc, &msa.ax[0]).unwrap();
        assert_eq!(traces[0].nodes()[5], 2);
        assert_eq!(traces[0].positions()[5], 3);
    }
    #[test]
    fn doctor_keeps_residues_and_domains() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(4234);
        let symbols = b"ACGT-";
        for _ in 0..100 {
            let alen = rng.gen_range(2..40);
            let nseq = rng.gen_range(1..8);
            let rows: Vec<Vec<u8>> = (0..nseq)
                .map(|_| {
                    (0..alen)
                        .map(|_| symbols[rng.gen_range(0..symbols.len())])
                        .collect()
                })
                .collect();
            let names = (0..nseq).map(|i| format!("{}", i)).collect();
            let msa = Msa::new(Alphabet::Dna, names, &rows).unwrap();
            let mut matassign: Vec<bool> = (0..alen).map(|_| rng.gen_bool(0.6)).collect();
            matassign[rng.gen_range(0..alen)] = true;
            let m = matassign.iter().filter(|&&b| b).count();
            let traces = faux_from_msa(&msa, &matassign, FauxOptions::default()).unwrap();
            for (idx, mut tr) in traces.into_iter().enumerate() {
                let states = tr.states();
                let main = states.iter().filter(|s| s.is_match() || s.is_delete()).count();
                assert_eq!(main, m);
                let emitted = |tr: &Trace| -> Vec<usize> {
                    tr.positions().iter().filter(|&&i| i != 0).copied().collect()
                };
                let mut before = emitted(&tr);
                let ndom = tr.domain_count();
                tr.doctor().unwrap();
                let mut after = emitted(&tr);
                before.sort_unstable();
                after.sort_unstable();
                assert_eq!(before, after);
                assert_eq!(tr.domain_count(), ndom);
                if let Err(why) = tr.validate(msa.abc, &msa.ax[idx]) {
                    panic!("{}\n{:?}\n{}", why, String::from_utf8_lossy(&rows[idx]), tr);
                }
            }
        }
    }
}
