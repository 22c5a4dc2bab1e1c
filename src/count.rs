//! Collecting observed emission and transition counts from traces, the first step
//! of estimating a new model from an alignment.
use crate::alphabet::Alphabet;
use crate::error::{Result, TraceError};
use crate::state::StateType;
use crate::trace::Trace;
use rayon::prelude::*;

pub const NCORE_TRANS: usize = 7;
/// Slots of `CountModel::t[k]`.
pub const TMM: usize = 0;
pub const TMI: usize = 1;
pub const TMD: usize = 2;
pub const TIM: usize = 3;
pub const TII: usize = 4;
pub const TDM: usize = 5;
pub const TDD: usize = 6;

/// Weighted counts of a core model of `m` nodes.
/// Row 0 of `t` holds the glocal entry (G->M1 in `TMM`, G->D1 in `TMD`).
#[derive(Debug, Clone, PartialEq)]
pub struct CountModel {
    pub m: usize,
    pub abc: Alphabet,
    pub t: Vec<[f32; NCORE_TRANS]>,
    pub mat: Vec<Vec<f32>>,
    pub ins: Vec<Vec<f32>>,
}

impl CountModel {
    pub fn new(m: usize, abc: Alphabet) -> Self {
        Self {
            m,
            abc,
            t: vec![[0f32; NCORE_TRANS]; m + 1],
            mat: vec![vec![0f32; abc.k()]; m + 1],
            ins: vec![vec![0f32; abc.k()]; m + 1],
        }
    }
    /// Zero every count, keeping the shape.
    pub fn zeros(&mut self) {
        self.t.iter_mut().for_each(|row| *row = [0f32; NCORE_TRANS]);
        self.mat.iter_mut().for_each(|row| row.iter_mut().for_each(|x| *x = 0f32));
        self.ins.iter_mut().for_each(|row| row.iter_mut().for_each(|x| *x = 0f32));
    }
    /// Add the counts of `other`, which must have the same shape.
    pub fn merge(mut self, other: Self) -> Result<Self> {
        if self.m != other.m || self.abc != other.abc {
            return format_err!(
                "cannot merge counts of {} nodes ({:?}) into {} nodes ({:?})",
                other.m,
                other.abc,
                self.m,
                self.abc
            );
        }
        fn add(xs: &mut [f32], ys: &[f32]) {
            xs.iter_mut().zip(ys).for_each(|(x, y)| *x += y);
        }
        for (x, y) in self.t.iter_mut().zip(other.t.iter()) {
            add(x, y);
        }
        for (x, y) in self.mat.iter_mut().zip(other.mat.iter()) {
            add(x, y);
        }
        for (x, y) in self.ins.iter_mut().zip(other.ins.iter()) {
            add(x, y);
        }
        Ok(self)
    }
    /// The transition slot `(row, slot)` counted for step `z` (state `s` at node `k`)
    /// going to `next`, if any.
    fn core_slot(
        &self,
        z: usize,
        s: StateType,
        k: usize,
        next: StateType,
    ) -> Result<Option<(usize, usize)>> {
        use StateType::*;
        let slot = match (s, next) {
            (G, MG) => Some((0, TMM)),
            (G, DG) => Some((0, TMD)),
            (MG, E) => Some((self.m, TMM)),
            (DG, E) => Some((self.m, TDM)),
            (from, to) if from.is_main() && to.is_main() => match (from.fold(), to.fold()) {
                (ML, ML) => Some((k, TMM)),
                (ML, IL) => Some((k, TMI)),
                (ML, DL) => Some((k, TMD)),
                (IL, ML) => Some((k, TIM)),
                (IL, IL) => Some((k, TII)),
                (DL, ML) => Some((k, TDM)),
                (DL, DL) => Some((k, TDD)),
                _ => return format_err!("step {}: no core transition {} -> {}", z, from, to),
            },
            _ => None,
        };
        Ok(slot)
    }
    /// Count one trace of `dsq` with weight `weight`. The whole trace is checked
    /// first; on error the counts are left untouched.
    pub fn count_trace(&mut self, dsq: &[u8], weight: f32, tr: &Trace) -> Result<()> {
        let (st, ks, is) = (tr.states(), tr.nodes(), tr.positions());
        let mut slots = Vec::with_capacity(tr.len());
        for z in 0..tr.len() {
            let (s, k, i) = (st[z], ks[z], is[z]);
            if self.m < k || (s.is_main() && k == 0) {
                return format_err!("step {}: {} node {} outside 1..={}", z, s, k, self.m);
            }
            if i != 0 && dsq.len() <= i {
                return format_err!("step {}: position {} beyond the sequence", z, i);
            }
            let slot = match st.get(z + 1) {
                Some(&next) => self.core_slot(z, s, k, next)?,
                None => None,
            };
            slots.push(slot);
        }
        for (z, slot) in slots.into_iter().enumerate() {
            let (s, k, i) = (st[z], ks[z], is[z]);
            if i != 0 {
                if s.is_match() {
                    self.abc.count_residue(dsq[i], weight, &mut self.mat[k]);
                } else if s.is_insert() {
                    self.abc.count_residue(dsq[i], weight, &mut self.ins[k]);
                }
            }
            if let Some((row, t)) = slot {
                self.t[row][t] += weight;
            }
        }
        Ok(())
    }
}

impl Trace {
    /// Same as `CountModel::count_trace`.
    pub fn count_into(&self, model: &mut CountModel, dsq: &[u8], weight: f32) -> Result<()> {
        model.count_trace(dsq, weight, self)
    }
}

/// Count many independent traces in parallel and add them into `model`.
pub fn count_traces<T: std::borrow::Borrow<[u8]> + Sync>(
    model: &mut CountModel,
    traces: &[(T, f32, Trace)],
) -> Result<()> {
    let (m, abc) = (model.m, model.abc);
    let total = traces
        .par_iter()
        .try_fold(
            || CountModel::new(m, abc),
            |mut acc, (dsq, weight, tr)| {
                acc.count_trace(dsq.borrow(), *weight, tr)?;
                Ok::<_, TraceError>(acc)
            },
        )
        .try_reduce(|| CountModel::new(m, abc), |x, y| x.merge(y))?;
    *model = model.clone().merge(total)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faux::{faux_from_msa, FauxOptions};
    use crate::gen_trace;
    use crate::msa::Msa;
    use crate::trace::tests::two_node_local;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    #[test]
    fn local_path() {
        let tr = two_node_local();
        let dsq = Alphabet::Dna.digitize(b"AN").unwrap();
        let mut model = CountModel::new(2, Alphabet::Dna);
        tr.count_into(&mut model, &dsq, 2.0).unwrap();
        assert_eq!(model.mat[1], vec![2.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.mat[2], vec![0.5; 4]);
        assert_eq!(model.t[1][TMM], 2.0);
        // Local entry and exit are not counted.
        let total: f32 = model.t.iter().flat_map(|row| row.iter()).sum();
        assert_eq!(total, 2.0);
        let mut small = CountModel::new(1, Alphabet::Dna);
        assert!(small.count_trace(&dsq, 1.0, &tr).is_err());
        let short = Alphabet::Dna.digitize(b"A").unwrap();
        assert!(model.count_trace(&short, 1.0, &tr).is_err());
    }
    #[test]
    fn glocal_edges() {
        let rows = vec![b"AC-T".to_vec(), b"-CGT".to_vec(), b"AC--".to_vec()];
        let names = (0..3).map(|i| format!("{}", i)).collect();
        let msa = Msa::new(Alphabet::Dna, names, &rows).unwrap();
        let matassign = vec![true, true, false, true];
        let mut traces = faux_from_msa(&msa, &matassign, FauxOptions::default()).unwrap();
        let mut model = CountModel::new(3, Alphabet::Dna);
        for (idx, tr) in traces.iter_mut().enumerate() {
            tr.doctor().unwrap();
            model.count_trace(&msa.ax[idx], 1.0, tr).unwrap();
        }
        assert_eq!(model.t[0][TMM], 2.0);
        assert_eq!(model.t[0][TMD], 1.0);
        assert_eq!(model.t[3][TMM], 2.0);
        assert_eq!(model.t[3][TDM], 1.0);
        assert_eq!(model.t[2][TMD], 1.0);
        assert_eq!(model.t[2][TMI], 1.0);
        assert_eq!(model.t[2][TIM], 1.0);
        assert_eq!(model.ins[2][2], 1.0);
        assert_eq!(model.mat[3][3], 2.0);
    }
    #[test]
    fn parallel_equals_sequential() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(9032);
        let gm = gen_trace::random_profile(&mut rng, 15, Alphabet::Amino).unwrap();
        let data: Vec<_> = (0..200)
            .map(|i| {
                let (tr, dsq) = gen_trace::sample_trace(&mut rng, &gm, 3).unwrap();
                (dsq, 1.0 + (i % 3) as f32, tr)
            })
            .collect();
        let mut seq = CountModel::new(15, Alphabet::Amino);
        for (dsq, weight, tr) in data.iter() {
            seq.count_trace(dsq, *weight, tr).unwrap();
        }
        let mut par = CountModel::new(15, Alphabet::Amino);
        count_traces(&mut par, &data).unwrap();
        let close = |xs: &[f32], ys: &[f32]| xs.iter().zip(ys).all(|(x, y)| (x - y).abs() < 1e-3);
        for k in 0..=15 {
            assert!(close(&seq.t[k], &par.t[k]));
            assert!(close(&seq.mat[k], &par.mat[k]));
            assert!(close(&seq.ins[k], &par.ins[k]));
        }
        let mut bad = CountModel::new(5, Alphabet::Amino);
        assert!(count_traces(&mut bad, &data).is_err());
        bad.zeros();
        assert!(bad.t.iter().all(|row| row.iter().all(|&x| x == 0f32)));
    }
    #[test]
    fn failed_count_leaves_model_untouched() {
        use StateType::*;
        let fresh = CountModel::new(2, Alphabet::Dna);
        let dsq = Alphabet::Dna.digitize(b"ACG").unwrap();
        // The third match node only shows up after two countable steps.
        let too_long = Trace::from_path(&[
            (S, 0, 0),
            (N, 0, 0),
            (B, 0, 0),
            (L, 0, 0),
            (ML, 1, 1),
            (ML, 2, 2),
            (ML, 3, 3),
            (E, 0, 0),
            (C, 0, 0),
            (T, 0, 0),
        ])
        .unwrap();
        let mut model = fresh.clone();
        assert!(model.count_trace(&dsq, 1.0, &too_long).is_err());
        assert_eq!(model, fresh);
        let tr = two_node_local();
        let short = Alphabet::Dna.digitize(b"A").unwrap();
        assert!(model.count_trace(&short, 1.0, &tr).is_err());
        assert_eq!(model, fresh);
        let mut d_to_i = Trace::new();
        let path = [
            (S, 0, 0),
            (N, 0, 0),
            (B, 0, 0),
            (G, 0, 0),
            (MG, 1, 1),
            (DG, 2, 0),
            (IG, 2, 2),
            (E, 0, 0),
        ];
        for &(s, k, i) in path.iter() {
            d_to_i.append(s, k, i).unwrap();
        }
        assert!(model.count_trace(&dsq, 1.0, &d_to_i).is_err());
        assert_eq!(model, fresh);
    }
    #[test]
    fn merge_shapes() {
        let mut a = CountModel::new(3, Alphabet::Dna);
        a.t[1][TMM] = 1.0;
        let mut b = CountModel::new(3, Alphabet::Dna);
        b.t[1][TMM] = 2.0;
        let merged = a.clone().merge(b).unwrap();
        assert_eq!(merged.t[1][TMM], 3.0);
        assert!(a.clone().merge(CountModel::new(4, Alphabet::Dna)).is_err());
        assert!(a.merge(CountModel::new(3, Alphabet::Amino)).is_err());
    }
}
