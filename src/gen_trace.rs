//! This module is to generate random profiles and valid traces to assess the performance
//! and consistency of the trace routines.
//! Usually, it would not be used in the real-applications.
use crate::alphabet::{Alphabet, SENTINEL};
use crate::error::Result;
use crate::profile::*;
use crate::state::StateType;
use crate::trace::Trace;
use rand::Rng;

/// Shape of the random paths drawn by `sample_trace_with`.
#[derive(Debug, Clone)]
pub struct TraceShape {
    pub min_domains: usize,
    pub max_domains: usize,
    /// Maximum number of residues in each N, J, C run.
    pub max_flank: usize,
    /// Probability that a domain is glocal.
    pub glocal_fraction: f64,
    pub delete_prob: f64,
    pub insert_prob: f64,
    pub with_pp: bool,
}

impl std::default::Default for TraceShape {
    fn default() -> Self {
        Self {
            min_domains: 1,
            max_domains: 1,
            max_flank: 10,
            glocal_fraction: 0.5,
            delete_prob: 0.1,
            insert_prob: 0.1,
            with_pp: false,
        }
    }
}

fn simplex<R: Rng>(rng: &mut R, n: usize) -> Vec<f32> {
    let xs: Vec<f32> = (0..n).map(|_| rng.gen_range(0.05f32..1f32)).collect();
    let sum: f32 = xs.iter().sum();
    xs.iter().map(|x| x / sum).collect()
}

/// A profile of `m` nodes with random but finite scores.
pub fn random_profile<R: Rng>(rng: &mut R, m: usize, abc: Alphabet) -> Result<Profile> {
    if m == 0 {
        return format_err!("a profile needs at least one node");
    }
    let mut gm = Profile::new(m, abc);
    let background = 1f32 / abc.k() as f32;
    for k in 1..=m {
        let emits: Vec<_> = simplex(rng, abc.k())
            .iter()
            .map(|p| (p / background).ln())
            .collect();
        gm.set_match(k, &emits)?;
        if k < m {
            let emits: Vec<_> = simplex(rng, abc.k())
                .iter()
                .map(|p| (p / background).ln())
                .collect();
            gm.set_insert(k, &emits)?;
        }
    }
    for k in 0..=m {
        let from_m = simplex(rng, 3);
        let from_i = simplex(rng, 2);
        let from_d = simplex(rng, 2);
        let row = &mut gm.tsc[k];
        row[MM] = from_m[0].ln();
        row[MI] = from_m[1].ln();
        row[MD] = from_m[2].ln();
        row[IM] = from_i[0].ln();
        row[II] = from_i[1].ln();
        row[DM] = from_d[0].ln();
        row[DD] = from_d[1].ln();
        row[LM] = (2f32 / (m * (m + 1)) as f32).ln();
    }
    let entry = simplex(rng, 2);
    gm.tsc[0][GM] = entry[0].ln();
    gm.tsc[0][GD] = entry[1].ln();
    for x in [XE, XN, XJ, XC].iter() {
        let p = rng.gen_range(0.01f32..0.99f32);
        gm.xsc[*x] = [p.ln(), (1f32 - p).ln()];
    }
    gm.xsc[XB] = [0.5f32.ln(), 0.5f32.ln()];
    Ok(gm)
}

/// A random canonical sequence of length `len`, digitized.
pub fn generate_seq<R: Rng>(rng: &mut R, abc: Alphabet, len: usize) -> Vec<u8> {
    std::iter::once(SENTINEL)
        .chain((0..len).map(|_| rng.gen_range(0..abc.k()) as u8))
        .collect()
}

/// Draw a valid, indexed trace through `gm` with at most `max_domains` domains,
/// together with the digital sequence it emits.
pub fn sample_trace<R: Rng>(
    rng: &mut R,
    gm: &Profile,
    max_domains: usize,
) -> Result<(Trace, Vec<u8>)> {
    let shape = TraceShape {
        max_domains: max_domains.max(1),
        ..TraceShape::default()
    };
    sample_trace_with(rng, gm, &shape)
}

struct Sampler<'a, R: Rng> {
    rng: &'a mut R,
    abc: Alphabet,
    tr: Trace,
    dsq: Vec<u8>,
    with_pp: bool,
}

impl<'a, R: Rng> Sampler<'a, R> {
    fn silent(&mut self, st: StateType, k: usize) -> Result<()> {
        if self.with_pp {
            self.tr.append_with_pp(st, k, 0, 0f32)
        } else {
            self.tr.append(st, k, 0)
        }
    }
    fn emit(&mut self, st: StateType, k: usize) -> Result<()> {
        self.dsq.push(self.rng.gen_range(0..self.abc.k()) as u8);
        let i = self.dsq.len() - 1;
        if self.with_pp {
            let pp = self.rng.gen_range(0f32..=1f32);
            self.tr.append_with_pp(st, k, i, pp)
        } else {
            self.tr.append(st, k, i)
        }
    }
    fn flank(&mut self, st: StateType, max_flank: usize) -> Result<()> {
        self.silent(st, 0)?;
        for _ in 0..self.rng.gen_range(0..=max_flank) {
            self.emit(st, 0)?;
        }
        Ok(())
    }
    fn domain(&mut self, m: usize, shape: &TraceShape) -> Result<()> {
        use StateType::*;
        self.silent(B, 0)?;
        let glocal = self.rng.gen_bool(shape.glocal_fraction);
        let (start, end, mat, ins, del) = if glocal {
            self.silent(G, 0)?;
            (1, m, MG, IG, DG)
        } else {
            self.silent(L, 0)?;
            let start = self.rng.gen_range(1..=m);
            (start, self.rng.gen_range(start..=m), ML, IL, DL)
        };
        // A local path enters on a match state; an insert must be followed by a match.
        let mut force_match = !glocal;
        for k in start..=end {
            let is_match = force_match || !self.rng.gen_bool(shape.delete_prob);
            if is_match {
                self.emit(mat, k)?;
            } else {
                self.silent(del, k)?;
            }
            force_match = false;
            if is_match && k < end && self.rng.gen_bool(shape.insert_prob) {
                for _ in 0..self.rng.gen_range(1..=3) {
                    self.emit(ins, k)?;
                }
                force_match = true;
            }
        }
        self.silent(E, 0)
    }
}

pub fn sample_trace_with<R: Rng>(
    rng: &mut R,
    gm: &Profile,
    shape: &TraceShape,
) -> Result<(Trace, Vec<u8>)> {
    use StateType::*;
    if gm.m == 0 {
        return format_err!("cannot sample a path through an empty profile");
    }
    let (lo, hi) = (shape.min_domains.max(1), shape.max_domains.max(1));
    if hi < lo {
        return format_err!("domain range {}..={} is empty", lo, hi);
    }
    let ndom = rng.gen_range(lo..=hi);
    let tr = if shape.with_pp {
        Trace::with_posteriors()
    } else {
        Trace::new()
    };
    let mut sampler = Sampler {
        rng,
        abc: gm.abc,
        tr,
        dsq: vec![SENTINEL],
        with_pp: shape.with_pp,
    };
    sampler.silent(S, 0)?;
    sampler.flank(N, shape.max_flank)?;
    for d in 0..ndom {
        sampler.domain(gm.m, shape)?;
        if d + 1 < ndom {
            sampler.flank(J, shape.max_flank)?;
        }
    }
    sampler.flank(C, shape.max_flank)?;
    sampler.silent(T, 0)?;
    let Sampler { mut tr, dsq, .. } = sampler;
    tr.index()?;
    Ok((tr, dsq))
}
