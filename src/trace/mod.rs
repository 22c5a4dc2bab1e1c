//! Traceback of a digital sequence through a profile.
//!
//! A trace only makes sense in a triplet (trace, profile, dsq): nodes are 1..=M and
//! positions are 1..=L. The steps are stored as parallel arrays, and the buffer keeps
//! an explicit length/capacity pair so that a worker can build, use and `reuse` one
//! trace per sequence without reallocating.
//!
//! During a DP backtrace the path is appended from T back to S, then `reverse`d and
//! `index`ed. Traces faked from an alignment may use column coordinates instead of
//! residue coordinates; see `crate::faux`.
use crate::error::{Result, TraceError};
use crate::state::{StateType, NSTATETYPES};

pub mod compare;
pub mod dump;
pub mod score;
pub mod validate;

const INIT_ALLOC: usize = 16;
const INIT_DOM_ALLOC: usize = 4;

/// One B..E span of a trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Domain {
    /// Index of the B step.
    pub tfrom: usize,
    /// Index of the E step.
    pub tto: usize,
    /// First and last residue emitted by a match state, 0 when there is none.
    pub sqfrom: usize,
    pub sqto: usize,
    /// First and last node visited by a match or delete state, 0 when there is none.
    pub hmmfrom: usize,
    pub hmmto: usize,
}

#[derive(Debug, Clone)]
pub struct Trace {
    /// Number of steps in use. 0 means "no path".
    pub(crate) n: usize,
    /// Allocated length of every per-step array.
    pub(crate) nalloc: usize,
    pub(crate) st: Vec<StateType>,
    /// Node index, 1..=M for main states, 0 otherwise.
    pub(crate) k: Vec<usize>,
    /// Emitted position, 1..=L for emitting steps, 0 otherwise.
    pub(crate) i: Vec<usize>,
    /// Posterior probability of the emitted residue, 0.0 for non-emitting steps.
    pub(crate) pp: Option<Vec<f32>>,
    /// Largest node seen.
    pub(crate) m: usize,
    /// Largest position seen.
    pub(crate) l: usize,
    pub(crate) ndom: usize,
    pub(crate) ndomalloc: usize,
    pub(crate) domains: Vec<Domain>,
    pub(crate) growths: usize,
}

impl std::default::Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    pub fn create(with_pp: bool) -> Self {
        Self {
            n: 0,
            nalloc: INIT_ALLOC,
            st: vec![StateType::S; INIT_ALLOC],
            k: vec![0; INIT_ALLOC],
            i: vec![0; INIT_ALLOC],
            pp: with_pp.then(|| vec![0f32; INIT_ALLOC]),
            m: 0,
            l: 0,
            ndom: 0,
            ndomalloc: INIT_DOM_ALLOC,
            domains: vec![Domain::default(); INIT_DOM_ALLOC],
            growths: 0,
        }
    }
    pub fn new() -> Self {
        Self::create(false)
    }
    pub fn with_posteriors() -> Self {
        Self::create(true)
    }
    /// Build a trace from forward-ordered `(state, k, i)` steps and index it.
    pub fn from_path(path: &[(StateType, usize, usize)]) -> Result<Self> {
        let mut tr = Self::new();
        tr.grow_to(path.len())?;
        for &(st, k, i) in path {
            tr.append(st, k, i)?;
        }
        tr.index()?;
        Ok(tr)
    }
    /// Same as `from_path` with a posterior per step.
    pub fn from_path_with_pp(path: &[(StateType, usize, usize, f32)]) -> Result<Self> {
        let mut tr = Self::with_posteriors();
        tr.grow_to(path.len())?;
        for &(st, k, i, pp) in path {
            tr.append_with_pp(st, k, i, pp)?;
        }
        tr.index()?;
        Ok(tr)
    }
    /// Forget the path and its domains, keeping the allocation.
    pub fn reuse(&mut self) {
        self.n = 0;
        self.ndom = 0;
        self.m = 0;
        self.l = 0;
    }
    /// Double the allocation if the trace is full.
    pub fn grow(&mut self) -> Result<()> {
        if self.n < self.nalloc {
            Ok(())
        } else {
            self.grow_to((2 * self.nalloc).max(INIT_ALLOC))
        }
    }
    /// Make room for at least `nalloc` steps. Never shrinks.
    /// Either every array grows or the trace is left as it was.
    pub fn grow_to(&mut self, nalloc: usize) -> Result<()> {
        if nalloc <= self.nalloc {
            return Ok(());
        }
        let extra = nalloc - self.nalloc;
        self.st.try_reserve_exact(extra)?;
        self.k.try_reserve_exact(extra)?;
        self.i.try_reserve_exact(extra)?;
        if let Some(pp) = self.pp.as_mut() {
            pp.try_reserve_exact(extra)?;
        }
        self.st.resize(nalloc, StateType::S);
        self.k.resize(nalloc, 0);
        self.i.resize(nalloc, 0);
        if let Some(pp) = self.pp.as_mut() {
            pp.resize(nalloc, 0f32);
        }
        trace!("GROW\t{}\t{}", self.nalloc, nalloc);
        self.nalloc = nalloc;
        self.growths += 1;
        Ok(())
    }
    /// Double the domain index allocation if it is full.
    pub fn grow_index(&mut self) -> Result<()> {
        if self.ndom < self.ndomalloc {
            Ok(())
        } else {
            self.grow_index_to((2 * self.ndomalloc).max(INIT_DOM_ALLOC))
        }
    }
    pub fn grow_index_to(&mut self, ndomalloc: usize) -> Result<()> {
        if ndomalloc <= self.ndomalloc {
            return Ok(());
        }
        self.domains.try_reserve_exact(ndomalloc - self.ndomalloc)?;
        self.domains.resize(ndomalloc, Domain::default());
        self.ndomalloc = ndomalloc;
        Ok(())
    }
    fn check_step(st: StateType, k: usize, i: usize) -> Result<()> {
        use StateType::*;
        if st.is_main() && k == 0 {
            return format_err!("main state {} needs a node", st);
        }
        if !st.is_main() && k != 0 {
            return format_err!("special state {} cannot have node {}", st, k);
        }
        match st {
            ML | MG | IL | IG if i == 0 => format_err!("{}{} must emit", st, k),
            DL | DG | S | B | L | G | E | T if i != 0 => {
                format_err!("{} cannot emit position {}", st, i)
            }
            _ => Ok(()),
        }
    }
    /// Append one step. On a trace with posteriors the step gets pp = 0.
    pub fn append(&mut self, st: StateType, k: usize, i: usize) -> Result<()> {
        Self::check_step(st, k, i)?;
        self.grow()?;
        self.push_unchecked(st, k, i, 0f32);
        Ok(())
    }
    pub fn append_with_pp(&mut self, st: StateType, k: usize, i: usize, pp: f32) -> Result<()> {
        if self.pp.is_none() {
            return format_err!("trace has no posterior storage");
        }
        Self::check_step(st, k, i)?;
        self.grow()?;
        self.push_unchecked(st, k, i, pp);
        Ok(())
    }
    fn push_unchecked(&mut self, st: StateType, k: usize, i: usize, pp: f32) {
        let z = self.n;
        self.st[z] = st;
        self.k[z] = k;
        self.i[z] = i;
        if let Some(pps) = self.pp.as_mut() {
            pps[z] = pp;
        }
        self.m = self.m.max(k);
        self.l = self.l.max(i);
        self.n += 1;
    }
    /// Reverse the steps in place. Backtraces are collected T->S; this makes them S->T.
    /// The domain index is left alone; call `index` afterwards.
    pub fn reverse(&mut self) {
        let n = self.n;
        self.st[..n].reverse();
        self.k[..n].reverse();
        self.i[..n].reverse();
        if let Some(pp) = self.pp.as_mut() {
            pp[..n].reverse();
        }
    }
    /// Rebuild the domain index with one forward scan over a forward-oriented trace.
    /// Domains are recorded in the order their B appears.
    pub fn index(&mut self) -> Result<()> {
        self.ndom = 0;
        let result = self.index_inner();
        if result.is_err() {
            self.ndom = 0;
        }
        result
    }
    fn index_inner(&mut self) -> Result<()> {
        use StateType::*;
        let mut open: Option<Domain> = None;
        for z in 0..self.n {
            let (k, i) = (self.k[z], self.i[z]);
            match self.st[z] {
                B => {
                    if open.is_some() {
                        return format_err!("B at step {} inside an open domain", z);
                    }
                    open = Some(Domain {
                        tfrom: z,
                        ..Domain::default()
                    });
                }
                ML | MG => match open.as_mut() {
                    Some(dom) => {
                        dom.sqfrom = if dom.sqfrom == 0 { i } else { dom.sqfrom.min(i) };
                        dom.sqto = dom.sqto.max(i);
                        dom.hmmfrom = if dom.hmmfrom == 0 { k } else { dom.hmmfrom.min(k) };
                        dom.hmmto = dom.hmmto.max(k);
                    }
                    None => return format_err!("{} at step {} outside any domain", self.st[z], z),
                },
                DL | DG => match open.as_mut() {
                    Some(dom) => {
                        dom.hmmfrom = if dom.hmmfrom == 0 { k } else { dom.hmmfrom.min(k) };
                        dom.hmmto = dom.hmmto.max(k);
                    }
                    None => return format_err!("{} at step {} outside any domain", self.st[z], z),
                },
                IL | IG if open.is_none() => {
                    return format_err!("{} at step {} outside any domain", self.st[z], z);
                }
                E => match open.take() {
                    Some(mut dom) => {
                        dom.tto = z;
                        self.grow_index()?;
                        self.domains[self.ndom] = dom;
                        self.ndom += 1;
                    }
                    None => return format_err!("E at step {} without a matching B", z),
                },
                _ => {}
            }
        }
        match open {
            Some(dom) => format_err!("B at step {} is never closed by E", dom.tfrom),
            None => Ok(()),
        }
    }
    /// Declare the model and sequence lengths. They may only exceed what the path shows.
    pub fn set_lengths(&mut self, m: usize, l: usize) -> Result<()> {
        if m < self.max_node() || l < self.max_position() {
            return format_err!(
                "lengths M={} L={} smaller than the path's {} and {}",
                m,
                l,
                self.max_node(),
                self.max_position()
            );
        }
        self.m = m;
        self.l = l;
        Ok(())
    }
    fn max_node(&self) -> usize {
        self.nodes().iter().copied().max().unwrap_or(0)
    }
    fn max_position(&self) -> usize {
        self.positions().iter().copied().max().unwrap_or(0)
    }
    pub fn len(&self) -> usize {
        self.n
    }
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
    pub fn capacity(&self) -> usize {
        self.nalloc
    }
    pub fn index_capacity(&self) -> usize {
        self.ndomalloc
    }
    /// Number of times the step arrays were reallocated.
    pub fn growth_events(&self) -> usize {
        self.growths
    }
    pub fn states(&self) -> &[StateType] {
        &self.st[..self.n]
    }
    pub fn nodes(&self) -> &[usize] {
        &self.k[..self.n]
    }
    pub fn positions(&self) -> &[usize] {
        &self.i[..self.n]
    }
    pub fn posteriors(&self) -> Option<&[f32]> {
        self.pp.as_ref().map(|pp| &pp[..self.n])
    }
    pub fn has_posteriors(&self) -> bool {
        self.pp.is_some()
    }
    /// Model length: the largest node seen, unless declared larger.
    pub fn model_length(&self) -> usize {
        self.m
    }
    /// Sequence length: the largest position seen, unless declared larger.
    pub fn seq_length(&self) -> usize {
        self.l
    }
    pub fn domain_count(&self) -> usize {
        self.ndom
    }
    pub fn domains(&self) -> &[Domain] {
        &self.domains[..self.ndom]
    }
    pub fn domain_coords(&self, which: usize) -> Result<&Domain> {
        self.domains().get(which).ok_or_else(|| {
            TraceError::Format(format!("no domain {} in a trace of {}", which, self.ndom))
        })
    }
    /// How many times each state code is used; index by `StateType as usize`.
    pub fn state_use_counts(&self) -> [usize; NSTATETYPES] {
        let mut counts = [0; NSTATETYPES];
        for &st in self.states() {
            counts[st as usize] += 1;
        }
        counts
    }
    /// Whether step `z` carries a residue.
    pub fn emits(&self, z: usize) -> bool {
        self.i[z] != 0
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use StateType::*;
    pub fn two_node_local() -> Trace {
        let path = [
            (S, 0, 0),
            (N, 0, 0),
            (B, 0, 0),
            (L, 0, 0),
            (ML, 1, 1),
            (ML, 2, 2),
            (E, 0, 0),
            (C, 0, 0),
            (T, 0, 0),
        ];
        Trace::from_path(&path).unwrap()
    }
    #[test]
    fn index_two_node_local() {
        let tr = two_node_local();
        assert_eq!(tr.domain_count(), 1);
        let dom = tr.domain_coords(0).unwrap();
        assert_eq!((dom.sqfrom, dom.sqto), (1, 2));
        assert_eq!((dom.hmmfrom, dom.hmmto), (1, 2));
        assert_eq!((dom.tfrom, dom.tto), (2, 6));
        assert_eq!((tr.model_length(), tr.seq_length()), (2, 2));
        assert!(tr.domain_coords(1).is_err());
    }
    #[test]
    fn one_growth_event() {
        let mut tr = Trace::new();
        let cap = tr.capacity();
        tr.append(S, 0, 0).unwrap();
        tr.append(N, 0, 0).unwrap();
        for i in 1..cap - 1 {
            tr.append(N, 0, i).unwrap();
        }
        assert_eq!(tr.len(), cap);
        assert_eq!(tr.growth_events(), 0);
        tr.append(N, 0, cap - 1).unwrap();
        assert_eq!(tr.growth_events(), 1);
        assert!(tr.capacity() > cap);
        assert_eq!(tr.len(), cap + 1);
        assert_eq!(tr.states()[0], S);
        for (z, &i) in tr.positions().iter().enumerate().skip(2) {
            assert_eq!(i, z - 1);
        }
    }
    #[test]
    fn failed_growth_keeps_trace() {
        let mut tr = two_node_local();
        let before = tr.clone();
        let (len, cap, growths) = (tr.len(), tr.capacity(), tr.growth_events());
        match tr.grow_to(usize::MAX) {
            Err(TraceError::Allocation(_)) => {}
            x => panic!("{:?}", x),
        }
        assert_eq!((tr.len(), tr.capacity(), tr.growth_events()), (len, cap, growths));
        assert_eq!(tr.states(), before.states());
        assert_eq!(tr.nodes(), before.nodes());
        assert_eq!(tr.positions(), before.positions());
        assert_eq!(tr.domains(), before.domains());
        tr.append(T, 0, 0).unwrap();
        assert_eq!(tr.len(), len + 1);
    }
    #[test]
    fn rejected_append_keeps_length() {
        let mut tr = Trace::new();
        tr.append(S, 0, 0).unwrap();
        assert!(tr.append(ML, 0, 1).is_err());
        assert!(tr.append(B, 3, 0).is_err());
        assert!(tr.append(DG, 2, 5).is_err());
        assert!(tr.append(IG, 2, 0).is_err());
        assert!(tr.append_with_pp(N, 0, 0, 0.0).is_err());
        assert_eq!(tr.len(), 1);
    }
    #[test]
    fn reverse_is_involution() {
        let tr = two_node_local();
        let mut rev = tr.clone();
        rev.reverse();
        assert_eq!(rev.states()[0], T);
        assert_eq!(rev.nodes()[3], 2);
        rev.reverse();
        assert_eq!(rev.states(), tr.states());
        assert_eq!(rev.nodes(), tr.nodes());
        assert_eq!(rev.positions(), tr.positions());
    }
    #[test]
    fn backtrace_order() {
        let mut tr = Trace::with_posteriors();
        let rev = [
            (T, 0, 0, 0.0),
            (C, 0, 0, 0.0),
            (E, 0, 0, 0.0),
            (MG, 2, 2, 0.9),
            (MG, 1, 1, 0.8),
            (G, 0, 0, 0.0),
            (B, 0, 0, 0.0),
            (N, 0, 0, 0.0),
            (S, 0, 0, 0.0),
        ];
        for &(st, k, i, pp) in rev.iter() {
            tr.append_with_pp(st, k, i, pp).unwrap();
        }
        tr.reverse();
        tr.index().unwrap();
        assert_eq!(tr.states()[0], S);
        assert_eq!(tr.posteriors().unwrap()[4], 0.8);
        assert_eq!(tr.domain_count(), 1);
    }
    #[test]
    fn index_is_idempotent() {
        let mut tr = two_node_local();
        let first = tr.domains().to_vec();
        tr.index().unwrap();
        tr.index().unwrap();
        assert_eq!(tr.domains(), first.as_slice());
    }
    #[test]
    fn adjacent_and_empty_domains() {
        let path = [
            (S, 0, 0),
            (N, 0, 0),
            (B, 0, 0),
            (G, 0, 0),
            (DG, 1, 0),
            (DG, 2, 0),
            (E, 0, 0),
            (J, 0, 0),
            (B, 0, 0),
            (L, 0, 0),
            (ML, 2, 1),
            (E, 0, 0),
            (J, 0, 0),
            (J, 0, 2),
            (B, 0, 0),
            (L, 0, 0),
            (ML, 1, 3),
            (DL, 2, 0),
            (E, 0, 0),
            (C, 0, 0),
            (T, 0, 0),
        ];
        let tr = Trace::from_path(&path).unwrap();
        let doms = tr.domains();
        assert_eq!(doms.len(), 3);
        assert_eq!((doms[0].sqfrom, doms[0].sqto), (0, 0));
        assert_eq!((doms[0].hmmfrom, doms[0].hmmto), (1, 2));
        assert_eq!((doms[1].tfrom, doms[1].tto), (8, 11));
        assert_eq!((doms[1].sqfrom, doms[1].hmmfrom), (1, 2));
        assert_eq!((doms[2].sqfrom, doms[2].sqto), (3, 3));
        assert_eq!((doms[2].hmmfrom, doms[2].hmmto), (1, 2));
        assert!(doms.windows(2).all(|w| w[0].tto < w[1].tfrom));
    }
    #[test]
    fn unmatched_domain_boundaries() {
        let mut tr = Trace::new();
        for &(st, k, i) in [(S, 0, 0), (N, 0, 0), (B, 0, 0), (L, 0, 0), (ML, 1, 1)].iter() {
            tr.append(st, k, i).unwrap();
        }
        assert!(tr.index().is_err());
        assert_eq!(tr.domain_count(), 0);
        let mut tr = Trace::new();
        for &(st, k, i) in [(S, 0, 0), (N, 0, 0), (E, 0, 0)].iter() {
            tr.append(st, k, i).unwrap();
        }
        assert!(tr.index().is_err());
    }
    #[test]
    fn many_domains_grow_index() {
        let mut tr = Trace::new();
        tr.append(S, 0, 0).unwrap();
        tr.append(N, 0, 0).unwrap();
        let ndom = 3 * tr.index_capacity() + 1;
        for d in 0..ndom {
            tr.append(B, 0, 0).unwrap();
            tr.append(L, 0, 0).unwrap();
            tr.append(ML, 1, d + 1).unwrap();
            tr.append(E, 0, 0).unwrap();
            tr.append(if d + 1 == ndom { C } else { J }, 0, 0).unwrap();
        }
        tr.append(T, 0, 0).unwrap();
        tr.index().unwrap();
        assert_eq!(tr.domain_count(), ndom);
        assert!(tr.index_capacity() >= ndom);
        assert_eq!(tr.domain_coords(ndom - 1).unwrap().sqfrom, ndom);
    }
    #[test]
    fn reuse_keeps_capacity() {
        let mut tr = Trace::new();
        tr.grow_to(1000).unwrap();
        let cap = tr.capacity();
        tr.append(S, 0, 0).unwrap();
        tr.reuse();
        assert!(tr.is_empty());
        assert_eq!(tr.capacity(), cap);
        assert_eq!(tr.domain_count(), 0);
        tr.grow_to(10).unwrap();
        assert_eq!(tr.capacity(), cap);
    }
    #[test]
    fn use_counts() {
        let tr = two_node_local();
        let counts = tr.state_use_counts();
        assert_eq!(counts[ML as usize], 2);
        assert_eq!(counts[S as usize], 1);
        assert_eq!(counts.iter().sum::<usize>(), tr.len());
    }
}
