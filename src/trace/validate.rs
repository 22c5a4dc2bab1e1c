//! Consistency checks on a finished, forward-oriented trace. Meant for tests and
//! debugging, not for the hot path.
use super::Trace;
use crate::alphabet::Alphabet;
use crate::error::Result;
use crate::state::{check_nodes, is_legal, StateType};

impl Trace {
    /// Check the path against the state grammar and the coordinate invariants.
    /// `dsq` is the digital sequence the positions refer to (`dsq[1..=L]`).
    /// An empty trace ("no path") is valid.
    pub fn validate(&self, abc: Alphabet, dsq: &[u8]) -> Result<()> {
        use StateType::*;
        let n = self.len();
        if n == 0 {
            return Ok(());
        }
        let (st, ks, is) = (self.states(), self.nodes(), self.positions());
        let seqlen = dsq.len().saturating_sub(1);
        let m = self.model_length();
        if st[0] != S {
            return invalid!("first state is {}, not S", st[0]);
        }
        if n < 2 || st[1] != N {
            return invalid!("second state is not N");
        }
        if st[n - 1] != T {
            return invalid!("last state is {}, not T", st[n - 1]);
        }
        if st[n - 2] != C {
            return invalid!("state before T is {}, not C", st[n - 2]);
        }
        let mut last_pos = 0;
        let mut nb = 0;
        // Some(true) inside a glocal domain, Some(false) inside a local one.
        let mut mode: Option<bool> = None;
        for z in 0..n {
            let (s, k, i) = (st[z], ks[z], is[z]);
            if s.is_main() && (k == 0 || m < k) {
                return invalid!("step {}: {} node {} outside 1..={}", z, s, k, m);
            }
            if !s.is_main() && k != 0 {
                return invalid!("step {}: {} carries node {}", z, s, k);
            }
            let prev = z.checked_sub(1).map(|y| st[y]);
            let emits = s.emits_after(prev);
            if emits {
                if i == 0 {
                    return invalid!("step {}: {} should emit", z, s);
                }
                if i <= last_pos {
                    return invalid!("step {}: position {} after {}", z, i, last_pos);
                }
                if seqlen < i {
                    return invalid!("step {}: position {} beyond L={}", z, i, seqlen);
                }
                if !abc.is_residue(dsq[i]) {
                    return invalid!("step {}: position {} is not a residue", z, i);
                }
                last_pos = i;
            } else if i != 0 {
                return invalid!("step {}: {} cannot emit position {}", z, s, i);
            }
            if let Some(pp) = self.posteriors() {
                let p = pp[z];
                if emits && !(0f32..=1f32).contains(&p) {
                    return invalid!("step {}: posterior {} outside [0,1]", z, p);
                }
                if !emits && p != 0f32 {
                    return invalid!("step {}: posterior {} on a non-emitting step", z, p);
                }
            }
            match s {
                B => nb += 1,
                L => mode = Some(false),
                G => mode = Some(true),
                E => mode = None,
                _ if s.is_main() => match mode {
                    Some(glocal) if glocal == s.is_glocal() => {}
                    Some(_) => return invalid!("step {}: {} mixes local and glocal", z, s),
                    None => return invalid!("step {}: {} outside a domain", z, s),
                },
                _ => {}
            }
            if let (Some(&next), Some(&kn)) = (st.get(z + 1), ks.get(z + 1)) {
                if !is_legal(s, next) {
                    return invalid!("step {}: illegal transition {} -> {}", z, s, next);
                }
                if let Err(why) = check_nodes(s, k, next, kn, m) {
                    return invalid!("step {}: {}{} -> {}{}: {}", z, s, k, next, kn, why);
                }
            }
        }
        if self.domain_count() != 0 && self.domain_count() != nb {
            return invalid!("{} domains indexed but {} B states", self.domain_count(), nb);
        }
        Ok(())
    }
}
