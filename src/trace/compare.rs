//! Comparing two traces, mostly for testing.
use super::Trace;
use crate::error::Result;

impl Trace {
    /// Strict comparison: same steps, posteriors within `pptol` (absolute) when both
    /// carry them, and the same domain index when both are indexed.
    pub fn compare(&self, other: &Trace, pptol: f32) -> Result<()> {
        if self.len() != other.len() {
            return invalid!("lengths differ: {} vs {}", self.len(), other.len());
        }
        let steps = self
            .states()
            .iter()
            .zip(self.nodes())
            .zip(self.positions())
            .zip(
                other
                    .states()
                    .iter()
                    .zip(other.nodes())
                    .zip(other.positions()),
            );
        for (z, (a, b)) in steps.enumerate() {
            if a != b {
                let ((sa, ka), ia) = a;
                let ((sb, kb), ib) = b;
                return invalid!(
                    "step {}: {}{} at {} vs {}{} at {}",
                    z,
                    sa,
                    ka,
                    ia,
                    sb,
                    kb,
                    ib
                );
            }
        }
        if let (Some(pa), Some(pb)) = (self.posteriors(), other.posteriors()) {
            if let Some(z) = (0..pa.len()).find(|&z| (pa[z] - pb[z]).abs() > pptol) {
                return invalid!("step {}: posterior {} vs {}", z, pa[z], pb[z]);
            }
        }
        if self.domain_count() != 0 && other.domain_count() != 0 {
            if self.domain_count() != other.domain_count() {
                return invalid!(
                    "{} domains vs {}",
                    self.domain_count(),
                    other.domain_count()
                );
            }
            let diff = self
                .domains()
                .iter()
                .zip(other.domains())
                .position(|(a, b)| a != b);
            if let Some(d) = diff {
                return invalid!(
                    "domain {}: {:?} vs {:?}",
                    d,
                    self.domains()[d],
                    other.domains()[d]
                );
            }
        }
        Ok(())
    }
    /// Loose comparison: the same residues of `dsq` are emitted by the same
    /// (state kind, node) in the same order, ignoring the local/glocal flavor,
    /// silent steps, and posteriors.
    pub fn compare_loosely(&self, other: &Trace, dsq: &[u8]) -> Result<()> {
        let emitted = |tr: &Trace| -> Vec<(usize, (crate::state::StateType, usize, usize))> {
            (0..tr.len())
                .filter(|&z| tr.emits(z))
                .map(|z| (z, (tr.st[z].fold(), tr.k[z], tr.i[z])))
                .collect()
        };
        let (xs, ys) = (emitted(self), emitted(other));
        if xs.len() != ys.len() {
            return invalid!("{} emitted residues vs {}", xs.len(), ys.len());
        }
        for (&(za, a), &(zb, b)) in xs.iter().zip(ys.iter()) {
            let (sa, ka, ia) = a;
            let (sb, kb, ib) = b;
            let (xa, xb) = (dsq.get(ia), dsq.get(ib));
            if xa.is_none() || xb.is_none() {
                return format_err!("position {} or {} beyond the sequence", ia, ib);
            }
            if sa != sb || ka != kb || xa != xb {
                return invalid!(
                    "steps {} and {}: {}{} at {} vs {}{} at {}",
                    za,
                    zb,
                    sa,
                    ka,
                    ia,
                    sb,
                    kb,
                    ib
                );
            }
        }
        Ok(())
    }
}
