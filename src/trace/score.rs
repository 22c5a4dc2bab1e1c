//! Scoring a trace against a profile.
//!
//! The score of a path is the sum of the emission score of each step and the
//! transition score from each step to the next. N, C and J emissions score zero
//! (they are null-model log-odds). Three independent summations are provided so that
//! they can be checked against each other and against DP-computed scores.
use super::Trace;
use crate::error::{Result, TraceError};
use crate::profile::Profile;
use crate::state::StateType;

/// Results of the three summations of one trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreReport {
    pub naive: f32,
    pub kahan: f32,
    pub backwards: f32,
}

impl ScoreReport {
    /// True when all three sums agree within `tol`, relative to the magnitude of the score.
    pub fn is_consistent(&self, tol: f32) -> bool {
        let close = |a: f32, b: f32| {
            a == b || (a - b).abs() <= tol * a.abs().max(b.abs()).max(1f32)
        };
        close(self.naive, self.kahan) && close(self.naive, self.backwards)
    }
    /// The compensated score, or `NumericInconsistency` when the sums disagree.
    pub fn into_result(self, tol: f32) -> Result<f32> {
        if self.is_consistent(tol) {
            Ok(self.kahan)
        } else {
            Err(TraceError::NumericInconsistency {
                naive: self.naive,
                kahan: self.kahan,
                backwards: self.backwards,
            })
        }
    }
}

impl Trace {
    fn emission_score(&self, z: usize, dsq: &[u8], gm: &Profile) -> Result<f32> {
        let (st, k, i) = (self.st[z], self.k[z], self.i[z]);
        if i == 0 {
            return Ok(0f32);
        }
        let x = match dsq.get(i) {
            Some(&x) => x,
            None => return format_err!("step {}: position {} beyond the sequence", z, i),
        };
        if st.is_match() {
            gm.match_score(k, x)
        } else if st.is_insert() {
            gm.insert_score(k, x)
        } else {
            Ok(0f32)
        }
    }
    fn transition_to_next(&self, z: usize, gm: &Profile) -> Result<f32> {
        gm.transition_score(self.st[z], self.k[z], self.st[z + 1], self.k[z + 1])
    }
    /// The sums skip the emission of the last step, which only holds for T.
    fn check_terminated(&self) -> Result<()> {
        match self.states().last() {
            Some(&st) if st != StateType::T => {
                format_err!("trace ends in {}, not T", st)
            }
            _ => Ok(()),
        }
    }
    /// Plain left-to-right summation. An empty trace scores -inf.
    pub fn score(&self, dsq: &[u8], gm: &Profile) -> Result<f32> {
        if self.is_empty() {
            return Ok(f32::NEG_INFINITY);
        }
        self.check_terminated()?;
        let mut sc = 0f32;
        for z in 0..self.len() - 1 {
            sc += self.emission_score(z, dsq, gm)?;
            sc += self.transition_to_next(z, gm)?;
        }
        Ok(sc)
    }
    /// Left-to-right Kahan summation, for long paths where round-off accumulates.
    pub fn score_kahan(&self, dsq: &[u8], gm: &Profile) -> Result<f32> {
        if self.is_empty() {
            return Ok(f32::NEG_INFINITY);
        }
        self.check_terminated()?;
        let mut sum = KahanSum::default();
        for z in 0..self.len() - 1 {
            sum.add(self.emission_score(z, dsq, gm)?);
            sum.add(self.transition_to_next(z, gm)?);
        }
        Ok(sum.value())
    }
    /// Right-to-left summation, T back to S.
    pub fn score_backwards(&self, dsq: &[u8], gm: &Profile) -> Result<f32> {
        if self.is_empty() {
            return Ok(f32::NEG_INFINITY);
        }
        self.check_terminated()?;
        let mut sc = 0f32;
        for z in (1..self.len()).rev() {
            sc += self.emission_score(z, dsq, gm)?;
            sc += self.transition_to_next(z - 1, gm)?;
        }
        sc += self.emission_score(0, dsq, gm)?;
        Ok(sc)
    }
    /// Score of the indexed domain `which`, from its B through its E.
    pub fn score_domain(&self, dsq: &[u8], gm: &Profile, which: usize) -> Result<f32> {
        let dom = *self.domain_coords(which)?;
        let mut sc = 0f32;
        for z in dom.tfrom..dom.tto {
            sc += self.emission_score(z, dsq, gm)?;
            sc += self.transition_to_next(z, gm)?;
        }
        Ok(sc)
    }
    /// All three summations. Disagreement beyond `tol` is logged, not returned as an error.
    pub fn score_report(&self, dsq: &[u8], gm: &Profile, tol: f32) -> Result<ScoreReport> {
        let report = ScoreReport {
            naive: self.score(dsq, gm)?,
            kahan: self.score_kahan(dsq, gm)?,
            backwards: self.score_backwards(dsq, gm)?,
        };
        if !report.is_consistent(tol) {
            warn!(
                "SCORE\tINCONSISTENT\t{}\t{}\t{}\t{}",
                self.len(),
                report.naive,
                report.kahan,
                report.backwards
            );
        }
        Ok(report)
    }
    /// Mean posterior probability over the emitted residues.
    pub fn expected_accuracy(&self) -> Result<f32> {
        let pp = match self.posteriors() {
            Some(pp) => pp,
            None => return format_err!("trace has no posterior probabilities"),
        };
        let (sum, count) = pp
            .iter()
            .zip(self.positions())
            .filter(|&(_, &i)| i != 0)
            .fold((0f32, 0usize), |(sum, count), (&p, _)| (sum + p, count + 1));
        if count == 0 {
            Ok(0f32)
        } else {
            Ok(sum / count as f32)
        }
    }
    /// Number of emitting steps of each kind: (match, insert, flanking N/C/J).
    pub fn emission_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for (&st, &i) in self.states().iter().zip(self.positions()) {
            match st {
                _ if i == 0 => {}
                StateType::ML | StateType::MG => counts.0 += 1,
                StateType::IL | StateType::IG => counts.1 += 1,
                _ => counts.2 += 1,
            }
        }
        counts
    }
}

/// Compensated summation with an f32 running error term.
#[derive(Debug, Clone, Copy, Default)]
struct KahanSum {
    sum: f32,
    compensation: f32,
}

impl KahanSum {
    fn add(&mut self, x: f32) {
        if !x.is_finite() || !self.sum.is_finite() {
            self.sum += x;
            return;
        }
        let y = x - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }
    fn value(&self) -> f32 {
        self.sum
    }
}
