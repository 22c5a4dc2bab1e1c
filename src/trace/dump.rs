//! Text dumps of a trace and two plot streams (XY series and a heat map).
use super::Trace;
use crate::alphabet::Alphabet;
use crate::profile::Profile;
use std::io::{self, Write};

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "#TRACE\t{}\tM={}\tL={}", self.len(), self.m, self.l)?;
        for z in 0..self.len() {
            write!(f, "{}\t{}\t{}\t{}", z, self.st[z], self.k[z], self.i[z])?;
            if let Some(pp) = self.pp.as_ref() {
                write!(f, "\t{:.4}", pp[z])?;
            }
            writeln!(f)?;
        }
        for (d, dom) in self.domains().iter().enumerate() {
            writeln!(
                f,
                "#DOMAIN\t{}\t{}..{}\tsq {}..{}\thmm {}..{}",
                d, dom.tfrom, dom.tto, dom.sqfrom, dom.sqto, dom.hmmfrom, dom.hmmto
            )?;
        }
        Ok(())
    }
}

fn to_io(why: crate::error::TraceError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, why.to_string())
}

impl Trace {
    /// One line per step with its transition score to the next step, its emission
    /// score and the emitted residue; then the total.
    pub fn dump_annotated<W: Write>(
        &self,
        w: &mut W,
        gm: &Profile,
        abc: Alphabet,
        dsq: &[u8],
    ) -> io::Result<()> {
        writeln!(w, "#st\tk\ti\ttsc\tesc\tx")?;
        let mut total = 0f32;
        for z in 0..self.len() {
            let (st, k, i) = (self.st[z], self.k[z], self.i[z]);
            let tsc = if z + 1 < self.len() {
                gm.transition_score(st, k, self.st[z + 1], self.k[z + 1])
                    .map_err(to_io)?
            } else {
                0f32
            };
            let (esc, sym) = match dsq.get(i) {
                Some(&x) if i != 0 => {
                    let esc = if st.is_match() {
                        gm.match_score(k, x).map_err(to_io)?
                    } else if st.is_insert() {
                        gm.insert_score(k, x).map_err(to_io)?
                    } else {
                        0f32
                    };
                    (esc, abc.symbol(x) as char)
                }
                None if i != 0 => {
                    let msg = format!("position {} beyond the sequence", i);
                    return Err(io::Error::new(io::ErrorKind::InvalidData, msg));
                }
                _ => (0f32, '-'),
            };
            total += tsc + esc;
            writeln!(w, "{}\t{}\t{}\t{:.3}\t{:.3}\t{}", st, k, i, tsc, esc, sym)?;
        }
        writeln!(w, "#TOTAL\t{:.3}", total)
    }
    /// Three XY series for positions `ia..=ib`, separated by `&` lines:
    /// domain starts, domain ends, and whether the position lies inside a domain.
    pub fn plot_domain_inference<W: Write>(
        &self,
        w: &mut W,
        ia: usize,
        ib: usize,
    ) -> io::Result<()> {
        let doms = self.domains();
        let begins = |i: usize| doms.iter().filter(|d| d.sqfrom == i && i != 0).count();
        let ends = |i: usize| doms.iter().filter(|d| d.sqto == i && i != 0).count();
        let inside = |i: usize| {
            doms.iter()
                .any(|d| d.sqfrom != 0 && d.sqfrom <= i && i <= d.sqto)
        };
        for i in ia..=ib {
            writeln!(w, "{} {}", i, begins(i))?;
        }
        writeln!(w, "&")?;
        for i in ia..=ib {
            writeln!(w, "{} {}", i, ends(i))?;
        }
        writeln!(w, "&")?;
        for i in ia..=ib {
            writeln!(w, "{} {}", i, inside(i) as u8)?;
        }
        writeln!(w, "&")
    }
    /// Rows are positions `ia..=ib`, columns nodes `ka..=kb`. A cell holds the
    /// posterior (1.0 without posteriors) of the step emitting `i` from node `k`.
    pub fn plot_heat_map<W: Write>(
        &self,
        w: &mut W,
        ia: usize,
        ib: usize,
        ka: usize,
        kb: usize,
    ) -> io::Result<()> {
        if ib < ia || kb < ka {
            return Ok(());
        }
        let ncol = kb - ka + 1;
        let mut matrix = vec![vec![0f32; ncol]; ib - ia + 1];
        for z in 0..self.len() {
            let (st, k, i) = (self.st[z], self.k[z], self.i[z]);
            if st.is_main() && i != 0 && (ia..=ib).contains(&i) && (ka..=kb).contains(&k) {
                matrix[i - ia][k - ka] = self.pp.as_ref().map(|pp| pp[z]).unwrap_or(1f32);
            }
        }
        for row in matrix {
            let line: Vec<_> = row.iter().map(|x| format!("{:.4}", x)).collect();
            writeln!(w, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
