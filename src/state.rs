//! State types of a profile traceback and the grammar connecting them.
//!
//! A trace is always relative to a profile (not a core HMM), so a minimal path is
//! `S->N->B->{L,G}->...->E->C->T`. Main states come in a local and a glocal flavor.
//! There are no I0 or IM states, and D1 in a glocal path is only reached by `G->D1`.

/// Number of distinct state codes, including the bogus code 0.
pub const NSTATETYPES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum StateType {
    ML = 1,
    MG = 2,
    IL = 3,
    IG = 4,
    DL = 5,
    DG = 6,
    S = 7,
    N = 8,
    B = 9,
    L = 10,
    G = 11,
    E = 12,
    C = 13,
    J = 14,
    T = 15,
}

use StateType::*;

const ALL_STATES: [StateType; NSTATETYPES - 1] =
    [ML, MG, IL, IG, DL, DG, S, N, B, L, G, E, C, J, T];

impl StateType {
    /// Decode a raw state code. Code 0 (and anything above 15) is bogus.
    pub fn decode(code: u8) -> Option<Self> {
        ALL_STATES.get((code as usize).wrapping_sub(1)).copied()
    }
    pub fn code(self) -> u8 {
        self as u8
    }
    pub fn name(self) -> &'static str {
        match self {
            ML => "ML",
            MG => "MG",
            IL => "IL",
            IG => "IG",
            DL => "DL",
            DG => "DG",
            S => "S",
            N => "N",
            B => "B",
            L => "L",
            G => "G",
            E => "E",
            C => "C",
            J => "J",
            T => "T",
        }
    }
    pub fn is_main(self) -> bool {
        (ML as u8..=DG as u8).contains(&(self as u8))
    }
    pub fn is_match(self) -> bool {
        matches!(self, ML | MG)
    }
    pub fn is_insert(self) -> bool {
        matches!(self, IL | IG)
    }
    pub fn is_delete(self) -> bool {
        matches!(self, DL | DG)
    }
    pub fn is_glocal(self) -> bool {
        matches!(self, G | MG | IG | DG)
    }
    pub fn is_local(self) -> bool {
        matches!(self, L | ML | IL | DL)
    }
    /// N, C and J emit on transition: only the trailing state of a run carries a residue.
    pub fn is_looping_special(self) -> bool {
        matches!(self, N | C | J)
    }
    /// Collapse the local/glocal distinction of main states.
    pub fn fold(self) -> Self {
        match self {
            MG => ML,
            IG => IL,
            DG => DL,
            x => x,
        }
    }
    /// Whether the step at this state emits, given the previous state on the path.
    pub fn emits_after(self, prev: Option<StateType>) -> bool {
        match self {
            ML | MG | IL | IG => true,
            _ if self.is_looping_special() => prev == Some(self),
            _ => false,
        }
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

const fn legal_table() -> [[bool; NSTATETYPES]; NSTATETYPES] {
    let mut table = [[false; NSTATETYPES]; NSTATETYPES];
    let (ml, mg, il, ig, dl, dg) = (1, 2, 3, 4, 5, 6);
    let (s, n, b, l, g, e, c, j, t) = (7, 8, 9, 10, 11, 12, 13, 14, 15);
    table[s][n] = true;
    table[n][n] = true;
    table[n][b] = true;
    table[b][l] = true;
    table[b][g] = true;
    table[l][ml] = true;
    table[g][mg] = true;
    table[g][dg] = true;
    table[ml][ml] = true;
    table[ml][il] = true;
    table[ml][dl] = true;
    table[ml][e] = true;
    table[mg][mg] = true;
    table[mg][ig] = true;
    table[mg][dg] = true;
    table[mg][e] = true;
    table[il][il] = true;
    table[il][ml] = true;
    table[ig][ig] = true;
    table[ig][mg] = true;
    table[dl][dl] = true;
    table[dl][ml] = true;
    table[dl][e] = true;
    table[dg][dg] = true;
    table[dg][mg] = true;
    table[dg][e] = true;
    table[e][c] = true;
    table[e][j] = true;
    table[j][j] = true;
    table[j][b] = true;
    table[c][c] = true;
    table[c][t] = true;
    table
}

/// `LEGAL[from][to]` is true when the state pair may be adjacent on a path.
/// Node relations (k+1, same k, k == M) are checked separately.
pub const LEGAL: [[bool; NSTATETYPES]; NSTATETYPES] = legal_table();

pub fn is_legal(from: StateType, to: StateType) -> bool {
    LEGAL[from as usize][to as usize]
}

/// Node relation between two adjacent steps whose state pair is legal.
/// `Err` carries a description of the violated rule.
pub fn check_nodes(
    from: StateType,
    kf: usize,
    to: StateType,
    kt: usize,
    m: usize,
) -> std::result::Result<(), &'static str> {
    match (from, to) {
        (G, MG) | (G, DG) if kt != 1 => Err("glocal entry must be at node 1"),
        (L, ML) if kt == 0 || m < kt => Err("local entry node out of range"),
        (ML, IL) | (MG, IG) | (IL, IL) | (IG, IG) if kf != kt => Err("insert must stay on node"),
        (ML, IL) | (MG, IG) if kt == m => Err("no insert state at node M"),
        (ML, ML) | (ML, DL) | (MG, MG) | (MG, DG) | (IL, ML) | (IG, MG) | (DL, DL)
        | (DL, ML) | (DG, DG) | (DG, MG)
            if kt != kf + 1 =>
        {
            Err("main state must advance one node")
        }
        (MG, E) | (DG, E) if kf != m => Err("glocal path must end at node M"),
        _ => Ok(()),
    }
}
