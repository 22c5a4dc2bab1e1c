//! Tracebacks of digital sequences through profile HMMs.
//!
//! A [`Trace`] is the state path a DP backtrace (or an alignment) assigns to a
//! sequence. This crate builds, validates, indexes, scores, compares and counts
//! such paths. The profile, alphabet and alignment types are kept minimal; they only
//! carry what a trace needs.
#[macro_use]
extern crate log;
#[macro_use]
pub mod error;
pub mod alphabet;
pub mod count;
pub mod fasta;
pub mod faux;
pub mod gen_trace;
pub mod msa;
pub mod profile;
pub mod state;
pub mod trace;

pub use alphabet::Alphabet;
pub use error::{Result, TraceError};
pub use profile::Profile;
pub use state::StateType;
pub use trace::{Domain, Trace};
