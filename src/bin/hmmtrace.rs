use clap::{App, Arg, SubCommand};
use hmmtrace::faux::{faux_from_msa, FauxOptions};
use hmmtrace::gen_trace::{random_profile, sample_trace_with, TraceShape};
use hmmtrace::{Alphabet, Trace};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use std::io::Write;
#[macro_use]
extern crate log;

fn verbose() -> Arg<'static, 'static> {
    Arg::with_name("verbose")
        .short("v")
        .multiple(true)
        .help("Debug mode")
}

fn subcommand_faux() -> App<'static, 'static> {
    SubCommand::with_name("faux")
        .version("0.1")
        .about("Faux traces from an aligned FASTA file, doctored and validated.")
        .arg(verbose())
        .arg(
            Arg::with_name("msa")
                .long("msa")
                .short("m")
                .value_name("FASTA")
                .takes_value(true)
                .required(true)
                .help("Aligned sequences. FASTA format, gaps as '-' or '.'."),
        )
        .arg(
            Arg::with_name("amino")
                .long("amino")
                .help("Protein alignment (default: DNA)."),
        )
        .arg(
            Arg::with_name("symfrac")
                .long("symfrac")
                .takes_value(true)
                .default_value("0.5")
                .help("Minimum residue fraction of a match column."),
        )
        .arg(
            Arg::with_name("raw_coords")
                .long("raw-coords")
                .help("Residue coordinates instead of alignment columns."),
        )
}

fn subcommand_simulate() -> App<'static, 'static> {
    SubCommand::with_name("simulate")
        .version("0.1")
        .about("Random profile and traces; compares the three score summations.")
        .arg(verbose())
        .arg(
            Arg::with_name("nodes")
                .long("nodes")
                .takes_value(true)
                .default_value("200")
                .help("Model length."),
        )
        .arg(
            Arg::with_name("domains")
                .long("domains")
                .takes_value(true)
                .default_value("3")
                .help("Maximum number of domains per trace."),
        )
        .arg(
            Arg::with_name("traces")
                .long("traces")
                .takes_value(true)
                .default_value("100")
                .help("Number of traces."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
        .arg(
            Arg::with_name("tolerance")
                .long("tolerance")
                .takes_value(true)
                .default_value("0.0001")
                .help("Relative tolerance between the summations."),
        )
}

fn parse<T: std::str::FromStr>(matches: &clap::ArgMatches, key: &str) -> anyhow::Result<T> {
    let value = matches
        .value_of(key)
        .ok_or_else(|| anyhow::anyhow!("missing --{}", key))?;
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("could not parse --{} {}", key, value))
}

fn faux(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let abc = if matches.is_present("amino") {
        Alphabet::Amino
    } else {
        Alphabet::Dna
    };
    let symfrac: f32 = parse(matches, "symfrac")?;
    let records = hmmtrace::fasta::read_fasta(&matches.value_of("msa"))?;
    let msa = hmmtrace::msa::Msa::from_records(abc, &records)?;
    let matassign = msa.assign_match_columns(symfrac);
    let opts = FauxOptions {
        msa_coords: !matches.is_present("raw_coords"),
    };
    let mut traces = faux_from_msa(&msa, &matassign, opts)?;
    let ncol = matassign.iter().filter(|&&b| b).count();
    let stdout = std::io::stdout();
    let mut wtr = std::io::BufWriter::new(stdout.lock());
    for (idx, tr) in traces.iter_mut().enumerate() {
        let (ndi, nid) = tr.doctor()?;
        let dsq = if opts.msa_coords {
            msa.ax[idx].clone()
        } else {
            msa.unaligned(idx)
        };
        tr.validate(abc, &dsq)?;
        writeln!(
            wtr,
            "#SEQ\t{}\tM={}\tDI={}\tID={}\tdomains={}",
            msa.names[idx],
            ncol,
            ndi,
            nid,
            tr.domain_count()
        )?;
        write!(wtr, "{}", tr)?;
    }
    Ok(())
}

fn simulate(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let nodes: usize = parse(matches, "nodes")?;
    let domains: usize = parse(matches, "domains")?;
    let num: usize = parse(matches, "traces")?;
    let seed: u64 = parse(matches, "seed")?;
    let tol: f32 = parse(matches, "tolerance")?;
    anyhow::ensure!(0 < nodes && 0 < domains, "--nodes and --domains must be positive");
    let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
    let gm = random_profile(&mut rng, nodes, Alphabet::Amino)?;
    let shape = TraceShape {
        max_domains: domains,
        ..TraceShape::default()
    };
    let samples: Vec<(Trace, Vec<u8>)> = (0..num)
        .map(|_| sample_trace_with(&mut rng, &gm, &shape))
        .collect::<hmmtrace::Result<_>>()?;
    debug!("Sampled {} traces", samples.len());
    let reports = samples
        .par_iter()
        .map(|(tr, dsq)| tr.validate(gm.abc, dsq).and_then(|_| tr.score_report(dsq, &gm, tol)))
        .collect::<hmmtrace::Result<Vec<_>>>()?;
    let stdout = std::io::stdout();
    let mut wtr = std::io::BufWriter::new(stdout.lock());
    writeln!(wtr, "ID\tSteps\tDomains\tNaive\tKahan\tBackwards\tConsistent")?;
    let mut inconsistent = 0;
    for (idx, ((tr, _), report)) in samples.iter().zip(reports.iter()).enumerate() {
        let ok = report.is_consistent(tol);
        inconsistent += !ok as usize;
        writeln!(
            wtr,
            "{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{}",
            idx,
            tr.len(),
            tr.domain_count(),
            report.naive,
            report.kahan,
            report.backwards,
            ok
        )?;
    }
    if 0 < inconsistent {
        warn!("{} of {} traces had inconsistent sums", inconsistent, num);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("hmmtrace")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Faux traces from alignments, or random traces for checking the scorers.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .subcommand(subcommand_faux())
        .subcommand(subcommand_simulate())
        .get_matches();
    if let Some(sub_m) = matches.subcommand().1 {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
    debug!("Start");
    match matches.subcommand() {
        ("faux", Some(sub_m)) => faux(sub_m),
        ("simulate", Some(sub_m)) => simulate(sub_m),
        _ => unreachable!(),
    }
}
