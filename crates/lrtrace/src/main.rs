use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lrtrace::{driver, lalr, lr1::Automaton, report::Report, syntax, table::ParseTable};
use std::{
    fs,
    io::Read as _,
    path::PathBuf,
    time::Instant,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The algorithm used to build the LR automaton.
    #[arg(long, value_enum, default_value_t = Algorithm::Canonical)]
    algorithm: Algorithm,

    /// The path of the grammar/input file; standard input when omitted.
    input: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Algorithm {
    Canonical,
    Lalr,
}

impl From<Algorithm> for lalr::Mode {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Canonical => lalr::Mode::Canonical,
            Algorithm::Lalr => lalr::Mode::Lalr,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    let source = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| anyhow::anyhow!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read the standard input")?;
            buf
        }
    };

    let spec = syntax::parse(&source).context("malformed grammar input")?;

    let s = Instant::now();
    let canonical = Automaton::generate(&spec.grammar);
    tracing::info!(
        "canonical automaton: {} states, {:?} elapsed",
        canonical.state_count(),
        s.elapsed()
    );

    let mode = lalr::Mode::from(args.algorithm);
    let automaton = match mode {
        lalr::Mode::Canonical => canonical,
        lalr::Mode::Lalr => {
            let s = Instant::now();
            let (merged, _mapping) = lalr::merge(&canonical)?;
            tracing::info!(
                "lalr merge: {} states, {:?} elapsed",
                merged.state_count(),
                s.elapsed()
            );
            merged
        }
    };

    let table = ParseTable::build(&spec.grammar, &automaton);
    if table.has_conflicts() {
        tracing::warn!("{} conflict(s) detected", table.conflicts().len());
    }

    let trace = driver::run(&table, &spec.input)?;

    print!(
        "{}",
        Report::new(&spec.grammar, &automaton, &table, &trace, mode)
    );

    Ok(())
}
