use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use csgit::commands::{add, blame as blame_cmd, commit, diff as diff_cmd, init, log as log_cmd, status, summary, validate};
use csgit::store::{GitStore, RevisionStore};
use csgit::visual::Axis;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AxisArg {
    X,
    Y,
    Z,
}

impl From<AxisArg> for Axis {
    fn from(a: AxisArg) -> Axis {
        match a {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Z => Axis::Z,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "csgit", about = "Geometry-aware version control for CSG-style nuclear simulation input models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ensure a repo exists, register geometry diff attributes
    Init {
        /// Install a pre-commit hook that runs `validate --pre-commit`
        #[arg(long)]
        hook: bool,
    },
    /// Print per-file cell/surface/universe counts
    Summary {
        /// Revision to inspect
        #[arg(default_value = "HEAD")]
        rev: String,
        /// Restrict to one file
        #[arg(long = "file")]
        file: Option<String>,
    },
    /// List changed geometry files with per-file counters
    Status,
    /// Textual or visual semantic diff
    Diff {
        rev1: Option<String>,
        rev2: Option<String>,
        #[arg(long = "file")]
        file: Option<String>,
        #[arg(short = 'v', long = "visual")]
        visual: bool,
        #[arg(long)]
        axis: Option<AxisArg>,
        #[arg(long)]
        x: Option<f64>,
        #[arg(long)]
        y: Option<f64>,
        #[arg(long)]
        z: Option<f64>,
        #[arg(long)]
        all: bool,
        #[arg(long = "no-contours")]
        no_contours: bool,
        #[arg(long)]
        width: Option<usize>,
        #[arg(short = 'o', long = "prefix")]
        prefix: Option<String>,
    },
    /// History for a file, optionally filtered to an id
    Log {
        #[arg(long = "file")]
        file: String,
        #[arg(long)]
        cell: Option<i64>,
        #[arg(long)]
        surface: Option<i64>,
        #[arg(short = 'n', default_value_t = log_cmd::DEFAULT_LOG_LIMIT)]
        limit: usize,
    },
    /// Per-element attribution
    Blame {
        #[arg(long = "file")]
        file: String,
        #[arg(long)]
        cell: Option<i64>,
        #[arg(long)]
        surface: Option<i64>,
    },
    /// Validate geometry files
    Validate {
        #[arg(long = "pre-commit")]
        pre_commit: bool,
        #[arg(long = "file")]
        file: Option<String>,
    },
    /// Stage files
    Add {
        paths: Vec<String>,
        #[arg(short = 'A', long)]
        all: bool,
    },
    /// Create a commit with structured geometry trailers
    Commit {
        #[arg(short = 'm', long = "message")]
        message: String,
        #[arg(short = 'a')]
        stage_all: bool,
    },
}

fn run(cli: Cli, store: &dyn RevisionStore) -> Result<()> {
    match cli.command {
        Command::Init { hook } => init::run(store, hook),
        Command::Summary { rev, file } => summary::run(store, &rev, file.as_deref()),
        Command::Status => status::run(store),
        Command::Diff {
            rev1,
            rev2,
            file,
            visual,
            axis,
            x,
            y,
            z,
            all,
            no_contours,
            width,
            prefix,
        } => {
            let revs = diff_cmd::RevPair::from_args(rev1, rev2);
            if visual || all {
                let path = file
                    .ok_or_else(|| anyhow::anyhow!("--visual requires --file <path>"))?;
                let args = diff_cmd::VisualArgs {
                    axis: axis.map(Axis::from),
                    x,
                    y,
                    z,
                    all,
                    no_contours,
                    width,
                    prefix,
                };
                diff_cmd::run_visual(store, revs, &path, args)
            } else {
                diff_cmd::run_text(store, revs, file.as_deref())
            }
        }
        Command::Log { file, cell, surface, limit } => {
            let filter = match (cell, surface) {
                (Some(id), _) => log_cmd::Filter::Cell(id),
                (None, Some(id)) => log_cmd::Filter::Surface(id),
                (None, None) => log_cmd::Filter::None,
            };
            log_cmd::run(store, &file, filter, limit)
        }
        Command::Blame { file, cell, surface } => {
            let selector = match (cell, surface) {
                (Some(id), _) => blame_cmd::Selector::Cell(id),
                (None, Some(id)) => blame_cmd::Selector::Surface(id),
                (None, None) => blame_cmd::Selector::All,
            };
            blame_cmd::run(store, &file, selector)
        }
        Command::Validate { pre_commit, file } => validate::run(store, pre_commit, file.as_deref()),
        Command::Add { paths, all } => add::run(store, &paths, all),
        Command::Commit { message, stage_all } => commit::run(store, &message, stage_all),
    }
}

fn main() {
    let cli = Cli::parse();
    let store = GitStore::new();
    if let Err(e) = run(cli, &store) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
