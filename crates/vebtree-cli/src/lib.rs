use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::ops::Bound;
use std::path::PathBuf;
use vebtree::{SnapshotFile, VebTree, debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "vebtree",
    version,
    about = "Inspect and edit van Emde Boas tree snapshots"
)]
pub struct Cli {
    /// Snapshot file to operate on
    #[arg(long, default_value = "vebtree.json")]
    pub file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty tree
    Create(CreateCmd),
    /// Insert one or more values
    Insert(ValuesCmd),
    /// Delete one or more values
    Delete(ValuesCmd),
    /// Check whether a value is stored
    Contains(ValueCmd),
    /// Smallest stored value greater than VALUE
    Next(ValueCmd),
    /// Largest stored value less than VALUE
    Prev(ValueCmd),
    /// Smallest stored value
    Min,
    /// Largest stored value
    Max,
    /// List stored values in [FROM, TO)
    List(ListCmd),
    /// Print universe, length and extremes
    Stats,
    /// Print the snapshot as JSON
    Export,
}

#[derive(Args, Debug)]
pub struct CreateCmd {
    /// Exclusive upper bound on stored values
    #[arg(long)]
    pub universe: u64,
    /// Replace an existing snapshot
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ValuesCmd {
    #[arg(required = true)]
    pub values: Vec<u64>,
}

#[derive(Args, Debug)]
pub struct ValueCmd {
    pub value: u64,
}

#[derive(Args, Debug)]
pub struct ListCmd {
    /// Inclusive lower bound
    #[arg(long)]
    pub from: Option<u64>,
    /// Exclusive upper bound
    #[arg(long)]
    pub to: Option<u64>,
    /// Walk from the largest value down
    #[arg(long, default_value_t = false)]
    pub reverse: bool,
    /// Stop after this many values
    #[arg(long)]
    pub limit: Option<usize>,
}

fn print_optional<W: Write>(out: &mut W, value: Option<u64>) -> std::io::Result<()> {
    match value {
        Some(v) => writeln!(out, "{v}"),
        None => writeln!(out, "none"),
    }
}

pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = SnapshotFile::new(&cli.file);
    debug!("Running {:?} against {:?}", cli.command, snapshot.path());

    match cli.command {
        Commands::Create(args) => {
            if snapshot.exists() && !args.force {
                return Err(format!(
                    "snapshot {} already exists (use --force to replace it)",
                    snapshot.path().display()
                )
                .into());
            }
            let tree = VebTree::new(args.universe)?;
            snapshot.save(&tree)?;
            info!(
                "Created tree with universe {} at {:?}",
                args.universe,
                snapshot.path()
            );
            writeln!(out, "created: {}", snapshot.path().display())?;
        }
        Commands::Insert(args) => {
            let inserted = snapshot.update(|tree| {
                let mut inserted = 0u64;
                for value in args.values {
                    if tree.try_insert(value)? {
                        inserted += 1;
                    }
                }
                Ok(inserted)
            })?;
            writeln!(out, "inserted: {inserted}")?;
        }
        Commands::Delete(args) => {
            let deleted = snapshot.update(|tree| {
                Ok(args.values.into_iter().filter(|&v| tree.delete(v)).count())
            })?;
            writeln!(out, "deleted: {deleted}")?;
        }
        Commands::Contains(args) => {
            let tree = snapshot.load()?;
            writeln!(out, "{}", tree.contains(args.value))?;
        }
        Commands::Next(args) => {
            let tree = snapshot.load()?;
            print_optional(out, tree.find_next(args.value))?;
        }
        Commands::Prev(args) => {
            let tree = snapshot.load()?;
            print_optional(out, tree.find_prev(args.value))?;
        }
        Commands::Min => {
            let tree = snapshot.load()?;
            print_optional(out, tree.minimum())?;
        }
        Commands::Max => {
            let tree = snapshot.load()?;
            print_optional(out, tree.maximum())?;
        }
        Commands::List(args) => {
            let tree = snapshot.load()?;
            let start = args.from.map_or(Bound::Unbounded, Bound::Included);
            let end = args.to.map_or(Bound::Unbounded, Bound::Excluded);
            let limit = args.limit.unwrap_or(usize::MAX);
            let values = tree.range((start, end));
            if args.reverse {
                for value in values.rev().take(limit) {
                    writeln!(out, "{value}")?;
                }
            } else {
                for value in values.take(limit) {
                    writeln!(out, "{value}")?;
                }
            }
        }
        Commands::Stats => {
            let tree = snapshot.load()?;
            writeln!(out, "universe: {}", tree.universe())?;
            writeln!(out, "len: {}", tree.len())?;
            write!(out, "min: ")?;
            print_optional(out, tree.minimum())?;
            write!(out, "max: ")?;
            print_optional(out, tree.maximum())?;
        }
        Commands::Export => {
            let tree = snapshot.load()?;
            serde_json::to_writer_pretty(&mut *out, &tree.to_snapshot())?;
            writeln!(out)?;
        }
    }
    Ok(())
}
