use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use strata_binding::MismatchPolicy;
use strata_emitter::{ForEachStrategy, Target};

/// CLI arguments for the strata binary.
#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version,
    about = "Check, interpret and lower strata programs"
)]
pub struct CliArgs {
    /// Path to strata.json. Defaults to strata.json next to the program.
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored diagnostics.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve and type-check a program, printing its diagnostics.
    Check(InputArgs),
    /// Check a program, then interpret its entry point.
    Run(RunArgs),
    /// Check and lower a program, printing JavaScript.
    Lower(LowerArgs),
    /// Report binding cycles among bound fields.
    Cycles(CyclesArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Program file: a JSON-serialised node arena and its root.
    pub file: PathBuf,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Entry point as `Type.method`; overrides the program file.
    #[arg(short = 'e', long)]
    pub entry: Option<String>,
}

#[derive(Args, Debug)]
pub struct LowerArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// ECMAScript edition of the printed code.
    #[arg(short = 't', long, value_enum, ignore_case = true)]
    pub target: Option<CliTarget>,

    /// Rewrite of `for (T x : items)` over lists.
    #[arg(long = "for-each", value_enum, ignore_case = true)]
    pub for_each: Option<CliForEach>,

    /// Print the lowered tree as JSON instead of JavaScript.
    #[arg(long = "emit-tree")]
    pub emit_tree: bool,

    /// Write output to this file instead of stdout.
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CyclesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Handling of related receivers reached on different paths.
    #[arg(long, value_enum, ignore_case = true)]
    pub mismatch: Option<CliMismatch>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliTarget {
    #[value(alias = "es6")]
    Es2015,
    #[value(alias = "esnext")]
    Es2022,
}

impl CliTarget {
    pub fn to_target(self) -> Target {
        match self {
            CliTarget::Es2015 => Target::Es2015,
            CliTarget::Es2022 => Target::Es2022,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliForEach {
    Iterator,
    Index,
}

impl CliForEach {
    pub fn to_strategy(self) -> ForEachStrategy {
        match self {
            CliForEach::Iterator => ForEachStrategy::Iterator,
            CliForEach::Index => ForEachStrategy::Index,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliMismatch {
    Ignore,
    #[value(alias = "warning")]
    Warn,
    Error,
}

impl CliMismatch {
    pub fn to_policy(self) -> MismatchPolicy {
        match self {
            CliMismatch::Ignore => MismatchPolicy::Ignore,
            CliMismatch::Warn => MismatchPolicy::Warn,
            CliMismatch::Error => MismatchPolicy::Error,
        }
    }
}

impl Command {
    pub fn input(&self) -> &InputArgs {
        match self {
            Command::Check(input) => input,
            Command::Run(args) => &args.input,
            Command::Lower(args) => &args.input,
            Command::Cycles(args) => &args.input,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Check(_) => "check",
            Command::Run(_) => "run",
            Command::Lower(_) => "lower",
            Command::Cycles(_) => "cycles",
        }
    }
}
