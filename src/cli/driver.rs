use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::cli::args::{CliArgs, Command};
use crate::cli::config::{ResolvedOptions, find_config, load_config, resolve_options};
use crate::cli::reporter::Reporter;
use crate::program::{ProgramFile, Session};

pub const EXIT_SUCCESS: i32 = 0;
/// Checking (or lowering, or cycle detection) reported errors.
pub const EXIT_DIAGNOSTICS: i32 = 1;
/// The interpreted program failed.
pub const EXIT_RUNTIME_FAILURE: i32 = 2;

/// What a command produced. The binary writes the two streams and exits
/// with `exit_code`.
#[derive(Debug, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub fn load_program(path: &Path) -> Result<ProgramFile> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read program: {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("failed to parse program: {}", path.display()))
}

/// Options from `--config`, or from a `strata.json` beside the program,
/// with command-line overrides applied on top.
pub fn resolve_command_options(args: &CliArgs) -> Result<ResolvedOptions> {
    let input = args.command.input();
    let config_path = args.config.clone().or_else(|| find_config(&input.file));
    let mut options = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), "[driver] loading config");
            resolve_options(&load_config(path)?)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => ResolvedOptions::default(),
    };

    if input.strict {
        options.strict = true;
    }
    match &args.command {
        Command::Lower(lower) => {
            if let Some(target) = lower.target {
                options.lowering.target = target.to_target();
            }
            if let Some(for_each) = lower.for_each {
                options.lowering.for_each = for_each.to_strategy();
            }
        }
        Command::Cycles(cycles) => {
            if let Some(mismatch) = cycles.mismatch {
                options.cycles.mismatch = mismatch.to_policy();
            }
        }
        Command::Check(_) | Command::Run(_) => {}
    }
    Ok(options)
}

pub fn execute(args: &CliArgs, color: bool) -> Result<CommandOutput> {
    let options = resolve_command_options(args)?;
    let program = load_program(&args.command.input().file)?;
    let entry = program.entry_point();
    let file_entry = program.entry.clone();

    let mut session = Session::from_file(program);
    let diagnostics = session.check(options.checker.clone());
    let failed = diagnostics
        .iter()
        .any(|d| d.is_error() || options.strict);
    info!(
        command = args.command.name(),
        types = session.declared_types().len(),
        diagnostics = diagnostics.len(),
        "[driver] checked"
    );

    let mut output = CommandOutput {
        stderr: Reporter::new(color)
            .with_arena(&session.arena)
            .render(&diagnostics),
        ..CommandOutput::default()
    };
    if failed {
        output.exit_code = EXIT_DIAGNOSTICS;
        return Ok(output);
    }

    match &args.command {
        Command::Check(_) => {
            let errors = diagnostics.iter().filter(|d| d.is_error()).count();
            output.stdout = format!(
                "{} type(s) checked, {} error(s), {} warning(s)\n",
                session.declared_types().len(),
                errors,
                diagnostics.len() - errors
            );
        }
        Command::Run(run) => {
            let (type_name, method) = match run.entry.as_deref().and_then(|e| e.rsplit_once('.')) {
                Some((ty, method)) => (ty.to_string(), method.to_string()),
                None => entry,
            };
            let outcome = session.run(&type_name, &method, options.interpreter.clone());
            output.stdout = outcome.output;
            if let Err(err) = outcome.result {
                output.stderr.push_str(&format!("{type_name}.{method}: {err}\n"));
                output.exit_code = EXIT_RUNTIME_FAILURE;
            }
        }
        Command::Lower(lower) => {
            let stats = session.lower(&options.lowering, options.checker.clone());
            debug!(rewrites = stats.total(), "[driver] lowered");
            let after = session.diagnostics();
            if after.iter().any(|d| d.is_error()) {
                output.stderr = Reporter::new(color).with_arena(&session.arena).render(&after);
                output.exit_code = EXIT_DIAGNOSTICS;
                return Ok(output);
            }
            let text = if lower.emit_tree {
                let lowered = ProgramFile {
                    arena: session.arena.clone(),
                    root: session.root,
                    entry: file_entry,
                };
                let mut json = serde_json::to_string_pretty(&lowered).context("failed to serialise lowered tree")?;
                json.push('\n');
                json
            } else {
                session.print_js(options.lowering.target)
            };
            match &lower.out {
                Some(path) => std::fs::write(path, text)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => output.stdout = text,
            }
        }
        Command::Cycles(_) => {
            let reports = session.cycles(options.cycles.clone());
            let reporter = Reporter::new(color).with_arena(&session.arena);
            for report in &reports {
                let diagnostic = report.to_diagnostic(&session.arena);
                output.stdout.push_str(&reporter.format_diagnostic(&diagnostic));
                output.stdout.push_str("\n  ");
                output.stdout.push_str(&report.detailed_trace(&session.registry));
                output.stdout.push('\n');
            }
            if reports.iter().any(|r| r.is_error()) {
                output.exit_code = EXIT_DIAGNOSTICS;
            }
            info!(reports = reports.len(), "[driver] cycles");
        }
    }
    Ok(output)
}
