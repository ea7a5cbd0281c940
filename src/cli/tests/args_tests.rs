use clap::Parser;

use super::args::{CliArgs, CliForEach, CliMismatch, CliTarget, Command};

#[test]
fn parses_check_with_defaults() {
    let args = CliArgs::try_parse_from(["strata", "check", "program.json"]).expect("args");

    assert!(args.config.is_none());
    assert!(!args.no_color);
    let Command::Check(input) = &args.command else {
        panic!("expected check, got {:?}", args.command);
    };
    assert_eq!(input.file.to_str(), Some("program.json"));
    assert!(!input.strict);
    assert_eq!(args.command.name(), "check");
}

#[test]
fn parses_lower_flags() {
    let args = CliArgs::try_parse_from([
        "strata",
        "lower",
        "program.json",
        "--target",
        "ES6",
        "--for-each",
        "index",
        "--out",
        "out.js",
        "--config",
        "configs/strata.json",
    ])
    .expect("args");

    assert_eq!(args.config.as_deref().and_then(|p| p.to_str()), Some("configs/strata.json"));
    let Command::Lower(lower) = &args.command else {
        panic!("expected lower, got {:?}", args.command);
    };
    assert_eq!(lower.target, Some(CliTarget::Es2015));
    assert_eq!(lower.for_each, Some(CliForEach::Index));
    assert_eq!(lower.out.as_deref().and_then(|p| p.to_str()), Some("out.js"));
    assert!(!lower.emit_tree);
}

#[test]
fn parses_run_entry_and_cycles_policy() {
    let run = CliArgs::try_parse_from(["strata", "run", "p.json", "--entry", "App.main", "--strict"])
        .expect("run args");
    let Command::Run(run) = &run.command else {
        panic!("expected run");
    };
    assert_eq!(run.entry.as_deref(), Some("App.main"));
    assert!(run.input.strict);

    let cycles = CliArgs::try_parse_from(["strata", "--no-color", "cycles", "p.json", "--mismatch", "warning"])
        .expect("cycles args");
    assert!(cycles.no_color);
    let Command::Cycles(cycles) = &cycles.command else {
        panic!("expected cycles");
    };
    assert_eq!(cycles.mismatch, Some(CliMismatch::Warn));
}

#[test]
fn rejects_unknown_target_and_missing_file() {
    assert!(CliArgs::try_parse_from(["strata", "lower", "p.json", "--target", "es3"]).is_err());
    assert!(CliArgs::try_parse_from(["strata", "run"]).is_err());
    assert!(CliArgs::try_parse_from(["strata"]).is_err());
}
