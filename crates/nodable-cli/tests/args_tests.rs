use clap::Parser;

use nodable_cli::args::{CliArgs, Command};

#[test]
fn parses_run_with_a_file() {
    let args = CliArgs::try_parse_from(["nodable", "run", "main.nod"]).expect("run should parse");
    assert!(!args.permissive);
    assert_eq!(args.verbose, 0);
    match args.command {
        Command::Run { file } => assert_eq!(file, std::path::PathBuf::from("main.nod")),
        other => panic!("expected Run, got {other:?}"),
    }
}

#[test]
fn parses_permissive_and_verbosity_flags() {
    let args = CliArgs::try_parse_from(["nodable", "--permissive", "-vv", "fmt", "main.nod"])
        .expect("flagged args should parse");
    assert!(args.permissive);
    assert_eq!(args.verbose, 2);
    assert!(matches!(args.command, Command::Fmt { .. }));
}

#[test]
fn ast_subcommand_parses() {
    let args = CliArgs::try_parse_from(["nodable", "ast", "main.nod"]).expect("ast should parse");
    assert!(matches!(args.command, Command::Ast { .. }));
}

#[test]
fn missing_file_argument_is_rejected() {
    assert!(CliArgs::try_parse_from(["nodable", "run"]).is_err());
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(CliArgs::try_parse_from(["nodable"]).is_err());
}
