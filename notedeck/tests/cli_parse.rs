use clap::Parser;
use notedeck::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["notedeck", "render", "1.0 C#.md", "--verbose", "-c", "notes/notedeck.toml"])
        .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("notes/notedeck.toml")));
    match cli.command {
        Commands::Render { file, output } => {
            assert_eq!(file, "1.0 C#.md");
            assert_eq!(output, None);
        }
        _ => panic!("expected render"),
    }
}

#[test]
fn test_build_defaults() {
    let cli = Cli::try_parse_from(["notedeck", "build"]).unwrap();
    match cli.command {
        Commands::Build { output, pdf } => {
            assert_eq!(output, PathBuf::from("site"));
            assert!(!pdf);
        }
        _ => panic!("expected build"),
    }
}

#[test]
fn test_check_accepts_file_list() {
    let cli = Cli::try_parse_from(["notedeck", "check", "1 Go.md", "2 Go.md"]).unwrap();
    match cli.command {
        Commands::Check { files } => assert_eq!(files, vec!["1 Go.md", "2 Go.md"]),
        _ => panic!("expected check"),
    }
}

#[test]
fn test_subcommand_required() {
    assert!(Cli::try_parse_from(["notedeck"]).is_err());
}
