use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "depsleuth",
    about = "Discover project dependencies, resolve their repositories and report their licenses",
    version
)]
pub struct Cli {
    /// Comma-separated list of project roots to scan
    #[arg(long, value_delimiter = ',', required = true, value_name = "PATHS")]
    pub pkgs: Vec<String>,

    /// Report destination (required for csv, stdout for json when omitted)
    #[arg(long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "csv", value_name = "FORMAT")]
    pub outformat: OutputFormat,

    /// Config file [default: ./.depsleuth.toml, fallback ~/.config/depsleuth/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Exit with status 1 when any project fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    Terminal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkgs_are_comma_delimited() {
        let cli = Cli::try_parse_from(["depsleuth", "--pkgs", "a,b", "--pkgs", "c"]).unwrap();
        assert_eq!(cli.pkgs, vec!["a", "b", "c"]);
        assert_eq!(cli.outformat, OutputFormat::Csv);
        assert!(cli.outfile.is_none());
        assert!(!cli.strict);
    }

    #[test]
    fn test_pkgs_are_required() {
        assert!(Cli::try_parse_from(["depsleuth"]).is_err());
    }

    #[test]
    fn test_outformat() {
        let cli = Cli::try_parse_from([
            "depsleuth",
            "--pkgs",
            ".",
            "--outformat",
            "json",
            "--outfile",
            "deps.json",
        ])
        .unwrap();
        assert_eq!(cli.outformat, OutputFormat::Json);
        assert_eq!(cli.outfile, Some(PathBuf::from("deps.json")));
        assert!(Cli::try_parse_from(["depsleuth", "--pkgs", ".", "--outformat", "pdf"]).is_err());
    }
}
