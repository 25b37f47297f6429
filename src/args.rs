//! Command-line parsing.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tabledoc_engine::CellRef;

use crate::error::{CliError, Result};

/// One thing to do against the document, in command-line order.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Set { cell: CellRef, text: String },
    CreateRange { label: String, from: CellRef, to: CellRef },
    GetRange(String),
    Evaluate(CellRef),
    Formula(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub requests: Vec<Request>,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Run(Options),
}

pub fn print_usage() {
    eprintln!("Usage: tabledoc [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <FILE>           Read document settings from a TOML file");
    eprintln!("  --rows <N>                Rows of the new grid");
    eprintln!("  --cols <N>                Columns of the new grid");
    eprintln!("  -s, --set <CELL=TEXT>     Write cell text (can be repeated)");
    eprintln!("  -r, --range <NAME=A1:B2>  Track a labelled range (can be repeated)");
    eprintln!("  -g, --get-range <NAME>    Print where a labelled range is now");
    eprintln!("  -e, --eval <CELL>         Print a cell's value");
    eprintln!("  -c, --command <FORMULA>   Print a formula's value ('=' is optional)");
    eprintln!("  -h, --help                Print help");
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<from>[A-Za-z]+[0-9]+):(?<to>[A-Za-z]+[0-9]+)$")
            .expect("range regex must compile")
    })
}

fn parse_cell(text: &str) -> Result<CellRef> {
    CellRef::parse(text.trim()).ok_or_else(|| CliError::BadCell(text.to_string()))
}

fn parse_range(text: &str) -> Result<(CellRef, CellRef)> {
    let caps = range_re()
        .captures(text.trim())
        .ok_or_else(|| CliError::BadRange(text.to_string()))?;
    Ok((parse_cell(&caps["from"])?, parse_cell(&caps["to"])?))
}

fn split_assignment<'a>(flag: &str, value: &'a str) -> Result<(&'a str, &'a str)> {
    match value.split_once('=') {
        Some((name, rest)) if !name.trim().is_empty() => Ok((name.trim(), rest)),
        _ => Err(CliError::BadAssignment {
            flag: flag.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_count(flag: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| CliError::BadNumber {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let mut options = Options::default();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "-h" | "--help") {
            return Ok(Command::Help);
        }
        if !flag.starts_with('-') {
            return Err(CliError::UnexpectedArgument(flag.to_string()));
        }

        i += 1;
        let value = args
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| match flag {
                "--config" | "--rows" | "--cols" | "-s" | "--set" | "-r" | "--range" | "-g"
                | "--get-range" | "-e" | "--eval" | "-c" | "--command" => {
                    CliError::MissingValue(flag.to_string())
                }
                _ => CliError::UnknownOption(flag.to_string()),
            })?;

        match flag {
            "--config" => options.config = Some(PathBuf::from(value)),
            "--rows" => options.rows = Some(parse_count(flag, value)?),
            "--cols" => options.cols = Some(parse_count(flag, value)?),
            "-s" | "--set" => {
                let (cell, text) = split_assignment(flag, value)?;
                options.requests.push(Request::Set {
                    cell: parse_cell(cell)?,
                    text: text.to_string(),
                });
            }
            "-r" | "--range" => {
                let (label, range) = split_assignment(flag, value)?;
                let (from, to) = parse_range(range)?;
                options.requests.push(Request::CreateRange {
                    label: label.to_string(),
                    from,
                    to,
                });
            }
            "-g" | "--get-range" => options.requests.push(Request::GetRange(value.to_string())),
            "-e" | "--eval" => options.requests.push(Request::Evaluate(parse_cell(value)?)),
            "-c" | "--command" => {
                let formula = if value.trim_start().starts_with('=') {
                    value.to_string()
                } else {
                    format!("={}", value)
                };
                options.requests.push(Request::Formula(formula));
            }
            _ => return Err(CliError::UnknownOption(flag.to_string())),
        }
        i += 1;
    }

    Ok(Command::Run(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Command> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    fn requests(args: &[&str]) -> Vec<Request> {
        match parse(args).unwrap() {
            Command::Run(options) => options.requests,
            Command::Help => panic!("expected run"),
        }
    }

    #[test]
    fn test_requests_keep_their_order() {
        let got = requests(&["-s", "A1=5", "-e", "B1", "-s", "B1==A1*2"]);
        assert_eq!(
            got,
            vec![
                Request::Set {
                    cell: CellRef::new(0, 0),
                    text: "5".into()
                },
                Request::Evaluate(CellRef::new(0, 1)),
                Request::Set {
                    cell: CellRef::new(0, 1),
                    text: "=A1*2".into()
                },
            ]
        );
    }

    #[test]
    fn test_command_gets_equals_prepended() {
        assert_eq!(requests(&["-c", "1 + 2"]), vec![Request::Formula("=1 + 2".into())]);
        assert_eq!(requests(&["-c", "=1 + 2"]), vec![Request::Formula("=1 + 2".into())]);
    }

    #[test]
    fn test_range_assignment() {
        assert_eq!(
            requests(&["-r", "block=A1:B2"]),
            vec![Request::CreateRange {
                label: "block".into(),
                from: CellRef::new(0, 0),
                to: CellRef::new(1, 1),
            }]
        );
        assert!(matches!(parse(&["-r", "block=A1"]), Err(CliError::BadRange(_))));
        assert!(matches!(parse(&["-r", "A1:B2"]), Err(CliError::BadAssignment { .. })));
    }

    #[test]
    fn test_shape_overrides() {
        let Command::Run(options) = parse(&["--rows", "3", "--cols", "4"]).unwrap() else {
            panic!("expected run");
        };
        assert_eq!((options.rows, options.cols), (Some(3), Some(4)));
        assert!(matches!(
            parse(&["--rows", "many"]),
            Err(CliError::BadNumber { .. })
        ));
    }

    #[test]
    fn test_bad_arguments() {
        assert_eq!(parse(&["--help"]).unwrap(), Command::Help);
        assert!(matches!(parse(&["-e"]), Err(CliError::MissingValue(_))));
        assert!(matches!(parse(&["--bogus", "x"]), Err(CliError::UnknownOption(_))));
        assert!(matches!(parse(&["--bogus"]), Err(CliError::UnknownOption(_))));
        assert!(matches!(parse(&["file.grd"]), Err(CliError::UnexpectedArgument(_))));
        assert!(matches!(parse(&["-e", "1A"]), Err(CliError::BadCell(_))));
    }
}
