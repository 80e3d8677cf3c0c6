use std::{ffi::OsString, path::PathBuf};

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, error::ErrorKind};

use crate::{error::ArgumentParseError, seq::Seq};

#[derive(Parser, Debug)]
#[command(name = "cfe")]
#[command(about = "C compiler front end", long_about = None)]
struct Cli {
    /// Compile the single source file at `path`
    #[arg(short = 'i', value_name = "path")]
    input: Vec<PathBuf>,
    /// Write output to `path`
    #[arg(short = 'o', value_name = "path")]
    output: Option<PathBuf>,
    /// Print every token of each lexed file
    #[arg(long)]
    dump_tokens: bool,
    /// Source files
    #[arg(value_name = "input")]
    inputs: Vec<PathBuf>,
}

/// What the driver should do with the inputs of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Inputs in command line order, duplicates kept.
    pub input_paths: Seq<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub dump_tokens: bool,
}

impl Default for CompileOptions {
    fn default() -> CompileOptions {
        CompileOptions {
            input_paths: Seq::new(),
            output_path: None,
            dump_tokens: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Print this text to stdout and exit successfully.
    Help(String),
    Compile(CompileOptions),
}

pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

/// Parses the full argument list, program name included.
pub fn parse_arguments<I, T>(args: I) -> Result<Invocation, ArgumentParseError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        return Ok(Invocation::Help(usage()));
    }

    let matches = match Cli::command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(error) => {
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    Ok(Invocation::Help(error.render().to_string()))
                }
                _ => Err(ArgumentParseError {
                    message: error.render().to_string(),
                }),
            };
        }
    };
    let cli = Cli::from_arg_matches(&matches).map_err(|error| ArgumentParseError {
        message: error.render().to_string(),
    })?;

    Ok(Invocation::Compile(CompileOptions {
        input_paths: ordered_inputs(&matches, cli.input, cli.inputs),
        output_path: cli.output,
        dump_tokens: cli.dump_tokens,
    }))
}

/// Interleaves `-i` paths and bare paths back into command line order.
fn ordered_inputs(matches: &ArgMatches, flagged: Vec<PathBuf>, bare: Vec<PathBuf>) -> Seq<PathBuf> {
    let positions = |id: &str| -> Vec<usize> {
        matches
            .indices_of(id)
            .map(|indices| indices.collect())
            .unwrap_or_default()
    };
    let mut all: Vec<(usize, PathBuf)> = positions("input")
        .into_iter()
        .zip(flagged)
        .chain(positions("inputs").into_iter().zip(bare))
        .collect();
    all.sort_by_key(|(index, _)| *index);
    all.into_iter().map(|(_, path)| path).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn compile(args: &[&str]) -> CompileOptions {
        match parse_arguments(args.iter().copied()) {
            Ok(Invocation::Compile(options)) => options,
            other => panic!("expected options, got {other:?}"),
        }
    }

    fn paths(options: &CompileOptions) -> Vec<&str> {
        options
            .input_paths
            .iter()
            .map(|p| p.to_str().unwrap())
            .collect()
    }

    #[test]
    fn no_arguments_prints_usage() {
        let Ok(Invocation::Help(text)) = parse_arguments(["cfe"]) else {
            panic!("expected help");
        };
        assert!(text.contains("Usage"));
        assert!(text.contains("-i <path>"));
    }

    #[test]
    fn help_flag_prints_usage() {
        assert!(matches!(
            parse_arguments(["cfe", "--help"]),
            Ok(Invocation::Help(_))
        ));
    }

    #[test]
    fn inputs_keep_command_line_order() {
        let options = compile(&["cfe", "b.c", "-i", "a.c", "c.o", "-i", "b.c", "-o", "out"]);
        assert_eq!(paths(&options), ["b.c", "a.c", "c.o", "b.c"]);
        assert_eq!(options.output_path, Some(PathBuf::from("out")));
        assert!(!options.dump_tokens);
    }

    #[test]
    fn dump_tokens_flag() {
        let options = compile(&["cfe", "--dump-tokens", "x.c"]);
        assert!(options.dump_tokens);
        assert_eq!(paths(&options), ["x.c"]);
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let error = parse_arguments(["cfe", "-z", "x.c"]).unwrap_err();
        assert!(error.message.contains("-z"));
        assert!(error.message.contains("Usage"));
    }

    #[test]
    fn flag_without_value_is_an_error() {
        assert!(parse_arguments(["cfe", "-i"]).is_err());
        assert!(parse_arguments(["cfe", "x.c", "-o"]).is_err());
    }
}
