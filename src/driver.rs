use std::{io::Write, path::Path};

use tracing::{debug, info_span, warn};

use crate::{
    builder::StringBuilder,
    error::{DriverError, LoadError},
    lexer::{self, TokenStream},
    location::FileId,
    options::CompileOptions,
    source,
};

/// What happened to the inputs of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub lexed: usize,
    pub skipped: usize,
    /// Inputs that could not be loaded, whether missing or unreadable. They
    /// do not stop the run, but the run as a whole has failed.
    pub failures: Vec<LoadError>,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Lexes every `.c` input in order, writing token dumps to `out` when asked.
///
/// A lex failure stops the run; an input that cannot be loaded is recorded
/// and the run moves on to the next one.
pub fn run(options: &CompileOptions, out: &mut impl Write) -> Result<RunSummary, DriverError> {
    let mut summary = RunSummary::default();
    if let Some(output) = &options.output_path {
        debug!(output = %output.display(), "output path set, nothing is emitted yet");
    }

    for (index, path) in options.input_paths.iter().enumerate() {
        let _span = info_span!("input", path = %path.display()).entered();
        if !is_c_source(path) {
            debug!("skipping input that is not C source");
            summary.skipped += 1;
            continue;
        }

        let file = FileId(u32::try_from(index).unwrap_or(u32::MAX));
        let buffer = match source::load(path) {
            Ok(buffer) => buffer,
            Err(error) => {
                warn!(%error, "cannot load input");
                summary.failures.push(error);
                continue;
            }
        };

        let stream = lexer::tokenize(buffer.bytes(), Some(file)).map_err(|error| {
            DriverError::Lex {
                path: path.clone(),
                text: buffer.text_lossy(),
                error,
            }
        })?;
        summary.lexed += 1;

        if options.dump_tokens {
            out.write_all(&dump(path, &stream))?;
        }
    }

    Ok(summary)
}

/// Only paths whose extension is exactly `c` are lexed.
pub fn is_c_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "c")
}

/// One line per token: `range<TAB>kind<TAB>text`, under a header naming the
/// file.
pub fn dump(path: &Path, stream: &TokenStream) -> Vec<u8> {
    let mut sb = StringBuilder::new();
    sb.append(format_args!("# {}\n", path.display()));
    for token in stream.iter() {
        sb.append(format_args!("{}\t{:?}", token.range(), token.kind()));
        if !token.text().is_empty() {
            sb.append_char(b'\t');
            sb.append(format_args!("{}", token.text()));
        }
        sb.append_char(b'\n');
    }
    sb.as_bytes().to_vec()
}
