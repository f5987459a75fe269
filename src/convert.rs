//! Converts expanded document bodies into HTML. [`Markdown`] does this
//! in-process with `pulldown_cmark`; [`Command`] pipes the body through an
//! external program (e.g. `smu`) for sites that depend on a particular
//! Markdown dialect.

use pulldown_cmark::{html, Options, Parser};
use std::fmt;
use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};
use std::string::FromUtf8Error;

/// Turns an expanded document body into HTML.
pub trait Converter: Send + Sync {
    fn convert(&self, body: &str) -> Result<String>;
}

/// The built-in CommonMark converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Markdown;

impl Converter for Markdown {
    fn convert(&self, body: &str) -> Result<String> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut output = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut output, Parser::new_ext(body, options));
        Ok(output)
    }
}

/// Converts by running an external program with the body on stdin and
/// reading HTML from stdout. A non-zero exit status is an error.
#[derive(Clone, Debug)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    /// Builds a converter from a command line: the program followed by its
    /// arguments.
    pub fn new(command_line: &[String]) -> Result<Command> {
        match command_line.split_first() {
            None => Err(Error::EmptyCommand),
            Some((program, args)) => Ok(Command {
                program: program.clone(),
                args: args.to_vec(),
            }),
        }
    }
}

impl Converter for Command {
    fn convert(&self, body: &str) -> Result<String> {
        let mut child = std::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::Spawn {
                program: self.program.clone(),
                err,
            })?;

        // Feed stdin from another thread so a converter that streams its
        // output can't fill the stdout pipe while we are still writing.
        let stdin = child.stdin.take();
        let input = body.as_bytes().to_vec();
        let writer = std::thread::spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input)?;
            }
            Ok(())
        });

        let output = child.wait_with_output()?;
        let written = writer.join().unwrap_or_else(|_| {
            Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))
        });

        // A failing converter may exit before reading its input, so its
        // status is more telling than the broken pipe.
        if !output.status.success() {
            return Err(Error::Status {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        written?;
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Picks the converter for a configured command line: the external
/// [`Command`] if one is given, [`Markdown`] otherwise.
pub fn from_command_line(command_line: Option<&[String]>) -> Result<Box<dyn Converter>> {
    Ok(match command_line {
        Some(command_line) => Box::new(Command::new(command_line)?),
        None => Box::new(Markdown),
    })
}

/// The result of a fallible conversion.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error converting a document body to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when a configured converter command has no program.
    EmptyCommand,

    /// Returned when the converter program can't be started.
    Spawn { program: String, err: io::Error },

    /// Returned when the converter program exits unsuccessfully.
    Status {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Returned when the converter's output isn't UTF-8.
    Utf8(FromUtf8Error),

    /// Returned for other I/O errors talking to the converter program.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyCommand => write!(f, "converter command is empty"),
            Error::Spawn { program, err } => {
                write!(f, "starting converter `{}`: {}", program, err)
            }
            Error::Status {
                program,
                status,
                stderr,
            } => write!(
                f,
                "converter `{}` failed ({}): {}",
                program,
                status,
                stderr.trim()
            ),
            Error::Utf8(err) => write!(f, "converter output is not UTF-8: {}", err),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::EmptyCommand => None,
            Error::Spawn { err, .. } => Some(err),
            Error::Status { .. } => None,
            Error::Utf8(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for IO operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        Error::Utf8(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_markdown() -> Result<()> {
        assert_eq!(
            "<h1>Hello</h1>\n<p><em>world</em></p>\n",
            Markdown.convert("# Hello\n\n*world*\n")?
        );
        Ok(())
    }

    #[test]
    fn test_markdown_passes_html_blocks_through() -> Result<()> {
        let html = Markdown.convert("<iframe src=\"x\"></iframe>\n\ntext\n")?;
        assert!(html.starts_with("<iframe src=\"x\"></iframe>\n"));
        Ok(())
    }

    #[test]
    fn test_empty_command() {
        assert!(matches!(Command::new(&[]), Err(Error::EmptyCommand)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command() -> Result<()> {
        let cat = Command::new(&["cat".to_owned()])?;
        assert_eq!("<p>as is</p>", cat.convert("<p>as is</p>")?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure() -> Result<()> {
        let fail = Command::new(&[
            "sh".to_owned(),
            "-c".to_owned(),
            "echo broken >&2; exit 3".to_owned(),
        ])?;
        match fail.convert("body") {
            Err(Error::Status { program, stderr, .. }) => {
                assert_eq!("sh", program);
                assert_eq!("broken", stderr.trim());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_program() {
        let missing = Command::new(&["scriptorium-no-such-converter".to_owned()]).unwrap();
        assert!(matches!(missing.convert("body"), Err(Error::Spawn { .. })));
    }
}
