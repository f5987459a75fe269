//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: cleaning the output directory,
//! loading the page template, and walking the source tree, where documents
//! are expanded ([`crate::expand`]), converted ([`crate::convert`]) and
//! wrapped in the template, and every other file is copied as-is.
//!
//! Private entries (names starting with `.` or `_`) are neither rendered nor
//! copied. A private directory hides its whole subtree, not just its own
//! name, and the same goes for the `templates` directory.

use crate::builtins::{self, BuiltinRegistry};
use crate::collect::{self, list_page_macro, page_fields, page_namespace, Collector};
use crate::config::{Config, TEMPLATES_DIRECTORY};
use crate::convert::{self, Converter};
use crate::dates;
use crate::expand::{self, expand};
use crate::metadata;
use crate::namespace::Namespace;
use crate::util::is_private;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Used in place of a missing template file: the bare converted content.
pub const FALLBACK_TEMPLATE: &str = "{{ content }}";

/// Builds the site from a [`Config`] object. The output directory is deleted
/// first, so nothing from a previous build survives.
pub fn build_site(config: &Config) -> Result<()> {
    let source = &config.source_directory;
    if !source.is_dir() {
        return Err(Error::MissingSource(source.to_owned()));
    }
    rmdir(&config.output_directory)?;
    fs::create_dir_all(&config.output_directory)?;

    let template = load_template(&config.template_file)?;
    let menu = builtins::menu(source, &config.markdown_extension)?;
    let registry = BuiltinRegistry::new(&config.site, menu);
    let converter = convert::from_command_line(config.converter.as_deref())?;
    let builder = Builder {
        config,
        builtins: &registry,
        converter: converter.as_ref(),
        template: &template,
        generated_date: dates::generated_date(),
    };

    let templates_directory = source.join(TEMPLATES_DIRECTORY);
    let walker = WalkDir::new(source)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(is_private(entry.path()) || entry.path() == templates_directory)
        });
    for result in walker {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = match path.strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        if builder.is_document(path) {
            builder.render_document(path, relative)?;
        } else {
            builder.copy_asset(path, relative)?;
        }
    }

    Ok(())
}

struct Builder<'a> {
    config: &'a Config,
    builtins: &'a BuiltinRegistry,
    converter: &'a dyn Converter,
    template: &'a str,
    generated_date: String,
}

impl Builder<'_> {
    fn is_document(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(&self.config.markdown_extension))
            .unwrap_or(false)
    }

    /// Expands and converts the document at `path`, wraps it in the template,
    /// and writes it to its slugified output path.
    fn render_document(&self, path: &Path, relative: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        let rendered = collect::rendered_path(relative, &self.config.markdown_extension);
        let url = collect::url_for(&rendered);
        let fields = page_fields(self.builtins, &url, metadata::extract(&text)).map_err(|err| {
            Error::Date {
                path: path.to_owned(),
                err,
            }
        })?;

        let collector = Collector {
            source_directory: &self.config.source_directory,
            markdown_extension: &self.config.markdown_extension,
            builtins: self.builtins,
            converter: self.converter,
        };
        let mut namespace = page_namespace(self.builtins, &fields);
        namespace.define("list_page", list_page_macro(&collector, path));
        let body = expand(&text, &namespace).map_err(|err| Error::Expand {
            path: path.to_owned(),
            err,
        })?;
        let content = self.converter.convert(&body).map_err(|err| Error::Convert {
            path: path.to_owned(),
            err,
        })?;

        let mut page = Namespace::with_builtins(self.builtins);
        page.literal("content", content);
        page.literal("generated_date", self.generated_date.as_str());
        let html = expand(self.template, &page).map_err(|err| Error::Template {
            path: self.config.template_file.clone(),
            err,
        })?;

        let destination = self.config.output_directory.join(&rendered);
        write_file(&destination, html.as_bytes())?;
        info!(url = %url, "wrote page");
        Ok(())
    }

    fn copy_asset(&self, path: &Path, relative: &Path) -> Result<()> {
        let destination = self.config.output_directory.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &destination).map_err(|err| Error::Copy {
            path: path.to_owned(),
            err,
        })?;
        info!(path = %relative.display(), "copied asset");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents).map_err(|err| Error::Write {
        path: path.to_owned(),
        err,
    })
}

// A missing template is tolerated so that a bare source tree still builds.
fn load_template(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(template) => Ok(template),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "template not found; pages are written without one");
            Ok(String::from(FALLBACK_TEMPLATE))
        }
        Err(err) => Err(Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        }),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Every error concerning a single
/// document names the document.
#[derive(Debug)]
pub enum Error {
    /// Returned when the source directory doesn't exist.
    MissingSource(PathBuf),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening the template file.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned when the configured converter can't be set up.
    Converter(convert::Error),

    /// Returned for errors walking the source directory.
    WalkDir(walkdir::Error),

    /// Returned when a document can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a document's `date` can't be parsed.
    Date { path: PathBuf, err: dates::Error },

    /// Returned when a document's body can't be expanded. This includes the
    /// failures of the pages it lists.
    Expand { path: PathBuf, err: expand::Error },

    /// Returned when a document's body can't be converted.
    Convert { path: PathBuf, err: convert::Error },

    /// Returned when the template can't be expanded.
    Template { path: PathBuf, err: expand::Error },

    /// Returned when a rendered page can't be written.
    Write { path: PathBuf, err: std::io::Error },

    /// Returned when an asset can't be copied.
    Copy { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingSource(path) => {
                write!(f, "Source directory '{}' does not exist", path.display())
            }
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::Converter(err) => write!(f, "Setting up converter: {}", err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::Read { path, err } => {
                write!(f, "Reading document '{}': {}", path.display(), err)
            }
            Error::Date { path, err } => {
                write!(f, "Rendering document '{}': {}", path.display(), err)
            }
            Error::Expand { path, err } => {
                write!(f, "Rendering document '{}': {}", path.display(), err)
            }
            Error::Convert { path, err } => {
                write!(f, "Converting document '{}': {}", path.display(), err)
            }
            Error::Template { path, err } => {
                write!(f, "Applying template '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing page '{}': {}", path.display(), err)
            }
            Error::Copy { path, err } => {
                write!(f, "Copying asset '{}': {}", path.display(), err)
            }
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingSource(_) => None,
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Converter(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Read { path: _, err } => Some(err),
            Error::Date { path: _, err } => Some(err),
            Error::Expand { path: _, err } => Some(err),
            Error::Convert { path: _, err } => Some(err),
            Error::Template { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
            Error::Copy { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<convert::Error> for Error {
    /// Converts [`convert::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: convert::Error) -> Error {
        Error::Converter(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Site;
    use crate::namespace::CallError;

    fn write(root: &Path, relative: &str, contents: &str) -> std::io::Result<()> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    fn config(root: &Path) -> Config {
        let source_directory = root.join("site");
        Config {
            site: Site {
                blog_title: String::from("Field Notes"),
                ..Site::default()
            },
            template_file: source_directory.join(TEMPLATES_DIRECTORY).join("default.html"),
            source_directory,
            output_directory: root.join("www"),
            markdown_extension: String::from(".md"),
            converter: None,
        }
    }

    fn site(root: &Path) -> std::io::Result<()> {
        write(
            root,
            "site/templates/default.html",
            "<title>{{ blog_title }}</title>\n<ul>{{ menu }}</ul>\n{{ content }}\n<footer>{{ generated_date }}</footer>\n",
        )?;
        write(
            root,
            "site/index.md",
            "<!--\ntitle: Home\n-->\n# {{ title }}\n\n{{ list_page(path=\"posts\", max=1) }}\n",
        )?;
        write(
            root,
            "site/posts/A First Post.md",
            "<!--\ntitle: First\ndate: 2020-01-01\nabstract: The first one.\n-->\nPosted {{ date_long_string }}.\n",
        )?;
        write(
            root,
            "site/posts/second.md",
            "<!--\ntitle: Second\ndate: 2020-02-01 12:00\nabstract: The second one.\n-->\nHello.\n",
        )?;
        write(root, "site/_drafts/wip.md", "unfinished")?;
        write(root, "site/.hidden", "secret")?;
        write(root, "site/css/style.css", "body { color: black; }")
    }

    #[test]
    fn test_build_site() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        site(root.path())?;
        write(root.path(), "www/stale.html", "left over")?;
        let config = config(root.path());

        build_site(&config)?;

        let www = root.path().join("www");
        let index = fs::read_to_string(www.join("index.html"))?;
        assert!(index.starts_with("<title>Field Notes</title>"));
        assert!(index.contains("<h1>Home</h1>"));
        assert!(index.contains("<a href=\"/posts/second.html\">Second</a>"));
        assert!(!index.contains("/posts/a-first-post.html\">First"));
        assert!(index.contains("<li><a href=\"/index.html\"> home</a></li>"));
        assert!(!index.contains("{{ generated_date }}"));

        let first = fs::read_to_string(www.join("posts/a-first-post.html"))?;
        assert!(first.contains("Posted 01 January 2020."));
        assert!(www.join("posts/second.html").is_file());

        assert_eq!(
            "body { color: black; }",
            fs::read_to_string(www.join("css/style.css"))?
        );
        assert!(!www.join("stale.html").exists());
        assert!(!www.join("templates").exists());
        assert!(!www.join("_drafts").exists());
        assert!(!www.join(".hidden").exists());
        Ok(())
    }

    #[test]
    fn test_missing_template_falls_back_to_content(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        write(root.path(), "site/about.md", "About {{ blog_title }}")?;

        build_site(&config(root.path()))?;

        assert_eq!(
            "<p>About Field Notes</p>\n",
            fs::read_to_string(root.path().join("www/about.html"))?
        );
        Ok(())
    }

    #[test]
    fn test_malformed_directive_names_the_document() -> std::io::Result<()> {
        let root = tempfile::tempdir()?;
        write(root.path(), "site/bad.md", "{{ youtube() }}")?;

        match build_site(&config(root.path())) {
            Err(Error::Expand { path, err }) => {
                assert!(path.ends_with("bad.md"));
                assert!(matches!(
                    err,
                    expand::Error::Call {
                        err: CallError::MissingArgument(_),
                        ..
                    }
                ));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_listed_page_without_date_fails_the_lister() -> std::io::Result<()> {
        let root = tempfile::tempdir()?;
        write(root.path(), "site/blog.md", "{{ list_page() }}")?;
        write(root.path(), "site/blog/undated.md", "<!--\ntitle: Undated\n-->\n")?;

        match build_site(&config(root.path())) {
            Err(Error::Expand { path, .. }) => assert!(path.ends_with("blog.md")),
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_source_directory() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            build_site(&config(root.path())),
            Err(Error::MissingSource(_))
        ));
    }
}
