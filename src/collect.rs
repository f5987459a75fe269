//! Collects the child pages listed by a document. A document `blog.md` owns
//! the pages under the sibling directory `blog/`; each of them is read,
//! given its metadata namespace, expanded, converted, and the results are
//! sorted by date. The `list_page` macro ([`list_page_macro`]) wires this
//! into expansion so a document can render a listing of its children through
//! [`crate::listing`].
//!
//! Entries whose names start with `.` or `_` are skipped, and so is
//! everything below a directory named that way. This is stricter than
//! filtering file names alone: `blog/_drafts/post.md` is never listed.

use crate::builtins::BuiltinRegistry;
use crate::convert::{self, Converter};
use crate::dates;
use crate::expand::{self, expand};
use crate::listing::{self, Mode};
use crate::metadata::{self, Metadata};
use crate::namespace::{CallError, Macro, Namespace, Param};
use crate::slugify::slugify;
use crate::util::is_private;
use crate::value::Value;
use chrono::NaiveDateTime;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// The extension of rendered documents.
pub const HTML_EXTENSION: &str = "html";

/// The order of a listing, by date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// A fully rendered child page, ready to be listed.
#[derive(Clone, Debug)]
pub struct CollectedPage {
    /// The page's source file.
    pub source: PathBuf,

    /// The page's metadata plus the derived `url`, `disqus`, `date_string`
    /// and `date_long_string` fields.
    pub fields: Metadata,

    /// The converted body.
    pub html: String,

    /// The site-absolute URL of the rendered page, e.g. `/blog/hello.html`.
    pub url: String,

    date: NaiveDateTime,
}

impl CollectedPage {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Looks up a field a consumer can't do without.
    pub fn require(&self, field: &'static str) -> Result<&str> {
        self.field(field).ok_or_else(|| Error::MissingField {
            path: self.source.clone(),
            field,
        })
    }
}

/// Discovers, renders, and sorts child pages.
pub struct Collector<'a> {
    /// The root of the source tree; URLs are relative to it.
    pub source_directory: &'a Path,

    /// The extension (with the dot) that marks documents.
    pub markdown_extension: &'a str,

    pub builtins: &'a BuiltinRegistry,

    pub converter: &'a dyn Converter,
}

impl<'a> Collector<'a> {
    /// The directory holding `document`'s child pages: `document`'s path with
    /// the document extension removed.
    pub fn children_directory(&self, document: &Path) -> PathBuf {
        let file_name = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name
            .strip_suffix(self.markdown_extension)
            .unwrap_or(&file_name);
        document.with_file_name(stem)
    }

    /// Collects the child pages of `document` in date `order`. A document
    /// without a children directory has no children. Every child must have a
    /// `date`; one that doesn't fails the whole collection.
    pub fn collect(&self, document: &Path, order: Order) -> Result<Vec<CollectedPage>> {
        let directory = self.children_directory(document);
        if !directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        let walker = WalkDir::new(&directory)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_private(entry.path()));
        for result in walker {
            let entry = result?;
            if entry.file_type().is_file() && self.is_document(entry.path()) {
                pages.push(self.collect_page(entry.path())?);
            }
        }

        // Sorting is stable, so pages with equal dates stay in file-name order.
        match order {
            Order::Ascending => pages.sort_by(|a, b| a.date.cmp(&b.date)),
            Order::Descending => pages.sort_by(|a, b| b.date.cmp(&a.date)),
        }
        Ok(pages)
    }

    fn is_document(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(self.markdown_extension))
            .unwrap_or(false)
    }

    fn collect_page(&self, path: &Path) -> Result<CollectedPage> {
        debug!(path = %path.display(), "collecting page");
        let text = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;

        let relative = path
            .strip_prefix(self.source_directory)
            .map_err(|_| Error::OutsideSource(path.to_owned()))?;
        let url = url_for(&rendered_path(relative, self.markdown_extension));
        let fields = page_fields(self.builtins, &url, metadata::extract(&text)).map_err(|err| {
            Error::Date {
                path: path.to_owned(),
                err,
            }
        })?;
        let date = match fields.get("date") {
            None => {
                return Err(Error::MissingField {
                    path: path.to_owned(),
                    field: "date",
                })
            }
            Some(date) => dates::parse(date).map_err(|err| Error::Date {
                path: path.to_owned(),
                err,
            })?,
        };

        let namespace = page_namespace(self.builtins, &fields);
        let expanded = expand(&text, &namespace).map_err(|err| Error::Expand {
            path: path.to_owned(),
            err,
        })?;
        let html = self
            .converter
            .convert(&expanded)
            .map_err(|err| Error::Convert {
                path: path.to_owned(),
                err,
            })?;

        Ok(CollectedPage {
            source: path.to_owned(),
            fields,
            html,
            url,
            date,
        })
    }
}

/// Adds the fields every page namespace derives from its metadata: `url`,
/// `disqus` (the page's comment thread), and, when the page has a `date`,
/// `date_string` and `date_long_string`. A page without a `title` gets an
/// untitled comment thread.
pub fn page_fields(
    builtins: &BuiltinRegistry,
    url: &str,
    mut fields: Metadata,
) -> dates::Result<Metadata> {
    fields.insert(String::from("url"), url.to_owned());
    let title = fields.get("title").map(String::as_str).unwrap_or("");
    let disqus = builtins.disqus_thread(url, title);
    fields.insert(String::from("disqus"), disqus);
    if let Some(date) = fields.get("date").cloned() {
        fields.insert(String::from("date_string"), dates::to_string(&date)?);
        fields.insert(String::from("date_long_string"), dates::to_long_string(&date)?);
    }
    Ok(fields)
}

/// Layers `fields` over the built-ins.
pub fn page_namespace<'a>(builtins: &'a BuiltinRegistry, fields: &Metadata) -> Namespace<'a> {
    let mut namespace = Namespace::with_builtins(builtins);
    for (key, value) in fields {
        namespace.literal(key.as_str(), value.as_str());
    }
    namespace
}

/// The output path of a document relative to the output root: the same
/// directories, with the file stem slugified and the extension replaced by
/// `.html` (`posts/My Post.md` becomes `posts/my-post.html`).
pub fn rendered_path(relative: &Path, markdown_extension: &str) -> PathBuf {
    let file_name = relative
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(markdown_extension)
        .unwrap_or(&file_name);
    relative.with_file_name(format!("{}.{}", slugify(stem), HTML_EXTENSION))
}

/// The site-absolute URL for an output path relative to the output root.
pub fn url_for(rendered: &Path) -> String {
    let mut url = String::new();
    for component in rendered.components() {
        url.push('/');
        url.push_str(&component.as_os_str().to_string_lossy());
    }
    url
}

/// Builds the `list_page` macro for `document`:
///
/// `list_page(path=None, max=None, content=False, reverse=True)`
///
/// lists the children of `document` (or, given `path`, of the sibling
/// document with that name), newest first unless `reverse=False`, at most
/// `max` of them, as full articles if `content=True` and one-line summaries
/// otherwise.
pub fn list_page_macro<'a>(collector: &'a Collector<'a>, document: &'a Path) -> Macro<'a> {
    Macro::new(
        vec![
            Param::optional("path"),
            Param::optional("max"),
            Param::with_default("content", false),
            Param::with_default("reverse", true),
        ],
        move |args| {
            let target = match args.str("path")? {
                Some(name) => {
                    document.with_file_name(format!("{}{}", name, collector.markdown_extension))
                }
                None => document.to_owned(),
            };
            let limit = match args.int("max")? {
                None => None,
                Some(max) if max < 0 => {
                    return Err(CallError::invalid("max", "must not be negative"))
                }
                Some(max) => Some(max as usize),
            };
            let mode = match args.required_bool("content")? {
                true => Mode::Content,
                false => Mode::Summary,
            };
            let order = match args.required_bool("reverse")? {
                true => Order::Descending,
                false => Order::Ascending,
            };

            let pages = collector
                .collect(&target, order)
                .map_err(|err| CallError::Failed(Box::new(err)))?;
            listing::render(&pages, limit, mode)
                .map(Value::from)
                .map_err(|err| CallError::Failed(Box::new(err)))
        },
    )
}

/// The result of a fallible collection.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a child page that can't be collected or listed.
#[derive(Debug)]
pub enum Error {
    /// Returned when a page can't be read.
    Read { path: PathBuf, err: io::Error },

    /// Returned for errors walking the children directory.
    WalkDir(walkdir::Error),

    /// Returned when a page lies outside the source directory, so it has no
    /// URL.
    OutsideSource(PathBuf),

    /// Returned when a page lacks a field that sorting or listing needs.
    MissingField { path: PathBuf, field: &'static str },

    /// Returned when a page's `date` can't be parsed.
    Date { path: PathBuf, err: dates::Error },

    /// Returned when a page's body can't be expanded.
    Expand { path: PathBuf, err: expand::Error },

    /// Returned when a page's body can't be converted.
    Convert { path: PathBuf, err: convert::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => write!(f, "reading page `{}`: {}", path.display(), err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::OutsideSource(path) => write!(
                f,
                "page `{}` is outside the source directory",
                path.display()
            ),
            Error::MissingField { path, field } => write!(
                f,
                "page `{}` has no `{}` field",
                path.display(),
                field
            ),
            Error::Date { path, err } => write!(f, "page `{}`: {}", path.display(), err),
            Error::Expand { path, err } => write!(f, "page `{}`: {}", path.display(), err),
            Error::Convert { path, err } => write!(f, "page `{}`: {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { err, .. } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::OutsideSource(_) => None,
            Error::MissingField { .. } => None,
            Error::Date { err, .. } => Some(err),
            Error::Expand { err, .. } => Some(err),
            Error::Convert { err, .. } => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the children directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
