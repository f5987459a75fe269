//! Defines [`BuiltinRegistry`], the fixed set of bindings every document can
//! use unless its own metadata shadows them. The registry is built once per
//! build from the [`Site`] configuration and is read-only afterwards, so it can
//! be shared freely between expansions.
//!
//! | Name | Kind |
//! |------|------|
//! | `blog_title`, `blog_subtitle`, `style`, `syntax_color`, `root_url` | site constants |
//! | `menu` | `<li>` links to the top-level pages |
//! | `date_format(date, format)` | strftime-style formatting |
//! | `date_to_string(date)`, `date_to_long_string(date)` | display dates |
//! | `youtube(id, ...)`, `vimeo(id, ...)`, `gist(id, ...)` | embeds |
//! | `latex_math(latex)` | formula image URL |
//! | `email(email, displayname=None)` | obfuscated `mailto:` link |
//! | `google_analytics(id=...)` | analytics snippet |
//! | `disqus(...)`, `disqus_comment_count()` | comment widgets |

use crate::config::Site;
use crate::dates;
use crate::embed::{self, Origin, Vimeo, YouTube};
use crate::namespace::{Arguments, Binding, CallError, Macro, Param};
use crate::slugify::slugify;
use crate::util::is_private;
use crate::value::Value;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// The built-in bindings shared by every expansion.
#[derive(Debug)]
pub struct BuiltinRegistry {
    site: Site,
    bindings: HashMap<String, Binding<'static>>,
}

impl BuiltinRegistry {
    /// Builds the registry for `site`. `menu` is the pre-rendered navigation
    /// list (see [`menu`]).
    pub fn new(site: &Site, menu: String) -> BuiltinRegistry {
        let mut registry = BuiltinRegistry {
            site: site.clone(),
            bindings: HashMap::new(),
        };

        registry.literal("blog_title", &site.blog_title);
        registry.literal("blog_subtitle", &site.blog_subtitle);
        registry.literal("style", &site.style);
        registry.literal("syntax_color", &site.syntax_color);
        registry.literal(
            "root_url",
            site.root_url.as_ref().map(|url| url.as_str()).unwrap_or(""),
        );
        registry.literal("menu", menu);

        registry.define(
            "date_format",
            vec![Param::required("date"), Param::required("format")],
            |args| {
                dates::format(args.required_str("date")?, args.required_str("format")?)
                    .map(Value::from)
                    .map_err(date_error)
            },
        );
        registry.define("date_to_string", vec![Param::required("date")], |args| {
            dates::to_string(args.required_str("date")?)
                .map(Value::from)
                .map_err(date_error)
        });
        registry.define("date_to_long_string", vec![Param::required("date")], |args| {
            dates::to_long_string(args.required_str("date")?)
                .map(Value::from)
                .map_err(date_error)
        });

        registry.define(
            "youtube",
            vec![
                Param::required("id"),
                Param::with_default("width", 560i64),
                Param::with_default("height", 315i64),
                Param::with_default("related", true),
                Param::with_default("ssl", false),
                Param::with_default("cookie", true),
            ],
            |args| {
                let options = YouTube {
                    width: args.required_int("width")?,
                    height: args.required_int("height")?,
                    related: args.required_bool("related")?,
                    ssl: args.required_bool("ssl")?,
                    cookie: args.required_bool("cookie")?,
                };
                Ok(Value::from(embed::youtube(&args.required_text("id")?, &options)))
            },
        );
        registry.define(
            "vimeo",
            vec![
                Param::required("id"),
                Param::with_default("width", 560i64),
                Param::with_default("height", 315i64),
                Param::with_default("autoplay", false),
                Param::with_default("avatar", false),
                Param::with_default("title", true),
                Param::with_default("author", false),
                Param::optional("color"),
            ],
            |args| {
                let options = Vimeo {
                    width: args.required_int("width")?,
                    height: args.required_int("height")?,
                    autoplay: args.required_bool("autoplay")?,
                    avatar: args.required_bool("avatar")?,
                    title: args.required_bool("title")?,
                    author: args.required_bool("author")?,
                    color: args.str("color")?.map(str::to_owned),
                };
                Ok(Value::from(embed::vimeo(&args.required_text("id")?, &options)))
            },
        );
        registry.define(
            "gist",
            vec![
                Param::required("id"),
                Param::optional("filename"),
                Param::with_default("embed", true),
            ],
            |args| {
                args.required_bool("embed")?;
                Ok(Value::from(embed::gist(
                    &args.required_text("id")?,
                    args.str("filename")?,
                )))
            },
        );
        registry.define("latex_math", vec![Param::required("latex")], |args| {
            Ok(Value::from(embed::latex_math(args.required_str("latex")?)))
        });
        registry.define(
            "email",
            vec![Param::required("email"), Param::optional("displayname")],
            |args| {
                Ok(Value::from(embed::email(
                    args.required_str("email")?,
                    args.str("displayname")?,
                )))
            },
        );

        registry.define(
            "google_analytics",
            vec![Param::with_default("id", site.google_analytics_id.as_str())],
            |args| Ok(Value::from(embed::google_analytics(&args.required_text("id")?))),
        );
        let preview_host = site.host.clone();
        let preview_port = site.port;
        registry.define(
            "disqus",
            vec![
                Param::with_default("shortname", site.disqus_shortname.as_str()),
                Param::with_default("url", ""),
                Param::with_default(
                    "host",
                    site.root_url.as_ref().map(|url| url.as_str()).unwrap_or(""),
                ),
                Param::with_default("title", ""),
            ],
            move |args| {
                let origin = Origin {
                    host: args.required_str("host")?,
                    preview_host: &preview_host,
                    preview_port,
                };
                Ok(Value::from(embed::disqus(
                    args.required_str("shortname")?,
                    args.required_str("url")?,
                    &origin,
                    args.required_str("title")?,
                )))
            },
        );
        let shortname = site.disqus_shortname.clone();
        registry.define("disqus_comment_count", Vec::new(), move |_| {
            Ok(Value::from(embed::disqus_comment_count(&shortname)))
        });

        registry
    }

    fn literal<V: Into<Value>>(&mut self, name: &str, value: V) {
        self.bindings
            .insert(name.to_owned(), Binding::Literal(value.into()));
    }

    fn define<F>(&mut self, name: &str, params: Vec<Param>, func: F)
    where
        F: Fn(&Arguments) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.bindings
            .insert(name.to_owned(), Binding::Macro(Macro::new(params, func)));
    }

    pub fn get(&self, name: &str) -> Option<&Binding<'static>> {
        self.bindings.get(name)
    }

    /// The names of all built-ins, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Where this site's pages are served from, for comment widgets.
    pub fn origin(&self) -> Origin<'_> {
        Origin {
            host: self.site.root_url.as_ref().map(|url| url.as_str()).unwrap_or(""),
            preview_host: &self.site.host,
            preview_port: self.site.port,
        }
    }

    /// The comment thread for a page, as injected into page namespaces.
    pub fn disqus_thread(&self, url: &str, title: &str) -> String {
        embed::disqus(&self.site.disqus_shortname, url, &self.origin(), title)
    }
}

fn date_error(err: dates::Error) -> CallError {
    match err {
        dates::Error::InvalidDate(_) => CallError::invalid("date", err.to_string()),
        dates::Error::InvalidFormat(_) => CallError::invalid("format", err.to_string()),
    }
}

/// Renders the navigation menu: a link to the home page followed by one link
/// per document directly under `source_directory` (other than `index`), in
/// file-name order.
pub fn menu(source_directory: &Path, markdown_extension: &str) -> io::Result<String> {
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(source_directory)? {
        let entry = entry?;
        let path = entry.path();
        if is_private(&path) || !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = file_name.strip_suffix(markdown_extension) {
            if slugify(stem) != "index" {
                stems.push(stem.to_owned());
            }
        }
    }
    stems.sort();

    let mut menu = String::from("<li><a href=\"/index.html\"> home</a></li>\n");
    for stem in stems {
        menu.push_str(&format!(
            "<li><a href=\"/{}.html\"> {}</a></li>\n",
            slugify(&stem),
            stem
        ));
    }
    Ok(menu)
}
