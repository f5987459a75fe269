//! The library code for the `scriptorium` static site generator. Documents
//! are Markdown files whose bodies may contain `{{ ... }}` directives. The
//! architecture can be generally broken down into three steps per document:
//!
//! 1. Extracting the page metadata from the leading HTML comment
//!    ([`crate::metadata`])
//! 2. Expanding directives against the page's namespace layered over the
//!    built-ins ([`crate::expand`], [`crate::namespace`], [`crate::builtins`])
//! 3. Converting the expanded body to HTML and wrapping it in the site
//!    template ([`crate::convert`], [`crate::build`])
//!
//! The second step is the more involved, because a document may list its
//! child pages through the `list_page` macro. Listing a page collects,
//! expands and converts every child ([`crate::collect`]) before rendering them
//! as full articles or one-line summaries ([`crate::listing`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod builtins;
pub mod collect;
pub mod config;
pub mod convert;
pub mod dates;
pub mod embed;
pub mod expand;
pub mod expr;
pub mod listing;
pub mod metadata;
pub mod namespace;
pub mod slugify;
pub mod util;
pub mod value;
