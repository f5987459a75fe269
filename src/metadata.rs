//! Extracts the `key: value` metadata block from the head of a document. The
//! block is an HTML comment, so it stays invisible if a document is ever
//! served unconverted:
//!
//! ```md
//! <!--
//! title: Hello, world!
//! date: 2021-04-16 09:30
//! abstract: The first post.
//! -->
//! # Hello
//! ```

use std::collections::HashMap;

/// Opens the metadata block.
pub const OPEN_MARKER: &str = "<!--";

/// Closes the metadata block.
pub const CLOSE_MARKER: &str = "-->";

/// The flat key/value map parsed out of a metadata block. Keys keep their
/// case.
pub type Metadata = HashMap<String, String>;

/// Extracts the metadata from the first comment block in `text`. Each line is
/// split on its first colon and both sides are trimmed. Lines without a
/// colon, with an empty key, or whose key contains whitespace (i.e. prose) are
/// skipped. A document without a block yields an empty map; nothing here is
/// an error, so consumers must treat every key as optional.
pub fn extract(text: &str) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(block) = block(text) {
        for line in block.lines() {
            if let Some((key, value)) = split_line(line) {
                metadata.insert(key.to_owned(), value.to_owned());
            }
        }
    }
    metadata
}

fn block(text: &str) -> Option<&str> {
    let start = text.find(OPEN_MARKER)? + OPEN_MARKER.len();
    let stop = start + text[start..].find(CLOSE_MARKER)?;
    Some(&text[start..stop])
}

fn split_line(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let key = line[..colon].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, line[colon + 1..].trim()))
}
