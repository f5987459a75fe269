//! Expands `{{ ... }}` directives in a document against a [`Namespace`].
//!
//! Each directive body is resolved in order:
//!
//! 1. If the trimmed body is exactly a bound name, a literal is substituted
//!    by its text. A macro referenced without call syntax can't produce text,
//!    so the directive is left as it is.
//! 2. Otherwise the body is parsed as a call ([`crate::expr`]) and the macro
//!    is invoked. Arguments that name a literal binding pass its value.
//! 3. Names that aren't bound, whether called or passed as arguments, are not
//!    errors: the directive is left verbatim
//!    so it stays visible in the output (or can be filled in by a later pass
//!    against another namespace). Calls that don't fit the macro's signature
//!    are errors, as is any failure inside the macro.
//!
//! Expansion is a single left-to-right pass over the input. Substituted text
//! is never scanned again, so a value that itself contains `{{ ... }}` is
//! emitted as is.

use crate::expr::{self, Argument, Directive};
use crate::namespace::{Binding, CallError, Namespace};
use crate::value::Value;
use std::fmt;
use tracing::debug;

/// Opens a directive.
pub const OPEN_MARKER: &str = "{{";

/// Closes a directive.
pub const CLOSE_MARKER: &str = "}}";

/// Expands every directive in `text`. See the module docs for the resolution
/// rules.
pub fn expand(text: &str, namespace: &Namespace) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN_MARKER) {
        let body_start = start + OPEN_MARKER.len();
        let body_stop = match rest[body_start..].find(CLOSE_MARKER) {
            Some(offset) => body_start + offset,
            // no directive can close past this point
            None => break,
        };
        let span_stop = body_stop + CLOSE_MARKER.len();

        output.push_str(&rest[..start]);
        match resolve(&rest[body_start..body_stop], namespace)? {
            Some(replacement) => output.push_str(&replacement),
            None => output.push_str(&rest[start..span_stop]),
        }
        rest = &rest[span_stop..];
    }
    output.push_str(rest);
    Ok(output)
}

// Returns the replacement text for a directive body, or `None` if the
// directive should be left untouched.
fn resolve(body: &str, namespace: &Namespace) -> Result<Option<String>> {
    let body = body.trim();
    match namespace.get(body) {
        Some(Binding::Literal(value)) => return Ok(Some(value.to_string())),
        Some(Binding::Macro(_)) => {
            debug!(directive = body, "macro referenced without call syntax");
            return Ok(None);
        }
        None => {}
    }

    let call = match expr::parse(body) {
        Ok(Some(Directive::Call(call))) => call,
        Ok(Some(Directive::Identifier(name))) => {
            debug!(name = name, "unresolved identifier");
            return Ok(None);
        }
        Ok(None) => {
            debug!(directive = body, "not a directive");
            return Ok(None);
        }
        Err(err) => {
            return Err(Error::Parse {
                directive: body.to_owned(),
                err,
            })
        }
    };

    let call_error = |err| Error::Call {
        directive: body.to_owned(),
        err,
    };
    let m = match namespace.get(call.name) {
        None => {
            debug!(name = call.name, "unresolved macro");
            return Ok(None);
        }
        Some(Binding::Literal(_)) => {
            return Err(call_error(CallError::NotCallable(call.name.to_owned())))
        }
        Some(Binding::Macro(m)) => m,
    };

    let mut positional = Vec::with_capacity(call.positional.len());
    for arg in &call.positional {
        match argument(arg, namespace).map_err(call_error)? {
            Some(value) => positional.push(value),
            None => return Ok(None),
        }
    }
    let mut keywords = Vec::with_capacity(call.keywords.len());
    for (name, arg) in &call.keywords {
        match argument(arg, namespace).map_err(call_error)? {
            Some(value) => keywords.push((name.to_string(), value)),
            None => return Ok(None),
        }
    }

    m.call(&positional, &keywords)
        .map(|value| Some(value.to_string()))
        .map_err(call_error)
}

// The value passed for an argument, or `None` if it references an unbound
// name, in which case the whole directive is left untouched.
fn argument(
    arg: &Argument<'_>,
    namespace: &Namespace,
) -> std::result::Result<Option<Value>, CallError> {
    match arg {
        Argument::Literal(value) => Ok(Some(value.clone())),
        Argument::Reference(name) => match namespace.get(name) {
            Some(Binding::Literal(value)) => Ok(Some(value.clone())),
            Some(Binding::Macro(_)) => Err(CallError::MacroArgument((*name).to_owned())),
            None => {
                debug!(name = *name, "unresolved argument");
                Ok(None)
            }
        },
    }
}

/// The result of a fallible expansion.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a directive that names a known macro but can't be expanded.
#[derive(Debug)]
pub enum Error {
    /// Returned when a directive starts like a call but its arguments don't
    /// parse.
    Parse { directive: String, err: expr::Error },

    /// Returned when the arguments don't fit the macro's parameters, when a
    /// literal is called, or when the macro itself fails.
    Call { directive: String, err: CallError },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse { directive, err } => write!(
                f,
                "malformed directive `{} {} {}`: {}",
                OPEN_MARKER, directive, CLOSE_MARKER, err
            ),
            Error::Call { directive, err } => write!(
                f,
                "expanding `{} {} {}`: {}",
                OPEN_MARKER, directive, CLOSE_MARKER, err
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse { err, .. } => Some(err),
            Error::Call { err, .. } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builtins::BuiltinRegistry;
    use crate::config::Site;
    use crate::namespace::{Macro, Param};

    fn namespace() -> Namespace<'static> {
        let mut ns = Namespace::new();
        ns.literal("title", "Hello");
        ns.literal("count", 3i64);
        ns.literal("nested", "{{ title }}");
        ns.define(
            "shout",
            Macro::new(
                vec![Param::required("text"), Param::with_default("times", 1i64)],
                |args| {
                    let text = args.required_str("text")?.to_uppercase();
                    let times = args.required_int("times")?;
                    if times < 0 {
                        return Err(CallError::invalid("times", "must not be negative"));
                    }
                    Ok(Value::from(text.repeat(times as usize)))
                },
            ),
        );
        ns
    }

    #[test]
    fn test_text_without_directives_is_unchanged() -> Result<()> {
        let ns = namespace();
        for text in &["", "plain text", "a { b } c", "}} {", "{ {title} }", "{{ unterminated"] {
            assert_eq!(*text, expand(text, &ns)?);
        }
        Ok(())
    }

    #[test]
    fn test_literals() -> Result<()> {
        let ns = namespace();
        assert_eq!("Hello", expand("{{title}}", &ns)?);
        assert_eq!("<h1>Hello</h1> x3", expand("<h1>{{ title }}</h1> x{{count}}", &ns)?);
        Ok(())
    }

    #[test]
    fn test_unresolved_identifier_is_left_verbatim() -> Result<()> {
        let ns = namespace();
        assert_eq!("{{missing}}", expand("{{missing}}", &ns)?);
        assert_eq!("a {{ missing }} b", expand("a {{ missing }} b", &ns)?);
        assert_eq!("{{ missing(1, x=2) }}", expand("{{ missing(1, x=2) }}", &ns)?);
        assert_eq!("{{ a.b }}", expand("{{ a.b }}", &ns)?);
        Ok(())
    }

    #[test]
    fn test_bare_macro_reference_is_left_verbatim() -> Result<()> {
        assert_eq!("{{ shout }}", expand("{{ shout }}", &namespace())?);
        Ok(())
    }

    #[test]
    fn test_calls() -> Result<()> {
        let ns = namespace();
        assert_eq!("HI", expand(r#"{{ shout("hi") }}"#, &ns)?);
        assert_eq!("HIHI!", expand(r#"{{shout('hi', times=2)}}!"#, &ns)?);
        Ok(())
    }

    #[test]
    fn test_substitutions_are_not_rescanned() -> Result<()> {
        assert_eq!("{{ title }} Hello", expand("{{nested}} {{title}}", &namespace())?);
        Ok(())
    }

    #[test]
    fn test_non_greedy_spans() -> Result<()> {
        assert_eq!(
            "Hello }} HELLO",
            expand(r#"{{ title }} }} {{ shout("hello") }}"#, &namespace())?
        );
        Ok(())
    }

    #[test]
    fn test_malformed_call_is_an_error() {
        let ns = namespace();
        match expand(r#"ok {{ shout("a", "b", "c") }}"#, &ns) {
            Err(Error::Call {
                directive,
                err: CallError::TooManyArguments { .. },
            }) => assert_eq!(r#"shout("a", "b", "c")"#, directive),
            other => panic!("unexpected result: {:?}", other),
        }
        match expand(r#"{{ shout("a) }}"#, &ns) {
            Err(Error::Parse { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match expand(r#"{{ shout(times=-1, text="a") }}"#, &ns) {
            Err(Error::Call {
                err: CallError::Invalid { .. },
                ..
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_arguments_reference_literals() -> Result<()> {
        let ns = namespace();
        assert_eq!("HELLO", expand("{{ shout(title) }}", &ns)?);
        assert_eq!("HELLOHELLOHELLO", expand("{{ shout(title, times=count) }}", &ns)?);
        Ok(())
    }

    #[test]
    fn test_unbound_argument_is_left_verbatim() -> Result<()> {
        let ns = namespace();
        assert_eq!("{{ shout(video_id) }}", expand("{{ shout(video_id) }}", &ns)?);
        assert_eq!(
            "{{ shout(title, times=missing) }} HELLO",
            expand("{{ shout(title, times=missing) }} {{ shout(title) }}", &ns)?
        );
        Ok(())
    }

    #[test]
    fn test_builtins_take_page_values() -> Result<()> {
        let registry = BuiltinRegistry::new(&Site::default(), String::new());
        let mut ns = Namespace::with_builtins(&registry);
        assert_eq!("{{ youtube(video_id) }}", expand("{{ youtube(video_id) }}", &ns)?);

        ns.literal("date", "2020-03-01");
        assert_eq!("2020", expand(r#"{{ date_format(date, "%Y") }}"#, &ns)?);
        Ok(())
    }

    #[test]
    fn test_macro_argument_is_an_error() {
        match expand("{{ shout(shout) }}", &namespace()) {
            Err(Error::Call {
                err: CallError::MacroArgument(name),
                ..
            }) => assert_eq!("shout", name),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_calling_a_literal_is_an_error() {
        match expand("{{ title() }}", &namespace()) {
            Err(Error::Call {
                err: CallError::NotCallable(name),
                ..
            }) => assert_eq!("title", name),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
