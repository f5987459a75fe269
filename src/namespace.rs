//! Defines the [`Namespace`] that directives are resolved against, the
//! [`Binding`]s it holds, and [`Macro`], a callable with a declared parameter
//! list. Argument binding (positional, keyword, defaults) happens here so every
//! macro gets the same, strict treatment of malformed calls.

use crate::builtins::BuiltinRegistry;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// The body of a [`Macro`].
pub type MacroFn<'a> =
    dyn Fn(&Arguments) -> Result<Value, CallError> + Send + Sync + 'a;

/// A declared macro parameter.
#[derive(Clone, Debug)]
pub struct Param {
    name: &'static str,
    fallback: Fallback,
}

#[derive(Clone, Debug)]
enum Fallback {
    /// The caller must supply the argument.
    Required,

    /// The argument may be omitted and is then absent from [`Arguments`].
    Absent,

    /// The argument defaults to a value.
    Default(Value),
}

impl Param {
    pub fn required(name: &'static str) -> Param {
        Param {
            name,
            fallback: Fallback::Required,
        }
    }

    pub fn optional(name: &'static str) -> Param {
        Param {
            name,
            fallback: Fallback::Absent,
        }
    }

    pub fn with_default<V: Into<Value>>(name: &'static str, default: V) -> Param {
        Param {
            name,
            fallback: Fallback::Default(default.into()),
        }
    }
}

/// A callable binding: a parameter list and the function implementing it.
pub struct Macro<'a> {
    params: Vec<Param>,
    func: Box<MacroFn<'a>>,
}

impl<'a> Macro<'a> {
    pub fn new<F>(params: Vec<Param>, func: F) -> Macro<'a>
    where
        F: Fn(&Arguments) -> Result<Value, CallError> + Send + Sync + 'a,
    {
        Macro {
            params,
            func: Box::new(func),
        }
    }

    /// Binds the arguments against the parameter list and invokes the macro.
    pub fn call(
        &self,
        positional: &[Value],
        keywords: &[(String, Value)],
    ) -> Result<Value, CallError> {
        let args = self.bind(positional, keywords)?;
        (self.func)(&args)
    }

    fn bind(
        &self,
        positional: &[Value],
        keywords: &[(String, Value)],
    ) -> Result<Arguments, CallError> {
        if positional.len() > self.params.len() {
            return Err(CallError::TooManyArguments {
                expected: self.params.len(),
                found: positional.len(),
            });
        }

        let mut values: HashMap<&'static str, Value> = HashMap::new();
        for (param, value) in self.params.iter().zip(positional) {
            values.insert(param.name, value.clone());
        }

        for (name, value) in keywords {
            let param = self
                .params
                .iter()
                .find(|p| p.name == name.as_str())
                .ok_or_else(|| CallError::UnknownKeyword(name.clone()))?;
            if values.insert(param.name, value.clone()).is_some() {
                return Err(CallError::DuplicateArgument(name.clone()));
            }
        }

        for param in &self.params {
            if values.contains_key(param.name) {
                continue;
            }
            match &param.fallback {
                Fallback::Required => {
                    return Err(CallError::MissingArgument(param.name.to_owned()))
                }
                Fallback::Absent => {}
                Fallback::Default(value) => {
                    values.insert(param.name, value.clone());
                }
            }
        }

        Ok(Arguments { values })
    }
}

impl fmt::Debug for Macro<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Macro").field("params", &self.params).finish()
    }
}

/// The arguments of a macro invocation after binding. Every required parameter
/// and every parameter with a default is present; optional parameters without
/// a default are present only if the caller passed them.
#[derive(Debug)]
pub struct Arguments {
    values: HashMap<&'static str, Value>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The argument rendered as text, whatever its literal type.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(Value::to_string)
    }

    pub fn str(&self, name: &str) -> Result<Option<&str>, CallError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(other) => Err(CallError::type_mismatch(name, "string", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, CallError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(CallError::type_mismatch(name, "integer", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>, CallError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(CallError::type_mismatch(name, "boolean", other)),
        }
    }

    pub fn required_text(&self, name: &str) -> Result<String, CallError> {
        self.text(name).ok_or_else(|| CallError::MissingArgument(name.to_owned()))
    }

    pub fn required_str(&self, name: &str) -> Result<&str, CallError> {
        self.str(name)?.ok_or_else(|| CallError::MissingArgument(name.to_owned()))
    }

    pub fn required_int(&self, name: &str) -> Result<i64, CallError> {
        self.int(name)?.ok_or_else(|| CallError::MissingArgument(name.to_owned()))
    }

    pub fn required_bool(&self, name: &str) -> Result<bool, CallError> {
        self.bool(name)?.ok_or_else(|| CallError::MissingArgument(name.to_owned()))
    }
}

/// What an identifier is bound to.
#[derive(Debug)]
pub enum Binding<'a> {
    Literal(Value),
    Macro(Macro<'a>),
}

/// The identifiers visible to one expansion: page-specific bindings layered
/// over an optional, shared [`BuiltinRegistry`]. Page bindings shadow
/// built-ins of the same name.
#[derive(Debug, Default)]
pub struct Namespace<'a> {
    bindings: HashMap<String, Binding<'a>>,
    builtins: Option<&'a BuiltinRegistry>,
}

impl<'a> Namespace<'a> {
    /// An empty namespace with no built-ins underneath.
    pub fn new() -> Namespace<'a> {
        Namespace {
            bindings: HashMap::new(),
            builtins: None,
        }
    }

    /// An empty page layer on top of `builtins`.
    pub fn with_builtins(builtins: &'a BuiltinRegistry) -> Namespace<'a> {
        Namespace {
            bindings: HashMap::new(),
            builtins: Some(builtins),
        }
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, binding: Binding<'a>) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn literal<S: Into<String>, V: Into<Value>>(&mut self, name: S, value: V) {
        self.insert(name, Binding::Literal(value.into()));
    }

    pub fn define<S: Into<String>>(&mut self, name: S, m: Macro<'a>) {
        self.insert(name, Binding::Macro(m));
    }

    /// Looks `name` up in the page layer, then in the built-ins.
    pub fn get(&self, name: &str) -> Option<&Binding<'a>> {
        match self.bindings.get(name) {
            Some(binding) => Some(binding),
            None => self.builtins.and_then(|builtins| builtins.get(name)),
        }
    }
}

/// Represents a macro invocation that can't be carried out: the arguments
/// don't fit the parameter list, or the macro itself failed.
#[derive(Debug)]
pub enum CallError {
    /// Returned when call syntax is applied to a literal binding.
    NotCallable(String),

    /// Returned when a macro is passed as an argument.
    MacroArgument(String),

    /// Returned when more positional arguments are passed than there are
    /// parameters.
    TooManyArguments { expected: usize, found: usize },

    /// Returned when a keyword argument names no parameter.
    UnknownKeyword(String),

    /// Returned when a parameter is given both positionally and by keyword,
    /// or by the same keyword twice.
    DuplicateArgument(String),

    /// Returned when a required parameter is not supplied.
    MissingArgument(String),

    /// Returned when an argument has the wrong literal type.
    Type {
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Returned when an argument has the right type but an unusable value.
    Invalid { param: String, message: String },

    /// Returned when the macro's own work fails.
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl CallError {
    fn type_mismatch(param: &str, expected: &'static str, found: &Value) -> CallError {
        CallError::Type {
            param: param.to_owned(),
            expected,
            found: found.kind(),
        }
    }

    pub fn invalid<S: Into<String>>(param: &str, message: S) -> CallError {
        CallError::Invalid {
            param: param.to_owned(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CallError::NotCallable(name) => write!(f, "`{}` is not callable", name),
            CallError::MacroArgument(name) => {
                write!(f, "macro `{}` can't be passed as an argument", name)
            }
            CallError::TooManyArguments { expected, found } => write!(
                f,
                "takes at most {} positional argument(s) but {} were given",
                expected, found
            ),
            CallError::UnknownKeyword(name) => {
                write!(f, "unexpected keyword argument `{}`", name)
            }
            CallError::DuplicateArgument(name) => {
                write!(f, "multiple values for argument `{}`", name)
            }
            CallError::MissingArgument(name) => {
                write!(f, "missing required argument `{}`", name)
            }
            CallError::Type {
                param,
                expected,
                found,
            } => write!(f, "argument `{}` must be a {}, not a {}", param, expected, found),
            CallError::Invalid { param, message } => {
                write!(f, "invalid argument `{}`: {}", param, message)
            }
            CallError::Failed(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn echo() -> Macro<'static> {
        Macro::new(
            vec![
                Param::required("id"),
                Param::optional("label"),
                Param::with_default("width", 560i64),
            ],
            |args| {
                Ok(Value::from(format!(
                    "{}|{}|{}",
                    args.required_text("id")?,
                    args.str("label")?.unwrap_or("-"),
                    args.required_int("width")?,
                )))
            },
        )
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_defaults() -> Result<(), CallError> {
        assert_eq!(s("a|-|560"), echo().call(&[s("a")], &[])?);
        Ok(())
    }

    #[test]
    fn test_positional_and_keyword() -> Result<(), CallError> {
        assert_eq!(
            s("a|b|400"),
            echo().call(&[s("a"), s("b")], &[("width".to_owned(), Value::Int(400))])?
        );
        Ok(())
    }

    #[test]
    fn test_missing_required() {
        match echo().call(&[], &[("label".to_owned(), s("b"))]) {
            Err(CallError::MissingArgument(name)) => assert_eq!("id", name),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_too_many_positional() {
        match echo().call(&[s("a"), s("b"), Value::Int(1), Value::Int(2)], &[]) {
            Err(CallError::TooManyArguments { expected: 3, found: 4 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_and_duplicate_keywords() {
        match echo().call(&[s("a")], &[("height".to_owned(), Value::Int(1))]) {
            Err(CallError::UnknownKeyword(name)) => assert_eq!("height", name),
            other => panic!("unexpected result: {:?}", other),
        }
        match echo().call(&[s("a")], &[("id".to_owned(), s("b"))]) {
            Err(CallError::DuplicateArgument(name)) => assert_eq!("id", name),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch() {
        match echo().call(&[s("a")], &[("width".to_owned(), s("wide"))]) {
            Err(CallError::Type {
                param,
                expected: "integer",
                found: "string",
            }) => assert_eq!("width", param),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_page_bindings_shadow_nothing_without_builtins() {
        let mut ns = Namespace::new();
        ns.literal("title", "Hello");
        assert!(matches!(ns.get("title"), Some(Binding::Literal(Value::Str(t))) if t == "Hello"));
        assert!(ns.get("missing").is_none());
    }
}
