use bytes::Bytes;
use serde_json::Value;

use crate::request::HttpVerb;

/// Positional call-time arguments of an operation.
///
/// `null` arguments are treated as absent. Build them with the [`args!`](crate::args)
/// macro:
///
/// ```rust
/// use spom_core::args;
///
/// let args = args!["Tasks", 5, { "Title": "New" }];
/// assert_eq!(args.text(0), Some("Tasks"));
/// assert_eq!(args.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
    content: Option<Bytes>,
}

impl Args {
    /// No argument.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Attaches binary content (file uploads), sent instead of a JSON body.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// The argument at `idx`, unless absent or `null`.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx).filter(|value| !value.is_null())
    }

    /// The argument at `idx` as a string.
    pub fn text(&self, idx: usize) -> Option<&str> {
        self.get(idx).and_then(Value::as_str)
    }

    /// Takes the argument at `idx` out, leaving `null`.
    pub fn take(&mut self, idx: usize) -> Option<Value> {
        self.values
            .get_mut(idx)
            .map(Value::take)
            .filter(|value| !value.is_null())
    }

    /// The binary content.
    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub(crate) fn take_content(&mut self) -> Option<Bytes> {
        self.content.take()
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there is no positional argument.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values,
            content: None,
        }
    }
}

impl From<()> for Args {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// A `GET` issued through [`Resource::execute_get`](crate::Resource::execute_get).
///
/// Plain calls only name the next hop and resolve lazily; body and buffer calls run
/// immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetCall {
    pub(crate) name: Option<String>,
    pub(crate) arg: Option<Value>,
    pub(crate) data: Option<Value>,
    pub(crate) in_body: bool,
    pub(crate) buffer: bool,
    pub(crate) metadata_type: Option<String>,
    pub(crate) suffix: Option<String>,
}

impl GetCall {
    /// A call on the object itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// A call of the method (or relative path) `name`.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the path argument, rendered as `name(arg)`.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.arg = Some(arg.into()).filter(|arg: &Value| !arg.is_null());
        self
    }

    /// Sets the data, rendered as a parameter alias unless sent in the body.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into()).filter(|data: &Value| !data.is_null());
        self
    }

    /// Sends the data as the request body; the call runs immediately.
    #[must_use]
    pub fn in_body(mut self) -> Self {
        self.in_body = true;
        self
    }

    /// Asks for the raw response bytes; the call runs immediately.
    #[must_use]
    pub fn buffer(mut self) -> Self {
        self.buffer = true;
        self
    }

    /// Stamps `metadata_type` into the body.
    #[must_use]
    pub fn with_metadata_type(mut self, metadata_type: impl Into<String>) -> Self {
        self.metadata_type = Some(metadata_type.into());
        self
    }

    /// Appends `.suffix` to the endpoint of this call.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}

/// A write issued through [`Resource::execute_post`](crate::Resource::execute_post).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostCall {
    pub(crate) name: Option<String>,
    pub(crate) arg: Option<Value>,
    pub(crate) data: Option<Value>,
    pub(crate) content: Option<Bytes>,
    pub(crate) in_body: bool,
    pub(crate) metadata_type: Option<String>,
    pub(crate) verb: HttpVerb,
    pub(crate) suffix: Option<String>,
}

impl PostCall {
    /// A `POST` on the object itself.
    pub fn new() -> Self {
        Self {
            verb: HttpVerb::Post,
            ..Self::default()
        }
    }

    /// A `POST` of the method (or relative path) `name`.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Sets the path argument, rendered as `name(arg)`.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.arg = Some(arg.into()).filter(|arg: &Value| !arg.is_null());
        self
    }

    /// Sets the data, sent in the body or rendered as a parameter alias.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into()).filter(|data: &Value| !data.is_null());
        self
    }

    /// Sends binary content as the body.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sends the data as the request body, leaving the method name untouched.
    #[must_use]
    pub fn in_body(mut self) -> Self {
        self.in_body = true;
        self
    }

    /// Stamps `metadata_type` into the body.
    #[must_use]
    pub fn with_metadata_type(mut self, metadata_type: impl Into<String>) -> Self {
        self.metadata_type = Some(metadata_type.into());
        self
    }

    /// Overrides the verb (`MERGE`, `DELETE`).
    #[must_use]
    pub fn with_verb(mut self, verb: HttpVerb) -> Self {
        self.verb = verb;
        self
    }

    /// Appends `.suffix` to the endpoint of this call.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}
