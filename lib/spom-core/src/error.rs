/// Errors that can occur when talking to the REST API through the object model.
///
/// Network failures and unexpected status codes are surfaced unchanged; nothing in this
/// crate retries. A resource that simply does not exist is *not* an error: it maps to an
/// object whose [`exists`](crate::MappedObject::exists) flag is `false`.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum RestError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail or connection issues arise.
    ReqwestError(reqwest::Error),

    /// URL parsing error when resolving host or request URLs.
    UrlError(url::ParseError),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    ///
    /// Occurs when a header value (for example the request digest) contains invalid characters.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization/deserialization error.
    ///
    /// Occurs when a request body cannot be serialized or a response is not valid JSON.
    JsonError(serde_json::Error),

    /// The server answered with a status code outside of `2xx`.
    #[display("Unexpected status code {status_code}: {body}")]
    #[from(skip)]
    UnexpectedStatusCode {
        /// The unexpected HTTP status code received.
        status_code: u16,
        /// The response body for debugging (truncated).
        body: String,
    },

    /// The transport could not produce a response.
    #[display("Transport failure: {message}")]
    #[from(skip)]
    TransportFailure {
        /// Description of the failure.
        message: String,
    },

    /// The blocking facade could not create its runtime.
    ///
    /// This is a construction-time failure and is not recoverable.
    #[display("Unsupported environment: {message}")]
    #[from(skip)]
    UnsupportedEnvironment {
        /// Description of the missing capability.
        message: String,
    },

    /// No operation with this name was installed on the object.
    #[display("No operation '{name}' on resource '{key}'")]
    #[from(skip)]
    UnknownOperation {
        /// The requested operation name.
        name: String,
        /// The registry key the object was synthesised from.
        key: String,
    },

    /// The operation was called with arguments it cannot use.
    #[display("Invalid arguments for '{operation}': {message}")]
    #[from(skip)]
    InvalidArguments {
        /// The operation name.
        operation: String,
        /// What was wrong with the arguments.
        message: String,
    },

    /// The operation does not navigate lazily and must be invoked instead.
    #[display("Operation '{name}' is not a lazy navigation")]
    #[from(skip)]
    NotNavigable {
        /// The operation name.
        name: String,
    },

    /// An operation needed a property the object does not carry.
    #[display("Missing property '{name}' on '{endpoint}'")]
    #[from(skip)]
    MissingProperty {
        /// The property name.
        name: String,
        /// The endpoint of the object.
        endpoint: String,
    },

    /// The reply of an operation was not of the expected shape.
    #[display("Unexpected reply: expected {expected}")]
    #[from(skip)]
    UnexpectedReply {
        /// The expected reply kind.
        expected: &'static str,
    },
}
