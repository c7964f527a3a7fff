//! Error taxonomy.
//!
//! Every failure a tree operation reports carries an [`ErrorKind`] with a
//! stable numeric code. Codes below 1024 are the protocol's standard errors,
//! the rest are extensions.

use std::fmt;

use thiserror::Error;

macro_rules! error_kinds {
    ($($variant:ident = $code:literal => $text:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorKind {
            $($variant,)*
        }

        impl ErrorKind {
            pub const ALL: &'static [ErrorKind] = &[$(ErrorKind::$variant,)*];

            pub fn code(self) -> u32 {
                match self {
                    $(ErrorKind::$variant => $code,)*
                }
            }

            pub fn from_code(code: u32) -> Option<ErrorKind> {
                match code {
                    $($code => Some(ErrorKind::$variant),)*
                    _ => None,
                }
            }

            /// Human readable description of the kind.
            pub fn text(self) -> &'static str {
                match self {
                    $(ErrorKind::$variant => $text,)*
                }
            }
        }
    };
}

error_kinds! {
    Other = 0 => "Unspecified error",
    NotAuthenticated = 1 => "Not authenticated",
    NotAuthorized = 2 => "Not authorized",
    ParamSyntax = 3 => "Bad parameter syntax",
    ParamNotSupported = 4 => "Parameter not supported",
    ParamValueFormat = 5 => "Bad parameter value format",
    ParamOutOfRange = 6 => "Parameter out of range",
    LocaleNotSupported = 7 => "Locale not supported",
    PathSyntax = 8 => "Bad path syntax",
    DataNotFound = 9 => "Data not found",
    MetadataNotFound = 10 => "Metadata not found",
    IllegalMetadata = 11 => "Illegal metadata",
    ValueFormat = 12 => "Bad value format",
    ValueOutOfRange = 13 => "Value out of range",
    IndexOutOfRange = 14 => "Index out of range",
    NotWritable = 15 => "Not writable",
    WriteFailed = 16 => "Write failed",
    ListOfPathsIsEmpty = 17 => "List of paths is empty",
    CountIsZero = 18 => "Requested count is zero",
    IntervalIsZero = 19 => "Requested interval is zero",
    NoHistory = 20 => "No history",
    NoDataAvailable = 21 => "No data available",
    NotAnArray = 23 => "Not an array",
    CommunicationFailed = 24 => "Communication with the remote device failed",
    TlsConfig = 26 => "TLS certificates and keys are bad, missing, or not consistent",
    NotRepresentable = 27 => "Data not representable in requested format",
    BadMethod = 28 => "Method not allowed for this data",
    TooLarge = 29 => "Data is too big to return",
    TooDeep = 30 => "Data is too deep to return",
    CannotCreate = 31 => "Creation of data or metadata not possible",
    CannotDelete = 32 => "Deletion of data or metadata not possible",
    AuthExpired = 33 => "Authorization expired",
    AuthInvalid = 34 => "Authorization invalid",
    MissingParameter = 35 => "Missing parameter",
    UnsupportedMediaType = 36 => "Unsupported media type",
    UnsupportedDatatype = 37 => "Unsupported data type",
    InvalidDatatype = 38 => "Invalid data type",
    InconsistentValues = 39 => "Inconsistent values",
    ExpiredLink = 40 => "Expired link",
    NotReadable = 41 => "Not readable",
    DuplicatesNotAllowed = 42 => "Duplicates not allowed",
    Uninitialized = 43 => "Uninitialized",
    ExpiredContext = 44 => "Expired context",
    NotAtomic = 45 => "Not atomic",
    CannotFollow = 46 => "Cannot follow",
    InternalTimeout = 1024 => "Internal timeout",
    InternalError = 1025 => "Internal error",
    FunctionName = 1026 => "Invalid function name",
    FunctionTarget = 1027 => "Invalid target for function",
    ArgSyntax = 1028 => "Bad function argument syntax",
    ArgNotSupported = 1029 => "Function argument not supported",
    ArgValueFormat = 1030 => "Bad function argument format",
    ArgOutOfRange = 1031 => "Function argument out of range",
    TargetDatatype = 1032 => "Inappropriate target datatype",
    CannotHaveChildren = 1033 => "Cannot have children",
    BadLinkTarget = 1034 => "Bad or unsupported link target",
    OauthInvalidRequest = 1035 => "OAuth request is malformed",
    OauthInvalidToken = 1036 => "OAuth token is expired, malformed, or invalid",
    OauthInsufficientScope = 1037 => "OAuth token does not have sufficient scope for the data",
    CallbackFailed = 1038 => "Callback failed",
    ClientActionFailed = 1039 => "Client action failed",
    CannotHaveValue = 1040 => "Cannot have value",
    TestFailure = 1041 => "Test failure",
}

impl ErrorKind {
    /// Codes from 1024 up are not part of the standard set.
    pub fn is_extension(self) -> bool {
        self.code() >= 1024
    }

    /// The coarse response class this kind is reported with.
    pub fn status(self) -> StatusClass {
        use ErrorKind::*;
        match self {
            ParamSyntax | ParamValueFormat | PathSyntax | ValueFormat | FunctionName
            | ArgSyntax | ArgValueFormat | OauthInvalidRequest => StatusClass::BadRequest,
            NotAuthenticated | NotAuthorized | OauthInvalidToken => StatusClass::Unauthenticated,
            DataNotFound | MetadataNotFound | IllegalMetadata => StatusClass::NotFound,
            BadMethod => StatusClass::MethodNotAllowed,
            Other | InternalTimeout | InternalError | CallbackFailed | ClientActionFailed => {
                StatusClass::Internal
            }
            _ => StatusClass::Forbidden,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    BadRequest,
    Unauthenticated,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Internal,
}

impl StatusClass {
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::Unauthenticated => 401,
            StatusClass::Forbidden => 403,
            StatusClass::NotFound => 404,
            StatusClass::MethodNotAllowed => 405,
            StatusClass::Internal => 500,
        }
    }
}

/// A typed, recoverable failure from a tree operation.
///
/// `target` is the path of the node the operation ran on and `given` the
/// name of the item that was being applied to it, when known. `context`
/// collects notes added as the error travels outward.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct XdError {
    pub kind: ErrorKind,
    pub message: String,
    pub target: Option<String>,
    pub given: Option<String>,
    pub context: Vec<String>,
}

impl XdError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        XdError {
            kind,
            message: message.into(),
            target: None,
            given: None,
            context: Vec::new(),
        }
    }

    /// An invariant violation. Logged here, reported to callers as a plain
    /// internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "internal invariant violated");
        XdError::new(ErrorKind::InternalError, message)
    }

    /// Sets the target path unless an inner frame already did.
    pub fn with_target(mut self, path: impl Into<String>) -> Self {
        if self.target.is_none() {
            self.target = Some(path.into());
        }
        self
    }

    /// Sets the given name unless an inner frame already did.
    pub fn with_given(mut self, name: impl Into<String>) -> Self {
        if self.given.is_none() {
            self.given = Some(name.into());
        }
        self
    }

    pub fn annotate(mut self, note: impl Into<String>) -> Self {
        self.context.push(note.into());
        self
    }

    pub fn status(&self) -> StatusClass {
        self.kind.status()
    }
}
