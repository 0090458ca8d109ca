use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn malformed(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Malformed {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_range(element: impl Into<String>, end: u64, limit: u64) -> Error {
        Error(
            ErrorKind::OutOfRange {
                element: element.into(),
                end,
                limit,
            }
            .into(),
        )
    }

    pub fn not_a_container(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotAContainer {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn not_seekable(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotSeekable {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn unsupported_version(version: u16) -> Error {
        Error(ErrorKind::UnsupportedVersion { version }.into())
    }

    pub fn corrupt_header(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptHeader {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn ungrouped_index(prefix: &[u8], position: u64) -> Error {
        Error(
            ErrorKind::UngroupedIndex {
                prefix: String::from_utf8_lossy(prefix).into_owned(),
                position,
            }
            .into(),
        )
    }

    pub fn compression<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Compression {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` when the error reports structurally broken on-disk data.
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Malformed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("malformed '{element}': {message}")]
    Malformed { element: String, message: String },

    #[error("'{element}' ends at byte {end}, beyond the available {limit} bytes")]
    OutOfRange { element: String, end: u64, limit: u64 },

    #[error("not a gzip container: {message}")]
    NotAContainer { message: String },

    #[error("gzip container has no random access table: {message}")]
    NotSeekable { message: String },

    #[error("unsupported dictzip header version {version}")]
    UnsupportedVersion { version: u16 },

    #[error("corrupt dictzip header: {message}")]
    CorruptHeader { message: String },

    #[error("index is not grouped by prefix: '{prefix}' reappears at byte {position}")]
    UngroupedIndex { prefix: String, position: u64 },

    #[error("compression error: {context}")]
    Compression {
        context: String,
        source: StdErrorBoxed,
    },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::out_of_range("content", 130, 100);
        assert_eq!(
            e.to_string(),
            "'content' ends at byte 130, beyond the available 100 bytes"
        );

        let e = Error::ungrouped_index(b"cat", 42);
        assert!(matches!(
            e.kind(),
            ErrorKind::UngroupedIndex { prefix, position: 42 } if prefix == "cat"
        ));
    }

    #[test]
    fn test_io_conversion() {
        let e: Error = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(e.into_kind(), ErrorKind::Io { .. }));
        assert!(Error::malformed("record", "short trailer").is_malformed());
    }
}
