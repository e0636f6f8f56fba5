use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VebError {
    UniverseTooSmall { universe: u64 },
    ValueOutOfRange { value: u64, universe: u64 },
    Snapshot(SnapshotError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    ReadFailed {
        context: String,
        source: Box<SnapshotErrorSource>,
    },
    WriteFailed {
        context: String,
        source: Box<SnapshotErrorSource>,
    },
    PermissionDenied {
        context: String,
    },
    NotFound {
        context: String,
    },
    DataCorruption {
        context: String,
        details: String,
    },
    LockAcquisitionFailed {
        context: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotErrorSource {
    Io(String),
    Serialization(String),
}

impl fmt::Display for VebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VebError::UniverseTooSmall { universe } => {
                write!(f, "Universe size {universe} is too small, must be at least 2")
            }
            VebError::ValueOutOfRange { value, universe } => {
                write!(f, "Value {value} is out of range for universe {universe}")
            }
            VebError::Snapshot(err) => write!(f, "Snapshot error: {err}"),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::ReadFailed { context, source } => {
                write!(f, "Read failed in {context}: {source}")
            }
            SnapshotError::WriteFailed { context, source } => {
                write!(f, "Write failed in {context}: {source}")
            }
            SnapshotError::PermissionDenied { context } => {
                write!(f, "Permission denied in {context}")
            }
            SnapshotError::NotFound { context } => write!(f, "Snapshot not found: {context}"),
            SnapshotError::DataCorruption { context, details } => {
                write!(f, "Data corruption in {context}: {details}")
            }
            SnapshotError::LockAcquisitionFailed { context } => {
                write!(f, "Failed to acquire lock on {context}")
            }
        }
    }
}

impl fmt::Display for SnapshotErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotErrorSource::Io(msg) => write!(f, "IO error: {msg}"),
            SnapshotErrorSource::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for VebError {}
impl std::error::Error for SnapshotError {}
impl std::error::Error for SnapshotErrorSource {}

impl VebError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VebError::UniverseTooSmall { .. } | VebError::ValueOutOfRange { .. }
        )
    }

    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            VebError::Snapshot(SnapshotError::DataCorruption { .. })
        )
    }
}

impl From<SnapshotError> for VebError {
    fn from(err: SnapshotError) -> Self {
        VebError::Snapshot(err)
    }
}

/// Which side of a file operation an I/O error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Read,
    Write,
}

impl SnapshotError {
    pub fn from_io_error(e: std::io::Error, direction: IoDirection, context: &str) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => SnapshotError::PermissionDenied {
                context: context.to_string(),
            },
            std::io::ErrorKind::NotFound => SnapshotError::NotFound {
                context: context.to_string(),
            },
            _ => {
                let source = Box::new(SnapshotErrorSource::Io(e.to_string()));
                match direction {
                    IoDirection::Read => SnapshotError::ReadFailed {
                        context: context.to_string(),
                        source,
                    },
                    IoDirection::Write => SnapshotError::WriteFailed {
                        context: context.to_string(),
                        source,
                    },
                }
            }
        }
    }

    pub fn from_serialization_error(e: impl std::fmt::Display, context: &str) -> Self {
        SnapshotError::DataCorruption {
            context: context.to_string(),
            details: e.to_string(),
        }
    }
}
