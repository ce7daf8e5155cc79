use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    /// The subscriber's outbound channel is gone (writer task exited).
    Disconnected,
    /// The subscriber's bounded outbound queue is full.
    QueueFull,
    /// A wire frame exceeded the configured maximum size.
    FrameTooLarge(usize),
    /// JSON encode/decode failure.
    Codec(serde_json::Error),
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Disconnected => write!(f, "Subscriber is disconnected"),
            RelayError::QueueFull => write!(f, "Subscriber queue is full"),
            RelayError::FrameTooLarge(len) => write!(f, "Frame of {len} bytes exceeds limit"),
            RelayError::Codec(e) => write!(f, "Codec error: {e}"),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Codec(e)
    }
}
