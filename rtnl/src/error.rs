use std::io;

/// The closed set of failures this crate can surface. Each layer returns the
/// most specific variant it can identify; callers above never need to
/// downcast to recover detail the library already had.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to resolve interface {name:?} to an index")]
    ResolveFailed { name: String },

    #[error("encoder overflow: {attempted} bytes would exceed {capacity}-byte capacity")]
    Overflow { capacity: usize, attempted: usize },

    #[error("failed to open netlink socket")]
    SocketOpenFailed(#[source] io::Error),

    #[error("failed to set socket option")]
    OptionSetFailed(#[source] io::Error),

    #[error("failed to bind netlink socket")]
    BindFailed(#[source] io::Error),

    #[error("failed to send netlink message")]
    SendFailed(#[source] io::Error),

    #[error("failed to receive netlink message")]
    RecvFailed(#[source] io::Error),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("unexpected reply message type {0}")]
    UnexpectedReply(u16),

    #[error("kernel refused request: {}", io::Error::from_raw_os_error(*errno))]
    KernelRefused { errno: i32 },

    #[error("allocation failed")]
    AllocationFailed,
}

impl Error {
    /// The positive errno the kernel reported, regardless of how the wire
    /// value was signed. Only meaningful for `KernelRefused`.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Error::KernelRefused { errno } => Some(*errno),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
