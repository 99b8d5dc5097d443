use failure::{Context, Fail};
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}
#[derive(Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "pool is stopped")]
    Stopped,

    #[fail(display = "pool is already started")]
    AlreadyStarted,

    #[fail(display = "pool must have at least one worker")]
    ZeroSized,

    #[fail(display = "worker {} panicked outside a task", _0)]
    WorkerPanicked(usize),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl From<ErrorKind> for Error {
    fn from(err: ErrorKind) -> Self {
        Error {
            inner: Context::new(err),
        }
    }
}
