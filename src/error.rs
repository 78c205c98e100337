use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of the command failed. The underlying library error is kept as
/// the child of the raised [`Error`].
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("failed to load configuration")]
    Config,
    #[display("required external program is unavailable")]
    Tools,
    #[display("invalid media identifier")]
    Identifier,
    #[display("failed to populate cache")]
    Cache,
}
