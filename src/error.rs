use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used throughout the crate and its binaries.
pub type AreaClusterResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Debug, Clone, Copy)]
pub struct AreaClusterError {
    pub msg: &'static str,
}

impl Display for AreaClusterError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for AreaClusterError {}
