//! Fatal server errors. A rejected request is not one of them: the rate
//! limiter answers those with a 429 and carries on.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    /// In-flight requests were still running when the grace period ran out.
    #[error("server forced to shut down: requests still running after {0:?}")]
    ShutdownTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, ServerError>;
