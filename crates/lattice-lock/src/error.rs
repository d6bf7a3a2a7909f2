// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out acquiring lock '{key}' after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    #[error("io error acquiring lock '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

pub type LockResult<T> = Result<T, LockError>;
