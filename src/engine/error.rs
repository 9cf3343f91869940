// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::path::PathBuf;

/// A scenario name that is not registered in the catalog.
///
/// Carries the name exactly as it was requested and up to five known
/// identifiers, in catalog order, as a hint for the client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown scenario '{requested}'")]
pub struct UnknownScenario {
    pub requested: String,
    pub available: Vec<String>,
}

impl UnknownScenario {
    /// The requested name after trimming and lowercasing, as used for lookup.
    pub fn normalized(&self) -> String {
        self.requested.trim().to_lowercase()
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("malformed command payload: {0}")]
    MalformedCommand(String),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("transport failure: {0}")]
    IoError(#[from] io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
