// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::engine as en;
use en::catalog::ScenarioRecord;
use en::error::UnknownScenario;

/// Artifact files a model-backed diagnostic backend would load.
pub const MODEL_ARTIFACTS: [&str; 5] = [
    "stability_energy_model.pkl",
    "se_computer (1).pkl",
    "feature_extractor(3) (1).pkl",
    "feature_scaler(3) (1).pkl",
    "tension_classifier(3) (1).pkl",
];

/// Source of diagnostic outcomes for a named scenario.
///
/// [`ScenarioCatalog`](crate::engine::ScenarioCatalog) is the deterministic
/// implementation used by default.
pub trait InferenceBackend {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn infer(&self, scenario: &str) -> Result<ScenarioRecord, UnknownScenario>;
}

/// Which model artifacts exist on disk.
///
/// Only availability is tracked; artifacts are never deserialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInventory {
    dir: PathBuf,
    present: Vec<String>,
    missing: Vec<String>,
}

impl ModelInventory {
    /// Checks `dir` for every entry of [`MODEL_ARTIFACTS`], logging each result.
    ///
    /// A directory or artifact that is absent or cannot be inspected counts
    /// as missing, so the scan never fails.
    pub async fn scan<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let mut inventory = ModelInventory {
            dir: dir.to_path_buf(),
            ..Default::default()
        };

        match fs::try_exists(dir).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("models folder not found: {}", dir.display());
                inventory.missing = MODEL_ARTIFACTS.iter().map(|s| s.to_string()).collect();
                return inventory;
            }
            Err(e) => {
                warn!("cannot read models folder {}: {}", dir.display(), e);
                inventory.missing = MODEL_ARTIFACTS.iter().map(|s| s.to_string()).collect();
                return inventory;
            }
        }

        for artifact in MODEL_ARTIFACTS {
            match fs::try_exists(dir.join(artifact)).await {
                Ok(true) => {
                    info!("found model artifact: {}", artifact);
                    inventory.present.push(artifact.to_owned());
                }
                Ok(false) => {
                    warn!("model artifact not found: {}", artifact);
                    inventory.missing.push(artifact.to_owned());
                }
                Err(e) => {
                    warn!("cannot inspect model artifact {}: {}", artifact, e);
                    inventory.missing.push(artifact.to_owned());
                }
            }
        }

        inventory
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn present(&self) -> &[String] {
        &self.present
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// True when every expected artifact was found.
    pub fn is_available(&self) -> bool {
        !self.present.is_empty() && self.missing.is_empty()
    }
}
