//! Distribution run configuration.

use serde::{Deserialize, Serialize};

/// Settings for a distribution pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributeConfig {
    /// Folder scanned for `*.json` job result files by the `run` command.
    #[serde(default = "default_result_folder")]
    pub result_folder: String,
}

impl Default for DistributeConfig {
    fn default() -> Self {
        Self {
            result_folder: default_result_folder(),
        }
    }
}

fn default_result_folder() -> String {
    "./results".to_string()
}
