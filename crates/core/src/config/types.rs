use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::supervisor::SupervisorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}
