use serde::{Deserialize, Serialize};

use crate::mixer::MixConfig;
use crate::visualizer::VizConfig;

/// Everything tunable about a session. Shells may load this from a JSON file;
/// the defaults match the most complete behavior set observed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub mix: MixConfig,
    pub viz: VizConfig,
}
