use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SHIP_ITS: usize = 2;
pub const DEFAULT_MASTER_BRANCH: &str = "origin/master";
pub const MAX_RESULTS_CHANNEL: u32 = 5;
pub const MAX_RESULTS_PRIVATE: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Review Board server URL
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Ship-its required by ship-check when -s is not given
    #[serde(default)]
    pub ship_its: Option<usize>,
    /// Reference branch as remote/branch
    #[serde(default)]
    pub master_branch: Option<String>,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat channel -> review group
    pub channel_groups: BTreeMap<String, String>,
    pub max_results_channel: u32,
    pub max_results_private: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let channel_groups = [("#tech-ops", "Ops"), ("#automation", "automation")]
            .into_iter()
            .map(|(channel, group)| (channel.to_string(), group.to_string()))
            .collect();
        Self {
            channel_groups,
            max_results_channel: MAX_RESULTS_CHANNEL,
            max_results_private: MAX_RESULTS_PRIVATE,
        }
    }
}
