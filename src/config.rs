use serde::{Deserialize, Serialize};

use crate::Result;

/// Default ceiling on forced applications within one closure.
pub const DEFAULT_STEP_CEILING: usize = 10_000;

/// Tunables shared by the decoder, resolver and closure engine.
///
/// # Examples
///
/// ```
/// use sas_sim::SimConfig;
///
/// let config = SimConfig::default().with_step_ceiling(50);
/// assert_eq!(config.step_ceiling, 50);
/// assert!(config.is_forced_head("__forced__fall"));
/// assert!(config.is_forced_head("FA_roll"));
/// assert!(!config.is_forced_head("move"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Maximum forced applications before a closure is declared runaway
    pub step_ceiling: usize,
    /// Head prefixes marking environment-driven operators, matched case-insensitively
    pub forced_prefixes: Vec<String>,
    /// Head prefix of player operators that directional intents resolve to
    pub move_prefix: String,
    /// Head of the forced operator that ends one environment tick
    pub tick_marker: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_ceiling: DEFAULT_STEP_CEILING,
            forced_prefixes: vec![
                "__forced__".to_string(),
                "fa_".to_string(),
                "fa-".to_string(),
                "forced-".to_string(),
            ],
            move_prefix: "move".to_string(),
            tick_marker: Some("__forced__end-tick".to_string()),
        }
    }
}

impl SimConfig {
    /// Loads a configuration from JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_step_ceiling(mut self, ceiling: usize) -> Self {
        self.step_ceiling = ceiling;
        self
    }

    pub fn with_forced_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forced_prefixes = prefixes
            .into_iter()
            .map(|p| p.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_tick_marker(mut self, marker: Option<&str>) -> Self {
        self.tick_marker = marker.map(str::to_string);
        self
    }

    /// Whether an operator head names an environment-driven action.
    pub fn is_forced_head(&self, head: &str) -> bool {
        let head = head.to_ascii_lowercase();
        self.forced_prefixes
            .iter()
            .any(|prefix| head.starts_with(&prefix.to_ascii_lowercase()))
    }

    pub(crate) fn is_move_head(&self, head: &str) -> bool {
        head.to_ascii_lowercase()
            .starts_with(&self.move_prefix.to_ascii_lowercase())
    }
}
