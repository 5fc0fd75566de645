//! Engine configuration.
//!
//! The month-alias table is data, not code: when another legacy spelling
//! surfaces in a member tree, it is appended to `engine_config.json` and the
//! resolver picks it up without a code change.

use serde::{Deserialize, Serialize};

/// One extra on-disk spelling for a canonical month label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthAlias {
    pub canonical: String,
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoopConfig {
    /// Legacy month spellings, probed between the canonical label and the
    /// full month name. Ships with the historical "Sept" entry.
    #[serde(default = "default_month_aliases")]
    pub month_aliases: Vec<MonthAlias>,

    /// Fixed amount credited back when a membership refund is processed.
    #[serde(default = "default_refund_amount")]
    pub refund_amount: f64,

    /// How far ahead the insurance expiry report looks, in calendar months.
    #[serde(default = "default_expiry_horizon_months")]
    pub expiry_horizon_months: u32,
}

fn default_month_aliases() -> Vec<MonthAlias> {
    // "Sept" is a historical typo that survives in old activity trees.
    // It belongs to Sep only; never generalize it to other months.
    vec![MonthAlias {
        canonical: "Sep".to_string(),
        alias: "Sept".to_string(),
    }]
}

fn default_refund_amount() -> f64 {
    10_000.0
}

fn default_expiry_horizon_months() -> u32 {
    2
}

impl Default for CoopConfig {
    fn default() -> Self {
        Self {
            month_aliases: default_month_aliases(),
            refund_amount: default_refund_amount(),
            expiry_horizon_months: default_expiry_horizon_months(),
        }
    }
}

impl CoopConfig {
    /// Load configuration from `<data_dir>/engine_config.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {path}: {e}"))?;
        let config: CoopConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {path}: {e}"))?;
        Ok(config)
    }

    /// Load from the data dir, falling back to built-in defaults when the
    /// file is absent. A present-but-broken file is still an error.
    pub fn load_or_default(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine_config.json");
        if std::path::Path::new(&path).exists() {
            Self::load(data_dir)
        } else {
            Ok(Self::default())
        }
    }
}
