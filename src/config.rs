use std::{path::Path, time::Duration};

use anyhow::Context;

use crate::{
    annotate::Label,
    codec::MismatchPolicy,
    error::{LabelError, LabelResult},
    pipeline::{BatchOptions, FailurePolicy},
};

/// On-disk pipeline settings (JSON). Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker thread count. `None` uses one thread per CPU.
    pub concurrency: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub format_mismatch: MismatchPolicy,
    /// Stop starting new records once this much time has passed.
    pub timeout_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> LabelResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| LabelError::validation(format!("invalid pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> LabelResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> LabelResult<()> {
        if self.concurrency == Some(0) {
            return Err(LabelError::validation("concurrency must be >= 1 when set"));
        }
        if self.timeout_ms == Some(0) {
            return Err(LabelError::validation("timeout_ms must be >= 1 when set"));
        }
        Ok(())
    }

    pub fn to_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.concurrency,
            failure_policy: self.failure_policy,
            mismatch_policy: self.format_mismatch,
            timeout: self.timeout_ms.map(Duration::from_millis),
            label: Label::watermark(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        let opts = cfg.to_options();
        assert_eq!(opts.failure_policy, FailurePolicy::ContinueOnError);
        assert_eq!(opts.mismatch_policy, MismatchPolicy::Reject);
        assert_eq!(opts.label.text, "This is watermark");
    }

    #[test]
    fn full_config_parses() {
        let cfg = PipelineConfig::from_json(
            r#"{"concurrency": 4, "failure_policy": "fail_fast",
                "format_mismatch": "follow_content", "timeout_ms": 1500}"#,
        )
        .unwrap();
        let opts = cfg.to_options();
        assert_eq!(opts.concurrency, Some(4));
        assert_eq!(opts.failure_policy, FailurePolicy::FailFast);
        assert_eq!(opts.mismatch_policy, MismatchPolicy::FollowContent);
        assert_eq!(opts.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn rejects_zero_concurrency_and_unknown_fields() {
        assert!(PipelineConfig::from_json(r#"{"concurrency": 0}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"label": "custom"}"#).is_err());
    }
}
