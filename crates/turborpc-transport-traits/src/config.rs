//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Default frame size limit in both directions (16MB).
const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for frame size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum inbound frame size in bytes.
    /// `None` = unlimited
    pub max_inbound_size: Option<usize>,

    /// Maximum outbound frame size in bytes.
    /// `None` = unlimited
    pub max_outbound_size: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self::with_max_size(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl LimitsConfig {
    /// Create a configuration with the same limit in both directions.
    #[must_use]
    pub const fn with_max_size(max: usize) -> Self {
        Self {
            max_inbound_size: Some(max),
            max_outbound_size: Some(max),
        }
    }

    /// Create a configuration with no limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_inbound_size: None,
            max_outbound_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_config_default() {
        let config = LimitsConfig::default();
        assert_eq!(config.max_inbound_size, Some(16 * 1024 * 1024));
        assert_eq!(config.max_outbound_size, Some(16 * 1024 * 1024));
    }
}
