use std::collections::HashMap;

use regex::Regex;

use crate::config::{ConfigError, DeviceConfig};
use crate::schedule::model::EntryStatus;

/// Numeric envelope of one device family.
#[derive(Debug, Clone, Copy)]
pub struct DeviceLimits {
    pub max_entries: usize,
    pub min_amount: u32,
    pub max_amount: u32,
    pub step_amount: u32,
}

/// Everything the parser and resolver need to know about one device family:
/// the record grammar, the raw status code map, and the numeric envelope.
/// The rest of the crate depends only on this value, never on which family
/// produced it.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pattern: Regex,
    status_map: HashMap<u32, EntryStatus>,
    pub limits: DeviceLimits,
}

const RECORD_GROUPS: [&str; 5] = ["id", "hour", "minute", "amount", "status"];

const XIAOMI_PATTERN: &str =
    "(?<id>[0-9]),(?<hour>[0-9]{1,3}),(?<minute>[0-9]{1,3}),(?<amount>[0-9]{1,3}),(?<status>[0-9]{1,3}),?";

impl DeviceProfile {
    pub fn from_config(config: &DeviceConfig) -> Result<Self, ConfigError> {
        match config {
            DeviceConfig::XiaomiSmartFeeder => Self::xiaomi_smart_feeder(),
            DeviceConfig::Custom {
                status_pattern,
                status_map,
                max_entries,
                min_amount,
                max_amount,
                step_amount,
            } => Self::from_parts(
                status_pattern,
                status_map,
                DeviceLimits {
                    max_entries: *max_entries,
                    min_amount: *min_amount,
                    max_amount: *max_amount,
                    step_amount: *step_amount,
                },
            ),
        }
    }

    pub fn xiaomi_smart_feeder() -> Result<Self, ConfigError> {
        Self::from_parts(
            XIAOMI_PATTERN,
            &[
                "0 -> dispensed".to_string(),
                "1 -> failed".to_string(),
                "254 -> dispensing".to_string(),
                "255 -> pending".to_string(),
            ],
            DeviceLimits {
                max_entries: 10,
                min_amount: 1,
                max_amount: 30,
                step_amount: 1,
            },
        )
    }

    pub fn from_parts(
        pattern: &str,
        status_map: &[String],
        limits: DeviceLimits,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern)?;
        for group in RECORD_GROUPS {
            let present = pattern
                .capture_names()
                .any(|name| name == Some(group));
            if !present {
                return Err(ConfigError::MissingCaptureGroup(group));
            }
        }

        if limits.min_amount > limits.max_amount {
            return Err(ConfigError::InvertedAmountLimits(
                limits.min_amount,
                limits.max_amount,
            ));
        }

        let mut map = HashMap::with_capacity(status_map.len());
        for item in status_map {
            let Some((code, token)) = item.split_once(" -> ") else {
                return Err(ConfigError::InvalidStatusMapEntry(item.clone()));
            };
            let code = code
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidStatusMapEntry(item.clone()))?;
            let Some(status) = EntryStatus::from_raw_token(token.trim()) else {
                return Err(ConfigError::InvalidStatusMapEntry(item.clone()));
            };
            map.insert(code, status);
        }

        Ok(Self {
            pattern,
            status_map: map,
            limits,
        })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Maps a raw device status code. `None` means the code is unknown to
    /// this device family; the parser drops such records.
    pub fn status_for(&self, code: u32) -> Option<EntryStatus> {
        self.status_map.get(&code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xiaomi_profile_maps_documented_codes() {
        let profile = DeviceProfile::xiaomi_smart_feeder().expect("built-in profile");
        assert_eq!(profile.status_for(0), Some(EntryStatus::Dispensed));
        assert_eq!(profile.status_for(1), Some(EntryStatus::Failed));
        assert_eq!(profile.status_for(254), Some(EntryStatus::Dispensing));
        assert_eq!(profile.status_for(255), Some(EntryStatus::Pending));
        assert_eq!(profile.status_for(7), None);
        assert_eq!(profile.limits.max_entries, 10);
        assert_eq!(profile.limits.min_amount, 1);
        assert_eq!(profile.limits.max_amount, 30);
    }

    #[test]
    fn custom_profile_rejects_pattern_without_groups() {
        let err = DeviceProfile::from_parts(
            "(?<id>[0-9]),(?<hour>[0-9]+)",
            &[],
            DeviceLimits {
                max_entries: 4,
                min_amount: 1,
                max_amount: 10,
                step_amount: 1,
            },
        )
        .expect_err("missing groups");
        assert!(matches!(err, ConfigError::MissingCaptureGroup("minute")));
    }

    #[test]
    fn custom_profile_rejects_derived_status_in_map() {
        let err = DeviceProfile::from_parts(
            XIAOMI_PATTERN,
            &["0 -> skipped".to_string()],
            DeviceLimits {
                max_entries: 4,
                min_amount: 1,
                max_amount: 10,
                step_amount: 1,
            },
        )
        .expect_err("derived status");
        assert!(matches!(err, ConfigError::InvalidStatusMapEntry(_)));
    }

    #[test]
    fn custom_profile_rejects_inverted_amount_limits() {
        let err = DeviceProfile::from_parts(
            XIAOMI_PATTERN,
            &["0 -> dispensed".to_string()],
            DeviceLimits {
                max_entries: 4,
                min_amount: 10,
                max_amount: 1,
                step_amount: 1,
            },
        )
        .expect_err("inverted limits");
        assert!(matches!(err, ConfigError::InvertedAmountLimits(10, 1)));
    }
}
