//! Vendor reply-value normalization
//!
//! Several camera lines deviate from the documented VISCA mode encodings in
//! their inquiry replies (BirdDog firmware is the known offender). Rather
//! than modelling a device hierarchy, recognized deviant values are
//! normalized to their canonical meaning through a small table keyed by
//! (field, raw value). Unrecognized values remain protocol violations.

use crate::error::{CameraError, Result};
use crate::protocol::command::{ExposureMode, WhiteBalanceMode};
use serde::{Deserialize, Serialize};

/// Raw white-balance reply value that aliases two distinct modes
///
/// On BirdDog firmware 0x06 reports Indoor; other firmware revisions use the
/// same value for a manually fixed color temperature. There is no in-band
/// way to tell them apart.
pub const AMBIGUOUS_WHITE_BALANCE_VALUE: u8 = 0x06;

/// Resolution policy for reply values that alias two modes
///
/// The default maps the ambiguous white-balance value to [`WhiteBalanceMode::Indoor`],
/// the fixed-preset reading, which never mistakes a manually configured
/// camera for a self-adjusting one. Firmware revisions may resolve the
/// aliasing differently, so the policy is configurable per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuirkPolicy {
    /// Mode to report for the ambiguous white-balance reply value
    pub ambiguous_white_balance: WhiteBalanceMode,
}

impl Default for QuirkPolicy {
    fn default() -> Self {
        Self {
            ambiguous_white_balance: WhiteBalanceMode::Indoor,
        }
    }
}

/// Normalize a raw exposure-mode reply value to the canonical mode
///
/// Recognized deviations: 0x0F (BirdDog) is reported for Bright, whose
/// canonical encoding is 0x0D.
pub fn normalize_exposure_mode(raw: u8) -> Result<ExposureMode> {
    match raw {
        0x00 => Ok(ExposureMode::Auto),
        0x03 => Ok(ExposureMode::Manual),
        0x0A => Ok(ExposureMode::ShutterPriority),
        0x0B => Ok(ExposureMode::IrisPriority),
        0x0D => Ok(ExposureMode::Bright),
        // BirdDog cameras report 0x0F for Bright
        0x0F => Ok(ExposureMode::Bright),
        other => Err(CameraError::protocol(format!(
            "unrecognized exposure mode value 0x{other:02X}"
        ))),
    }
}

/// Normalize a raw white-balance reply value to the canonical mode
///
/// Recognized deviations: 0x0A (BirdDog P400) is reported for Manual, and
/// 0x06 is ambiguous across firmware lines — resolved by `policy`.
pub fn normalize_white_balance_mode(raw: u8, policy: &QuirkPolicy) -> Result<WhiteBalanceMode> {
    match raw {
        0x00 => Ok(WhiteBalanceMode::Auto),
        0x01 => Ok(WhiteBalanceMode::Indoor),
        0x02 => Ok(WhiteBalanceMode::Outdoor),
        0x03 => Ok(WhiteBalanceMode::OnePush),
        0x05 => Ok(WhiteBalanceMode::Manual),
        // BirdDog P400 reports 0x0A for Manual
        0x0A => Ok(WhiteBalanceMode::Manual),
        AMBIGUOUS_WHITE_BALANCE_VALUE => Ok(policy.ambiguous_white_balance),
        other => Err(CameraError::protocol(format!(
            "unrecognized white balance mode value 0x{other:02X}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_exposure_values() {
        assert_eq!(normalize_exposure_mode(0x00).unwrap(), ExposureMode::Auto);
        assert_eq!(
            normalize_exposure_mode(0x0A).unwrap(),
            ExposureMode::ShutterPriority
        );
        assert_eq!(normalize_exposure_mode(0x0D).unwrap(), ExposureMode::Bright);
    }

    #[test]
    fn test_deviant_exposure_normalized() {
        assert_eq!(normalize_exposure_mode(0x0F).unwrap(), ExposureMode::Bright);
    }

    #[test]
    fn test_unknown_exposure_rejected() {
        assert!(normalize_exposure_mode(0x07).is_err());
    }

    #[test]
    fn test_deviant_white_balance_normalized() {
        let policy = QuirkPolicy::default();
        assert_eq!(
            normalize_white_balance_mode(0x0A, &policy).unwrap(),
            WhiteBalanceMode::Manual
        );
    }

    #[test]
    fn test_ambiguous_white_balance_defaults_to_indoor() {
        let policy = QuirkPolicy::default();
        assert_eq!(
            normalize_white_balance_mode(AMBIGUOUS_WHITE_BALANCE_VALUE, &policy).unwrap(),
            WhiteBalanceMode::Indoor
        );
    }

    #[test]
    fn test_ambiguous_white_balance_policy_override() {
        let policy = QuirkPolicy {
            ambiguous_white_balance: WhiteBalanceMode::Manual,
        };
        assert_eq!(
            normalize_white_balance_mode(AMBIGUOUS_WHITE_BALANCE_VALUE, &policy).unwrap(),
            WhiteBalanceMode::Manual
        );
    }

    #[test]
    fn test_unknown_white_balance_rejected() {
        let policy = QuirkPolicy::default();
        assert!(normalize_white_balance_mode(0x0E, &policy).is_err());
    }
}
