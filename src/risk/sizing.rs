//! 仓位尺寸与敞口限额
//!
//! 波动率目标缩放：scale = clamp(vol_target / vol, floor, cap)。
//! 敞口限额按配置单位解析为名义金额后再比较。

use crate::domain::entities::RiskProfile;
use crate::domain::enums::ExposureMode;

/// 波动率缩放系数
pub fn vol_scale(profile: &RiskProfile, volatility: f64) -> f64 {
    if volatility <= 0.0 {
        return profile.vol_scale_cap;
    }
    (profile.vol_target / volatility).clamp(profile.vol_scale_floor, profile.vol_scale_cap)
}

/// 入场资金比例 = 基础比例 × 波动率缩放
pub fn entry_fraction(profile: &RiskProfile, volatility: f64) -> f64 {
    profile.base_entry_fraction * vol_scale(profile, volatility)
}

/// 把配置限额解析为名义金额
pub fn resolve_exposure_limit(mode: ExposureMode, limit: f64, total_value: f64) -> f64 {
    match mode {
        ExposureMode::PercentOfPv => limit / 100.0 * total_value,
        ExposureMode::AbsoluteAmount => limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_profile;
    use approx::assert_relative_eq;

    #[test]
    fn test_vol_scale_clamped() {
        let profile = test_profile(); // vol_target 0.02, floor 0.5, cap 1.5
        assert_relative_eq!(vol_scale(&profile, 0.02), 1.0);
        assert_relative_eq!(vol_scale(&profile, 0.08), 0.5);
        assert_relative_eq!(vol_scale(&profile, 0.005), 1.5);
        // 波动率缺失视为下限波动，取上限缩放
        assert_relative_eq!(vol_scale(&profile, 0.0), 1.5);
    }

    #[test]
    fn test_entry_fraction_scales_base() {
        let profile = test_profile(); // base 0.10
        assert_relative_eq!(entry_fraction(&profile, 0.02), 0.10);
        assert_relative_eq!(entry_fraction(&profile, 0.04), 0.05);
    }

    #[test]
    fn test_exposure_limit_units() {
        assert_relative_eq!(
            resolve_exposure_limit(ExposureMode::PercentOfPv, 60.0, 10_000.0),
            6_000.0
        );
        assert_relative_eq!(
            resolve_exposure_limit(ExposureMode::AbsoluteAmount, 60.0, 10_000.0),
            60.0
        );
    }
}
