//! Argument Validation
//!
//! Numerical guards applied before any predictor state is touched.
//!
//! Functions:
//! - Finite checks for timestamps and rates
//! - Context vector validation
//! - Mode name validation

use crate::error::{RecallError, Result};

/// 检查数组是否包含无效值 (NaN 或 Inf)
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// 校验时间戳为有限值
pub fn ensure_finite_time(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RecallError::invalid(format!("{name} must be finite, got {value}")))
    }
}

/// 校验模式名非空
pub fn validate_mode(mode: &str) -> Result<()> {
    if mode.trim().is_empty() {
        return Err(RecallError::invalid("mode name must not be empty"));
    }
    Ok(())
}

/// 校验单个上下文向量
pub fn validate_context(name: &str, ctx: Option<&[f64]>) -> Result<()> {
    if let Some(v) = ctx {
        if has_invalid_values(v) {
            return Err(RecallError::invalid(format!(
                "{name} contains non-finite components"
            )));
        }
    }
    Ok(())
}

/// 校验事件上下文与当前上下文
///
/// 两者同时提供时长度必须一致；只提供其一是允许的（相似度按 1.0 处理）。
pub fn validate_context_pair(event_ctx: Option<&[f64]>, current_ctx: Option<&[f64]>) -> Result<()> {
    validate_context("event_context", event_ctx)?;
    validate_context("current_context", current_ctx)?;

    if let (Some(u), Some(v)) = (event_ctx, current_ctx) {
        if u.len() != v.len() {
            return Err(RecallError::invalid(format!(
                "context dimension mismatch: event {} vs current {}",
                u.len(),
                v.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== has_invalid_values 测试 ====================

    #[test]
    fn test_has_invalid_values_with_valid_array() {
        assert!(!has_invalid_values(&[1.0, 2.0, 3.0]));
        assert!(!has_invalid_values(&[0.0, -1.0, 1e10]));
        assert!(!has_invalid_values(&[])); // 空数组
    }

    #[test]
    fn test_has_invalid_values_with_nan() {
        assert!(has_invalid_values(&[1.0, f64::NAN, 3.0]));
        assert!(has_invalid_values(&[f64::NAN]));
    }

    #[test]
    fn test_has_invalid_values_with_infinity() {
        assert!(has_invalid_values(&[1.0, f64::INFINITY, 3.0]));
        assert!(has_invalid_values(&[f64::NEG_INFINITY, 2.0]));
    }

    // ==================== ensure_finite_time 测试 ====================

    #[test]
    fn test_ensure_finite_time() {
        assert_eq!(ensure_finite_time("now", 12.5).unwrap(), 12.5);
        assert_eq!(ensure_finite_time("now", -3.0).unwrap(), -3.0);
        assert!(ensure_finite_time("now", f64::NAN).is_err());
        assert!(ensure_finite_time("now", f64::INFINITY).is_err());
        assert!(ensure_finite_time("now", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_ensure_finite_time_message_names_argument() {
        let err = ensure_finite_time("event_time", f64::NAN).unwrap_err();
        assert!(err.to_string().contains("event_time"));
    }

    // ==================== validate_mode 测试 ====================

    #[test]
    fn test_validate_mode() {
        assert!(validate_mode("reading").is_ok());
        assert!(validate_mode("").is_err());
        assert!(validate_mode("   ").is_err());
    }

    // ==================== validate_context_pair 测试 ====================

    #[test]
    fn test_validate_context_pair_ok() {
        assert!(validate_context_pair(None, None).is_ok());
        assert!(validate_context_pair(Some(&[1.0, 2.0]), None).is_ok());
        assert!(validate_context_pair(None, Some(&[1.0])).is_ok());
        assert!(validate_context_pair(Some(&[1.0, 2.0]), Some(&[0.0, 1.0])).is_ok());
    }

    #[test]
    fn test_validate_context_pair_dimension_mismatch() {
        let err = validate_context_pair(Some(&[1.0, 2.0]), Some(&[1.0])).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn test_validate_context_pair_non_finite() {
        assert!(validate_context_pair(Some(&[f64::NAN]), None).is_err());
        assert!(validate_context_pair(None, Some(&[f64::INFINITY])).is_err());
    }
}
