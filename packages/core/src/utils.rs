//! 工具函数模块

/// 数值工具函数
pub mod numeric {
    use num_traits::Float;

    /// 保留指定位数的小数
    ///
    /// 精度超出浮点表示范围时 (倍数或乘积溢出) 原值返回。
    pub fn round_to<T: Float>(value: T, precision: usize) -> T {
        let exponent = match i32::try_from(precision) {
            Ok(e) => e,
            Err(_) => return value,
        };
        let multiplier = match T::from(10.0_f64.powi(exponent)) {
            Some(m) if m.is_finite() => m,
            _ => return value,
        };
        let scaled = value * multiplier;
        if !scaled.is_finite() {
            return value;
        }
        scaled.round() / multiplier
    }

    /// 浮点数近似相等，两侧均为 NaN 时视为相等
    pub fn approx_eq<T: Float>(a: T, b: T, tolerance: T) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        a == b || (a - b).abs() <= tolerance
    }

    /// 比较用绝对差，NaN 与数值之间的差记为正无穷
    pub fn abs_diff<T: Float>(a: T, b: T) -> T {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => T::zero(),
            (false, false) if a == b => T::zero(),
            (false, false) => (a - b).abs(),
            _ => T::infinity(),
        }
    }
}

/// 数据验证工具
pub mod validation {
    use crate::errors::{ReconError, ReconResult};
    use crate::models::WindowedMatrix;

    /// 检查矩阵中不存在 NaN / ±Inf，返回第一个非有限值的位置
    pub fn ensure_finite(matrix: &WindowedMatrix) -> ReconResult<()> {
        for (row, values) in matrix.iter_rows().enumerate() {
            if let Some(column) = values.iter().position(|v| !v.is_finite()) {
                return Err(ReconError::Numeric { row, column, value: values[column] });
            }
        }
        Ok(())
    }

    /// 验证比较容差
    pub fn validate_tolerance(tolerance: f64) -> ReconResult<()> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(ReconError::invalid_input(format!(
                "tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }
        Ok(())
    }
}
