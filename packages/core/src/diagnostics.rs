//! 序列对账诊断模块
//!
//! 将计算结果与参考序列逐点比较，输出结构化报告。

use crate::errors::ReconResult;
use crate::utils::{numeric, validation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个不一致位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// 位置下标
    pub index: usize,
    /// 计算值
    pub computed: f64,
    /// 参考值
    pub reference: f64,
    /// 绝对差，NaN 对数值记为正无穷
    pub abs_diff: f64,
}

/// 对账报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// 生成时间
    pub generated_at: DateTime<Utc>,
    /// 使用的容差
    pub tolerance: f64,
    /// 实际比较的位置数
    pub compared: usize,
    /// 长度不一致时为 (计算长度, 参考长度)
    pub length_mismatch: Option<(usize, usize)>,
    /// 有限差值中的最大值
    pub max_abs_diff: f64,
    /// 有限差值的平均值
    pub mean_abs_diff: f64,
    /// 超出容差的位置
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    /// 长度一致且没有超出容差的位置
    pub fn is_match(&self) -> bool {
        self.length_mismatch.is_none() && self.mismatches.is_empty()
    }
}

/// 逐点比较计算序列与参考序列
pub fn compare_sequences(computed: &[f64], reference: &[f64], tolerance: f64) -> ReconResult<ComparisonReport> {
    validation::validate_tolerance(tolerance)?;

    let compared = computed.len().min(reference.len());
    let length_mismatch = (computed.len() != reference.len()).then(|| (computed.len(), reference.len()));

    let mut mismatches = Vec::new();
    let mut max_abs_diff = 0.0_f64;
    let mut finite_sum = 0.0;
    let mut finite_count = 0usize;

    for (index, (&c, &r)) in computed.iter().zip(reference).enumerate() {
        let abs_diff = numeric::abs_diff(c, r);

        if abs_diff.is_finite() {
            max_abs_diff = max_abs_diff.max(abs_diff);
            finite_sum += abs_diff;
            finite_count += 1;
        }

        if !numeric::approx_eq(c, r, tolerance) {
            mismatches.push(Mismatch { index, computed: c, reference: r, abs_diff });
        }
    }

    let mean_abs_diff = if finite_count == 0 { 0.0 } else { finite_sum / finite_count as f64 };

    if let Some((c, r)) = length_mismatch {
        tracing::warn!(computed = c, reference = r, "sequence lengths differ");
    }
    tracing::debug!(compared, mismatches = mismatches.len(), max_abs_diff, "sequences compared");

    Ok(ComparisonReport {
        generated_at: Utc::now(),
        tolerance,
        compared,
        length_mismatch,
        max_abs_diff,
        mean_abs_diff,
        mismatches,
    })
}
