//! 重叠窗口序列重建模块
//!
//! 将步长为 1 的重叠窗口矩阵还原为连续序列：每个输出位置取所有覆盖该位置的窗口值的算术平均。

use crate::errors::ReconResult;
use crate::models::{NonFinitePolicy, ReconstructedSequence, ReconstructorConfig, WindowedMatrix};
use crate::utils::{numeric, validation};
use rayon::prelude::*;

/// 输出位置 `j` 的覆盖数，即满足 `i <= j < i + w` 的行 `i` 的个数
///
/// 上升沿 `j + 1`，平台区 `w`，下降沿 `n + w - 1 - j`；`n < w` 时中间位置被全部 `n` 行覆盖。
/// 越界位置返回 0。
pub fn coverage_count(j: usize, n: usize, w: usize) -> usize {
    if n == 0 || w == 0 || j >= n + w - 1 {
        return 0;
    }
    j.min(n - 1) - j.saturating_sub(w - 1) + 1
}

/// 全部输出位置的覆盖数
///
/// 用差分数组的前缀和计算：第 `i` 行在 `i` 处 +1，在 `i + w` 处 -1，复杂度 O(n + w)。
pub fn coverage_counts(n: usize, w: usize) -> Vec<usize> {
    if n == 0 || w == 0 {
        return Vec::new();
    }

    let len = n + w - 1;
    let mut counts = Vec::with_capacity(len);
    let mut running = 0usize;

    for j in 0..len {
        if j < n {
            running += 1;
        }
        if j >= w && j - w < n {
            running -= 1;
        }
        counts.push(running);
    }

    counts
}

/// 窗口序列重建器
#[derive(Debug, Clone, Default)]
pub struct WindowReconstructor {
    config: ReconstructorConfig,
}

impl WindowReconstructor {
    /// 创建默认配置的重建器（拒绝非有限值，不舍入）
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定配置创建重建器
    pub fn with_config(config: ReconstructorConfig) -> Self {
        Self { config }
    }

    /// 当前配置
    pub fn config(&self) -> &ReconstructorConfig {
        &self.config
    }

    /// 重建序列，输出长度恒为 `N + W - 1`
    pub fn reconstruct(&self, matrix: &WindowedMatrix) -> ReconResult<ReconstructedSequence> {
        let (n, w) = (matrix.rows(), matrix.width());
        tracing::debug!(
            rows = n,
            width = w,
            plateau = (n + 1).saturating_sub(w),
            policy = ?self.config.non_finite,
            "reconstructing windowed series"
        );

        let mut values = match self.config.non_finite {
            NonFinitePolicy::Reject => {
                validation::ensure_finite(matrix)?;
                mean_over_coverage(matrix)
            }
            NonFinitePolicy::Propagate => mean_over_coverage(matrix),
            NonFinitePolicy::Skip => mean_over_finite(matrix),
        };

        if let Some(precision) = self.config.precision {
            for v in values.iter_mut() {
                *v = numeric::round_to(*v, precision);
            }
        }

        Ok(ReconstructedSequence::from_values(values))
    }

    /// 从原始行数据校验并重建
    pub fn reconstruct_rows(&self, rows: Vec<Vec<f64>>) -> ReconResult<ReconstructedSequence> {
        let matrix = WindowedMatrix::new(rows)?;
        self.reconstruct(&matrix)
    }

    /// 并行重建多个互不相关的矩阵，结果顺序与输入一致
    pub fn reconstruct_many(&self, matrices: &[WindowedMatrix]) -> Vec<ReconResult<ReconstructedSequence>> {
        tracing::debug!(batch = matrices.len(), "reconstructing batch");
        matrices.par_iter().map(|m| self.reconstruct(m)).collect()
    }
}

/// 使用默认配置重建
pub fn reconstruct(matrix: &WindowedMatrix) -> ReconResult<ReconstructedSequence> {
    WindowReconstructor::new().reconstruct(matrix)
}

/// 按行散射累加后除以覆盖数
fn mean_over_coverage(matrix: &WindowedMatrix) -> Vec<f64> {
    let w = matrix.width();
    let mut acc = vec![0.0; matrix.output_len()];

    for (i, row) in matrix.iter_rows().enumerate() {
        for (slot, v) in acc[i..i + w].iter_mut().zip(row) {
            *slot += v;
        }
    }

    acc.into_iter()
        .zip(coverage_counts(matrix.rows(), w))
        .map(|(sum, count)| sum / count as f64)
        .collect()
}

/// 只累加有限值，没有任何有限值覆盖的位置输出 NaN
fn mean_over_finite(matrix: &WindowedMatrix) -> Vec<f64> {
    let w = matrix.width();
    let len = matrix.output_len();
    let mut acc = vec![0.0; len];
    let mut counts = vec![0usize; len];

    for (i, row) in matrix.iter_rows().enumerate() {
        for (k, v) in row.iter().enumerate() {
            if v.is_finite() {
                acc[i + k] += v;
                counts[i + k] += 1;
            }
        }
    }

    acc.into_iter()
        .zip(counts)
        .map(|(sum, count)| if count == 0 { f64::NAN } else { sum / count as f64 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReconError;
    use approx::assert_relative_eq;

    fn matrix(rows: Vec<Vec<f64>>) -> WindowedMatrix {
        WindowedMatrix::new(rows).unwrap()
    }

    /// 三段式覆盖数，仅适用于 n >= w
    fn three_region_count(j: usize, n: usize, w: usize) -> usize {
        if j + 2 <= w {
            j + 1
        } else if j < n {
            w
        } else {
            n + w - 1 - j
        }
    }

    #[test]
    fn test_overlapping_pairs() {
        let m = matrix(vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]]);
        let out = reconstruct(&m).unwrap();

        assert_eq!(coverage_counts(3, 2), vec![1, 2, 2, 1]);
        assert_eq!(out.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_single_cell() {
        let out = reconstruct(&matrix(vec![vec![5.0]])).unwrap();
        assert_eq!(out.as_slice(), &[5.0]);
    }

    #[test]
    fn test_single_row_is_identity() {
        let out = reconstruct(&matrix(vec![vec![4.0, -1.0, 7.5]])).unwrap();
        assert_eq!(out.as_slice(), &[4.0, -1.0, 7.5]);
    }

    #[test]
    fn test_width_one_is_identity() {
        let out = reconstruct(&matrix(vec![vec![1.0], vec![2.0], vec![3.0]])).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_fewer_rows_than_width() {
        assert_eq!(coverage_counts(2, 5), vec![1, 2, 2, 2, 2, 1]);

        // 一致的窗口还原出原始序列
        let consistent = matrix(vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![2.0, 3.0, 4.0, 5.0, 6.0]]);
        let out = reconstruct(&consistent).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        // 不一致的窗口：中间位置取两行平均
        let disagreeing = matrix(vec![vec![1.0; 5], vec![3.0; 5]]);
        let out = reconstruct(&disagreeing).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 2.0, 2.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_coverage_counts_match_closed_form() {
        for n in 1..12 {
            for w in 1..12 {
                let counts = coverage_counts(n, w);
                assert_eq!(counts.len(), n + w - 1);
                for (j, &c) in counts.iter().enumerate() {
                    assert_eq!(c, coverage_count(j, n, w), "n={}, w={}, j={}", n, w, j);
                    if n >= w {
                        assert_eq!(c, three_region_count(j, n, w), "n={}, w={}, j={}", n, w, j);
                    }
                }
            }
        }

        assert_eq!(coverage_counts(5, 3), vec![1, 2, 3, 3, 3, 2, 1]);
        assert_eq!(coverage_count(7, 5, 3), 0);
        assert!(coverage_counts(0, 3).is_empty());
    }

    #[test]
    fn test_reject_non_finite() {
        let m = matrix(vec![vec![1.0, 2.0], vec![f64::NAN, 3.0]]);
        let err = reconstruct(&m).unwrap_err();

        assert!(matches!(err, ReconError::Numeric { row: 1, column: 0, .. }));
    }

    #[test]
    fn test_propagate_non_finite() {
        let config = ReconstructorConfig { non_finite: NonFinitePolicy::Propagate, precision: None };
        let m = matrix(vec![vec![1.0, 2.0], vec![f64::NAN, 3.0]]);
        let out = WindowReconstructor::with_config(config).reconstruct(&m).unwrap();

        assert_eq!(out.as_slice()[0], 1.0);
        assert!(out.as_slice()[1].is_nan());
        assert_eq!(out.as_slice()[2], 3.0);
    }

    #[test]
    fn test_skip_non_finite() {
        let config = ReconstructorConfig { non_finite: NonFinitePolicy::Skip, precision: None };
        let reconstructor = WindowReconstructor::with_config(config);

        let out = reconstructor.reconstruct(&matrix(vec![vec![1.0, 2.0], vec![f64::NAN, 4.0]])).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 2.0, 4.0]);

        let out = reconstructor
            .reconstruct(&matrix(vec![vec![1.0, f64::INFINITY], vec![f64::NAN, 4.0]]))
            .unwrap();
        assert_eq!(out.as_slice()[0], 1.0);
        assert!(out.as_slice()[1].is_nan());
        assert_eq!(out.as_slice()[2], 4.0);
    }

    #[test]
    fn test_precision_rounding() {
        let config = ReconstructorConfig { non_finite: NonFinitePolicy::Reject, precision: Some(4) };
        let m = matrix(vec![vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]]);
        let out = WindowReconstructor::with_config(config).reconstruct(&m).unwrap();

        assert_eq!(out.as_slice()[2], 0.3333);
    }

    #[test]
    fn test_oversized_precision_keeps_values_finite() {
        let m = matrix(vec![vec![0.0, 1.5], vec![1.5, 2.0]]);
        let config = ReconstructorConfig { non_finite: NonFinitePolicy::Reject, precision: Some(400) };
        let out = WindowReconstructor::with_config(config).reconstruct(&m).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 1.5, 2.0]);

        let m = matrix(vec![vec![1e10, 1e10]]);
        let config = ReconstructorConfig { non_finite: NonFinitePolicy::Reject, precision: Some(300) };
        let out = WindowReconstructor::with_config(config).reconstruct(&m).unwrap();
        assert_eq!(out.as_slice(), &[1e10, 1e10]);
    }

    #[test]
    fn test_reconstruct_rows_validates() {
        let reconstructor = WindowReconstructor::new();

        assert!(matches!(reconstructor.reconstruct_rows(vec![]), Err(ReconError::EmptyInput(_))));
        assert!(matches!(
            reconstructor.reconstruct_rows(vec![vec![1.0], vec![1.0, 2.0]]),
            Err(ReconError::Shape(_))
        ));
        assert_eq!(reconstructor.reconstruct_rows(vec![vec![2.0, 4.0]]).unwrap().len(), 2);
    }

    #[test]
    fn test_reconstruct_many_preserves_order() {
        let matrices = vec![
            matrix(vec![vec![5.0]]),
            matrix(vec![vec![1.0, f64::NAN]]),
            matrix(vec![vec![1.0, 2.0], vec![2.0, 3.0]]),
        ];
        let results = WindowReconstructor::new().reconstruct_many(&matrices);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().as_slice(), &[5.0]);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_matches_direct_average() {
        let rows: Vec<Vec<f64>> = (0..17)
            .map(|i| (0..6).map(|k| ((i * 7 + k * 3) % 11) as f64 - 5.0).collect())
            .collect();
        let out = reconstruct(&matrix(rows.clone())).unwrap();

        for j in 0..out.len() {
            let covering: Vec<f64> = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| *i <= j && j < i + 6)
                .map(|(i, row)| row[j - i])
                .collect();
            let expected = covering.iter().sum::<f64>() / covering.len() as f64;
            assert_relative_eq!(out.as_slice()[j], expected, epsilon = 1e-12);
        }
    }
}
