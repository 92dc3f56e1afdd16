//! 窗口矩阵与重建序列数据模型

use crate::errors::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};

/// 重叠窗口矩阵
///
/// 第 `i` 行是原始序列从偏移 `i` 开始的 `width` 个连续样本。
/// 只能通过校验构造，因此任意实例都满足：行数 >= 1，宽度 >= 1，所有行等宽。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct WindowedMatrix {
    /// 按行展开的数据
    values: Vec<f64>,
    /// 窗口宽度 W
    width: usize,
}

impl WindowedMatrix {
    /// 从行集合创建窗口矩阵
    pub fn new(rows: Vec<Vec<f64>>) -> ReconResult<Self> {
        let width = match rows.first() {
            Some(first) => first.len(),
            None => return Err(ReconError::empty("windowed matrix has no rows")),
        };

        if width == 0 {
            return Err(ReconError::shape("windows must have at least one column"));
        }

        let mut values = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(ReconError::shape(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            values.extend(row);
        }

        Ok(Self { values, width })
    }

    /// 将序列切分为宽度为 `width`、步长为 1 的重叠窗口
    pub fn from_series(series: &[f64], width: usize) -> ReconResult<Self> {
        if width == 0 {
            return Err(ReconError::shape("window width must be at least 1"));
        }
        if series.len() < width {
            return Err(ReconError::empty(format!(
                "series of length {} is shorter than window width {}",
                series.len(),
                width
            )));
        }

        let values = series.windows(width).flatten().copied().collect();
        Ok(Self { values, width })
    }

    /// 行数 N
    pub fn rows(&self) -> usize {
        self.values.len() / self.width
    }

    /// 窗口宽度 W
    pub fn width(&self) -> usize {
        self.width
    }

    /// 重建后的序列长度 `N + W - 1`
    pub fn output_len(&self) -> usize {
        self.rows() + self.width - 1
    }

    /// 获取第 `i` 行
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.width)?;
        self.values.get(start..start + self.width)
    }

    /// 按顺序迭代所有行
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.width)
    }

    /// 所有元素乘以常数
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            values: self.values.iter().map(|v| v * factor).collect(),
            width: self.width,
        }
    }
}

impl TryFrom<Vec<Vec<f64>>> for WindowedMatrix {
    type Error = ReconError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<WindowedMatrix> for Vec<Vec<f64>> {
    fn from(matrix: WindowedMatrix) -> Self {
        matrix.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

/// 重建序列，长度为 `N + W - 1`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReconstructedSequence {
    values: Vec<f64>,
}

impl ReconstructedSequence {
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for ReconstructedSequence {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// 非有限值 (NaN / ±Inf) 处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinitePolicy {
    /// 遇到非有限值立即报错
    #[default]
    Reject,
    /// 按 IEEE 运算规则传播
    Propagate,
    /// 忽略非有限值，只对有限值求平均
    Skip,
}

/// 重建器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructorConfig {
    /// 非有限值处理策略
    pub non_finite: NonFinitePolicy,
    /// 输出保留的小数位数，`None` 表示不舍入
    pub precision: Option<usize>,
}
