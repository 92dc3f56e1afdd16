//! 统一错误定义

use thiserror::Error;

/// 重建计算统一错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconError {
    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Non-finite value {value} at row {row}, column {column}")]
    Numeric { row: usize, column: usize, value: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// 统一结果类型
pub type ReconResult<T> = Result<T, ReconError>;

impl ReconError {
    /// 创建形状错误
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// 创建空输入错误
    pub fn empty(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// 创建无效输入错误
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// 创建配置错误
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
