//! 重叠窗口序列重建核心库
//!
//! 提供窗口矩阵模型、序列重建算法、对账诊断和工具函数

pub mod models;
pub mod reconstruct;
pub mod diagnostics;
pub mod utils;
pub mod errors;

// 重新导出主要类型
pub use models::*;
pub use reconstruct::{coverage_count, coverage_counts, reconstruct, WindowReconstructor};
pub use diagnostics::{compare_sequences, ComparisonReport, Mismatch};
pub use errors::*;
