//! 窗口序列重建命令行工具
//!
//! 读取 JSON 文件，执行切分、重建和对账

use anyhow::Context;
use clap::{Parser, Subcommand};
use recon_core::{compare_sequences, ReconstructorConfig, WindowReconstructor, WindowedMatrix};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 日志级别
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 将窗口矩阵重建为连续序列
    Reconstruct {
        /// 窗口矩阵 JSON 文件 (二维数组)
        #[arg(short, long)]
        input: PathBuf,
        /// 输出文件，默认写到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 将序列切分为重叠窗口
    Window {
        /// 序列 JSON 文件 (一维数组)
        #[arg(short, long)]
        input: PathBuf,
        /// 窗口宽度
        #[arg(short, long)]
        width: usize,
        /// 输出文件，默认写到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 对比计算序列与参考序列
    Compare {
        /// 计算结果 JSON 文件
        #[arg(long)]
        computed: PathBuf,
        /// 参考序列 JSON 文件
        #[arg(long)]
        reference: PathBuf,
        /// 允许的绝对误差
        #[arg(short, long, default_value_t = 1e-9)]
        tolerance: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Reconstruct { input, output } => {
            reconstruct_file(&input, output.as_deref(), config)?;
        }
        Commands::Window { input, width, output } => {
            window_file(&input, width, output.as_deref())?;
        }
        Commands::Compare { computed, reference, tolerance } => {
            compare_files(&computed, &reference, tolerance)?;
        }
    }

    Ok(())
}

/// 初始化日志，输出到标准错误以免干扰 JSON 结果
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let filter = EnvFilter::try_new(level).with_context(|| format!("无效的日志级别: {}", level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// 加载配置：默认值 < 配置文件 < RECON_ 前缀环境变量
fn load_config(path: Option<&Path>) -> anyhow::Result<ReconstructorConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let config = builder
        .add_source(config::Environment::with_prefix("RECON"))
        .build()
        .context("读取配置失败")?
        .try_deserialize()
        .context("解析配置失败")?;

    Ok(config)
}

/// 重建窗口矩阵文件
fn reconstruct_file(input: &Path, output: Option<&Path>, config: ReconstructorConfig) -> anyhow::Result<()> {
    let matrix: WindowedMatrix = read_json(input)?;
    tracing::info!(rows = matrix.rows(), width = matrix.width(), "matrix loaded");

    let sequence = WindowReconstructor::with_config(config)
        .reconstruct(&matrix)
        .with_context(|| format!("重建失败: {}", input.display()))?;

    write_json(output, &sequence)
}

/// 切分序列文件
fn window_file(input: &Path, width: usize, output: Option<&Path>) -> anyhow::Result<()> {
    let series: Vec<f64> = read_json(input)?;
    let matrix = WindowedMatrix::from_series(&series, width)
        .with_context(|| format!("切分失败: {}", input.display()))?;

    tracing::info!(rows = matrix.rows(), width, "series windowed");
    write_json(output, &matrix)
}

/// 对比两个序列文件，不一致时返回错误
fn compare_files(computed: &Path, reference: &Path, tolerance: f64) -> anyhow::Result<()> {
    let computed_values: Vec<f64> = read_json(computed)?;
    let reference_values: Vec<f64> = read_json(reference)?;

    let report = compare_sequences(&computed_values, &reference_values, tolerance)?;
    write_json(None, &report)?;

    if !report.is_match() {
        anyhow::bail!(
            "序列不一致: {} 个位置超出容差 {}, 长度差异 {:?}",
            report.mismatches.len(),
            tolerance,
            report.length_mismatch
        );
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("无法读取文件: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("JSON 解析失败: {}", path.display()))
}

fn write_json<T: Serialize>(output: Option<&Path>, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("无法写入文件: {}", path.display()))?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}
