use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::BatchSummary;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则为 `info`（详细模式下为 `debug`）。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n候选人入驻日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 候选人批量入驻模式");
    info!("🔗 注册接口: {}", config.register_url);
    info!("🔗 上传接口: {}", config.upload_url);
    info!("⏱️ 记录间隔: {} 毫秒", config.pacing_interval_ms);
    info!("{}", "=".repeat(60));
}

/// 记录批次加载信息
///
/// # 参数
/// - `total`: 记录总数
/// - `pacing_ms`: 记录间隔
pub fn log_batch_loaded(total: usize, pacing_ms: u64) {
    info!("✓ 找到 {} 份待处理的简历", total);
    info!("📋 逐条处理：先注册，再上传简历");
    info!("💡 每条完成后等待 {} 毫秒再开始下一条\n", pacing_ms);
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 批次汇总
/// - `config`: 配置（输出文件路径）
pub fn print_final_stats(summary: &BatchSummary, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.completed, summary.total);
    info!("❌ 失败: {}", summary.failed);
    if summary.pending > 0 {
        info!("⏳ 未处理: {}", summary.pending);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
    if summary.failed > 0 {
        info!("失败记录已写入: {}", config.failure_log_file);
    }
    info!("报告已写入: {}", config.report_file);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
