//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、加载批次、创建 HTTP 网关
//! 2. **进度消费**：启动日志消费者，订阅驱动器的进度事件
//! 3. **运行**：委托 BatchDriver 处理批次
//! 4. **输出**：失败记录文件、JSON 报告、最终统计

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{load_batch_file, BatchSummary, CandidateFields, Record};
use crate::orchestrator::batch_driver::{BatchDriver, RunReport};
use crate::services::{
    spawn_progress_log, FailureWriter, HttpGateway, ProgressReporter, ProgressView, RecordStore,
    RemoteGateway,
};
use crate::utils::logging::{init_log_file, log_batch_loaded, log_startup, print_final_stats};
use crate::workflow::DocumentSettings;

/// 应用主结构
pub struct App {
    config: Config,
    driver: BatchDriver,
    progress_log: JoinHandle<ProgressView>,
}

/// 写入 report_file 的最终报告
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchReport<'a> {
    generated_at: String,
    summary: BatchSummary,
    records: &'a [Record],
}

impl App {
    /// 初始化应用：读取 `config.input_file`，连接真实的远端接口
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        info!("\n📁 正在读取批次文件: {}", config.input_file);
        let batch = load_batch_file(Path::new(&config.input_file)).await?;

        let gateway = HttpGateway::new(&config).context("无法创建 HTTP 客户端")?;

        Ok(Self::with_gateway(config, batch, Arc::new(gateway)))
    }

    /// 使用给定的批次和网关组装应用（需要在 tokio 运行时中调用）
    pub fn with_gateway(
        config: Config,
        batch: Vec<CandidateFields>,
        gateway: Arc<dyn RemoteGateway>,
    ) -> Self {
        let (reporter, rx) = ProgressReporter::channel(config.progress_channel_capacity);
        let progress_log = spawn_progress_log(rx, config.verbose_logging);

        let driver = BatchDriver::new(
            RecordStore::from_batch(batch),
            gateway,
            reporter,
            DocumentSettings::for_batch(&config),
            config.pacing_interval(),
        );

        Self {
            config,
            driver,
            progress_log,
        }
    }

    pub fn driver(&self) -> &BatchDriver {
        &self.driver
    }

    /// 处理所有待处理的记录
    pub async fn run(&self) -> Result<RunReport> {
        let total = self.driver.store().len();
        if total == 0 {
            warn!("⚠️ 批次为空，程序结束");
            return Ok(RunReport::default());
        }

        log_batch_loaded(total, self.config.pacing_interval_ms);

        let report = self.driver.run().await?;
        self.write_outputs()?;

        Ok(report)
    }

    /// 用户明确要求时，重试所有失败记录
    pub async fn retry_failed(&self) -> Result<RunReport> {
        let report = self.driver.retry_failed_and_run().await?;
        self.write_outputs()?;
        Ok(report)
    }

    /// 结束应用：关闭进度通道，等待日志消费者退出，输出最终统计
    pub async fn finish(self) -> Result<ProgressView> {
        let summary = self.driver.summary();
        drop(self.driver);

        let view = self.progress_log.await.context("进度日志任务异常退出")?;
        print_final_stats(&summary, &self.config);

        Ok(view)
    }

    fn write_outputs(&self) -> Result<()> {
        let records = self.driver.store().all();

        let written = FailureWriter::with_path(&self.config.failure_log_file)
            .write(&records)
            .with_context(|| format!("无法写入失败记录: {}", self.config.failure_log_file))?;
        if written > 0 {
            warn!("⚠️ {} 条失败记录已写入 {}", written, self.config.failure_log_file);
        }

        let report = BatchReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            summary: self.driver.summary(),
            records: &records,
        };
        std::fs::write(&self.config.report_file, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("无法写入报告: {}", self.config.report_file))?;

        Ok(())
    }
}
