//! 批量驱动器 - 编排层
//!
//! ## 职责
//!
//! 按存储顺序逐条推进 `Pending` 记录，直到每条都到达终态。
//!
//! ## 核心规则
//!
//! 1. **单条在途**：在途锁保证任何时刻最多一条记录在与远端交互（多轮并发调用也一样）
//! 2. **节流**：一条记录到达终态后，等待固定间隔再开始下一条；间隔跨轮次计算
//! 3. **失败隔离**：单条失败不会中止本轮
//! 4. **不自动重试**：失败记录只能由显式重试重新排队
//! 5. **暂停/停止**：只在下一条记录开始之前生效，不取消在途的远端调用

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{sleep_until, Instant};
use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::{BatchSummary, Record, RecordId, RecordState};
use crate::services::{validate_candidate, ProgressReporter, RecordStore, RemoteGateway};
use crate::workflow::{DocumentSettings, OnboardingFlow, RecordCtx, RecordOutcome};

/// 驱动器运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Paused,
    Stopped,
}

/// 暂停 / 继续 / 停止驱动器的句柄
#[derive(Debug, Clone)]
pub struct DriverControl {
    tx: Arc<watch::Sender<DriverState>>,
}

impl DriverControl {
    fn new() -> (Self, watch::Receiver<DriverState>) {
        let (tx, rx) = watch::channel(DriverState::Running);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn pause(&self) {
        self.set(DriverState::Paused);
    }

    pub fn resume(&self) {
        self.set(DriverState::Running);
    }

    pub fn stop(&self) {
        self.set(DriverState::Stopped);
    }

    pub fn state(&self) -> DriverState {
        *self.tx.borrow()
    }

    fn set(&self, state: DriverState) {
        self.tx.send_replace(state);
    }
}

/// 一轮处理的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 实际发起远端调用的记录数
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// 未通过校验而跳过的记录
    pub skipped: Vec<RecordId>,
    /// 是否被 stop() 提前结束
    pub stopped: bool,
    /// 本轮结束时的汇总
    pub summary: BatchSummary,
}

/// 批量驱动器
pub struct BatchDriver {
    store: RecordStore,
    reporter: ProgressReporter,
    flow: OnboardingFlow,
    pacing: Duration,
    /// 在途锁，内容为上一条记录到达终态的时刻
    in_flight: Mutex<Option<Instant>>,
    control: DriverControl,
    control_rx: watch::Receiver<DriverState>,
}

impl BatchDriver {
    pub fn new(
        store: RecordStore,
        gateway: Arc<dyn RemoteGateway>,
        reporter: ProgressReporter,
        document: DocumentSettings,
        pacing: Duration,
    ) -> Self {
        let flow = OnboardingFlow::new(gateway, store.clone(), reporter.clone(), document);
        let (control, control_rx) = DriverControl::new();
        Self {
            store,
            reporter,
            flow,
            pacing,
            in_flight: Mutex::new(None),
            control,
            control_rx,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn control(&self) -> DriverControl {
        self.control.clone()
    }

    pub fn summary(&self) -> BatchSummary {
        self.store.summary()
    }

    /// 处理本轮开始时所有 `Pending` 的记录
    pub async fn run(&self) -> AppResult<RunReport> {
        let pending = self.store.pending_ids();
        self.run_records(&pending).await
    }

    /// 显式重试：重置全部失败记录，并只对这些记录再跑一轮
    pub async fn retry_failed_and_run(&self) -> AppResult<RunReport> {
        let failed = self.store.failed_ids();
        if failed.is_empty() {
            info!("没有失败的记录需要重试");
            return Ok(RunReport {
                summary: self.store.summary(),
                ..Default::default()
            });
        }

        info!("🔁 重试 {} 条失败记录", failed.len());
        for id in &failed {
            self.retry_record(id)?;
        }
        self.run_records(&failed).await
    }

    /// 显式重试单条记录：`Failed → Pending`，不启动处理
    pub fn retry_record(&self, id: &RecordId) -> AppResult<Record> {
        let record = self.store.retry(id)?;
        self.reporter
            .transition(id, RecordState::Failed, RecordState::Pending, None);
        self.reporter.summary(self.store.summary());
        Ok(record)
    }

    /// 按给定顺序处理记录；开始时已不是 `Pending` 的记录被忽略
    pub async fn run_records(&self, ids: &[RecordId]) -> AppResult<RunReport> {
        let total = ids.len();
        let mut report = RunReport::default();

        for (index, id) in ids.iter().enumerate() {
            let ctx = RecordCtx::new(id.clone(), index + 1, total);

            let mut last_finished = self.in_flight.lock().await;

            let record = self.store.get(id)?;
            if record.state != RecordState::Pending {
                continue;
            }

            if let Err(e) = validate_candidate(&record.fields) {
                warn!("{} ⚠️ 跳过: {}", ctx, e);
                self.reporter.rejected(id, e.to_string());
                report.skipped.push(id.clone());
                continue;
            }

            if let Some(finished_at) = *last_finished {
                sleep_until(finished_at + self.pacing).await;
            }

            // 节流间隔内发出的暂停 / 停止也要拦住本条的 Start
            if !self.wait_until_runnable().await {
                warn!("⏹️ 驱动器已停止，剩余 {} 条记录保持待处理", total - index);
                report.stopped = true;
                break;
            }

            report.attempted += 1;
            let outcome = self.flow.run(&ctx).await;
            *last_finished = Some(Instant::now());
            match outcome? {
                RecordOutcome::Completed => report.completed += 1,
                RecordOutcome::Failed => report.failed += 1,
            }
        }

        report.summary = self.store.summary();
        self.reporter.summary(report.summary);
        log_run_complete(&report);

        Ok(report)
    }

    /// 暂停时等待；返回 false 表示已停止
    async fn wait_until_runnable(&self) -> bool {
        let mut rx = self.control_rx.clone();
        loop {
            let state = *rx.borrow_and_update();
            match state {
                DriverState::Running => return true,
                DriverState::Stopped => return false,
                DriverState::Paused => {
                    info!("⏸️ 驱动器已暂停，等待继续...");
                    if rx.changed().await.is_err() {
                        error!("驱动器控制通道已关闭");
                        return false;
                    }
                }
            }
        }
    }
}

fn log_run_complete(report: &RunReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 本轮完成: 成功 {}, 失败 {}, 跳过 {}, 共尝试 {}",
        report.completed,
        report.failed,
        report.skipped.len(),
        report.attempted
    );
    info!("📊 {}", report.summary);
    info!("{}", "─".repeat(60));
}
