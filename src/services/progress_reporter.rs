//! 进度上报
//!
//! 驱动器通过有界通道推送事件，`try_send` 永不等待消费者；通道满时丢弃事件并计数。
//! 记录存储才是事实来源，上报是尽力而为的。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{BatchSummary, RecordId, RecordState};

/// 单条记录的状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub record_id: RecordId,
    pub from: RecordState,
    pub to: RecordState,
    pub error: Option<String>,
}

/// 驱动器推送给观察者的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Transition(TransitionEvent),
    /// 记录未通过校验，保持 `Pending`
    Rejected { record_id: RecordId, reason: String },
    Summary(BatchSummary),
}

/// 进度上报器（发送端）
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ProgressEvent>>,
    dropped: Arc<AtomicU64>,
}

impl ProgressReporter {
    /// 创建上报器和对应的接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx: Some(tx),
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// 不上报任何事件
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn transition(
        &self,
        record_id: &RecordId,
        from: RecordState,
        to: RecordState,
        error: Option<String>,
    ) {
        self.publish(ProgressEvent::Transition(TransitionEvent {
            record_id: record_id.clone(),
            from,
            to,
            error,
        }));
    }

    pub fn rejected(&self, record_id: &RecordId, reason: impl Into<String>) {
        self.publish(ProgressEvent::Rejected {
            record_id: record_id.clone(),
            reason: reason.into(),
        });
    }

    pub fn summary(&self, summary: BatchSummary) {
        self.publish(ProgressEvent::Summary(summary));
    }

    /// 因通道已满而丢弃的事件数
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn publish(&self, event: ProgressEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("进度通道已满，丢弃事件: {:?}", event);
            }
            // 没有消费者
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// 由事件流重建的进度视图
#[derive(Debug, Clone, Default)]
pub struct ProgressView {
    pub states: HashMap<RecordId, RecordState>,
    pub errors: HashMap<RecordId, String>,
    pub rejections: HashMap<RecordId, String>,
    pub latest_summary: Option<BatchSummary>,
    pub events_seen: usize,
}

impl ProgressView {
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.events_seen += 1;
        match event {
            ProgressEvent::Transition(t) => {
                self.states.insert(t.record_id.clone(), t.to);
                match &t.error {
                    Some(error) => {
                        self.errors.insert(t.record_id.clone(), error.clone());
                    }
                    None => {
                        self.errors.remove(&t.record_id);
                    }
                }
            }
            ProgressEvent::Rejected { record_id, reason } => {
                self.rejections.insert(record_id.clone(), reason.clone());
            }
            ProgressEvent::Summary(summary) => self.latest_summary = Some(*summary),
        }
    }

    pub fn state_of(&self, id: &RecordId) -> Option<RecordState> {
        self.states.get(id).copied()
    }
}

/// 启动日志消费者：把事件写入 tracing，通道关闭时返回最终视图
pub fn spawn_progress_log(
    mut rx: mpsc::Receiver<ProgressEvent>,
    verbose: bool,
) -> JoinHandle<ProgressView> {
    tokio::spawn(async move {
        let mut view = ProgressView::default();
        while let Some(event) = rx.recv().await {
            view.apply(&event);
            match &event {
                ProgressEvent::Transition(t) => match &t.error {
                    Some(error) => warn!("[{}] {} → {}: {}", t.record_id, t.from, t.to, error),
                    None => info!("[{}] {} → {} ({})", t.record_id, t.from, t.to, t.to.label()),
                },
                ProgressEvent::Rejected { record_id, reason } => {
                    warn!("[{}] ⚠️ 未通过校验，跳过: {}", record_id, reason);
                }
                ProgressEvent::Summary(summary) if verbose => {
                    info!("📊 {} ({:.0}%)", summary, summary.completion_percent());
                }
                ProgressEvent::Summary(_) => {}
            }
        }
        view
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_channel_drops_without_blocking() {
        let (reporter, mut rx) = ProgressReporter::channel(1);
        let id = RecordId::from_index(0);

        reporter.transition(&id, RecordState::Pending, RecordState::Registering, None);
        reporter.transition(&id, RecordState::Registering, RecordState::Registered, None);

        assert_eq!(reporter.dropped_events(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (reporter, rx) = ProgressReporter::channel(4);
        drop(rx);
        reporter.summary(BatchSummary::default());
        assert_eq!(reporter.dropped_events(), 0);
    }

    #[test]
    fn view_tracks_latest_state_and_error() {
        let mut view = ProgressView::default();
        let id = RecordId::from_index(3);
        view.apply(&ProgressEvent::Transition(TransitionEvent {
            record_id: id.clone(),
            from: RecordState::Uploading,
            to: RecordState::Failed,
            error: Some("timeout".into()),
        }));
        assert_eq!(view.state_of(&id), Some(RecordState::Failed));
        assert_eq!(view.errors.get(&id).map(String::as_str), Some("timeout"));

        view.apply(&ProgressEvent::Transition(TransitionEvent {
            record_id: id.clone(),
            from: RecordState::Failed,
            to: RecordState::Pending,
            error: None,
        }));
        assert!(view.errors.get(&id).is_none());
        assert_eq!(view.events_seen, 2);
    }

    #[tokio::test]
    async fn log_consumer_returns_view_on_close() {
        let (reporter, rx) = ProgressReporter::channel(8);
        let handle = spawn_progress_log(rx, true);

        reporter.rejected(&RecordId::from_index(0), "missing email");
        reporter.summary(BatchSummary::from_states([RecordState::Pending]));
        drop(reporter);

        let view = handle.await.unwrap();
        assert_eq!(view.rejections.len(), 1);
        assert_eq!(view.latest_summary.map(|s| s.pending), Some(1));
    }
}
