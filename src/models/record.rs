//! 记录模型与单条记录的状态机
//!
//! ```text
//! Pending → Registering → Registered → Uploading → Completed
//!              ↓                           ↓
//!            Failed ←─────────────────────┘
//!              ↓ (仅显式重试)
//!           Pending
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransitionError;
use crate::models::candidate::CandidateFields;

/// 记录标识，导入时分配（`cv-{序号}`），与远端无关
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn from_index(index: usize) -> Self {
        Self(format!("cv-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 记录生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Pending,
    Registering,
    Registered,
    Uploading,
    Completed,
    Failed,
}

impl RecordState {
    /// 本轮处理的终态
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordState::Completed | RecordState::Failed)
    }

    /// 正在与远端交互
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            RecordState::Registering | RecordState::Registered | RecordState::Uploading
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordState::Pending => "Pending",
            RecordState::Registering => "Registering...",
            RecordState::Registered => "Registered",
            RecordState::Uploading => "Uploading CV...",
            RecordState::Completed => "Completed",
            RecordState::Failed => "Error",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordState::Pending => "pending",
            RecordState::Registering => "registering",
            RecordState::Registered => "registered",
            RecordState::Uploading => "uploading",
            RecordState::Completed => "completed",
            RecordState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 状态机事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    Start,
    RegisterSucceeded { remote_user_id: String },
    RegisterFailed { error: String },
    BeginUpload,
    UploadSucceeded { remote_document_id: String },
    UploadFailed { error: String },
    Retry,
}

impl RecordEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RecordEvent::Start => "start",
            RecordEvent::RegisterSucceeded { .. } => "register_succeeded",
            RecordEvent::RegisterFailed { .. } => "register_failed",
            RecordEvent::BeginUpload => "begin_upload",
            RecordEvent::UploadSucceeded { .. } => "upload_succeeded",
            RecordEvent::UploadFailed { .. } => "upload_failed",
            RecordEvent::Retry => "retry",
        }
    }
}

/// 一次已提交的状态变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RecordState,
    pub to: RecordState,
}

/// 一条候选人记录：输入字段 + 处理状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: CandidateFields,
    pub state: RecordState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_document_id: Option<String>,
}

impl Record {
    pub fn new(id: RecordId, fields: CandidateFields) -> Self {
        Self {
            id,
            fields,
            state: RecordState::Pending,
            error: None,
            remote_user_id: None,
            remote_document_id: None,
        }
    }

    /// 按转换表应用事件
    ///
    /// 非法事件返回错误，记录保持不变。
    pub fn apply(&mut self, event: RecordEvent) -> Result<Transition, TransitionError> {
        let from = self.state;
        let to = match (from, &event) {
            (RecordState::Pending, RecordEvent::Start) => RecordState::Registering,
            (RecordState::Registering, RecordEvent::RegisterSucceeded { .. }) => {
                RecordState::Registered
            }
            (RecordState::Registering, RecordEvent::RegisterFailed { .. }) => RecordState::Failed,
            (RecordState::Registered, RecordEvent::BeginUpload) => RecordState::Uploading,
            (RecordState::Uploading, RecordEvent::UploadSucceeded { .. }) => RecordState::Completed,
            (RecordState::Uploading, RecordEvent::UploadFailed { .. }) => RecordState::Failed,
            (RecordState::Failed, RecordEvent::Retry) => RecordState::Pending,
            _ => return Err(TransitionError::illegal(from, &event)),
        };

        match event {
            RecordEvent::RegisterSucceeded { remote_user_id } => {
                self.remote_user_id = Some(remote_user_id);
            }
            RecordEvent::UploadSucceeded { remote_document_id } => {
                self.remote_document_id = Some(remote_document_id);
            }
            RecordEvent::RegisterFailed { error } | RecordEvent::UploadFailed { error } => {
                self.error = Some(error);
            }
            RecordEvent::Retry => self.error = None,
            RecordEvent::Start | RecordEvent::BeginUpload => {}
        }
        self.state = to;

        Ok(Transition { from, to })
    }

    /// 检查字段与状态是否一致
    pub fn is_consistent(&self) -> bool {
        let error_ok = self.error.is_some() == (self.state == RecordState::Failed);
        let document_ok =
            self.remote_document_id.is_some() == (self.state == RecordState::Completed);
        let user_ok = match self.state {
            RecordState::Registered | RecordState::Uploading | RecordState::Completed => {
                self.remote_user_id.is_some()
            }
            // 重试过的记录可能保留上一次注册得到的 id
            _ => true,
        };
        error_ok && document_ok && user_ok
    }
}

/// 批次汇总（按需从存储重新计算）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_states(states: impl IntoIterator<Item = RecordState>) -> Self {
        let mut summary = Self::default();
        for state in states {
            summary.total += 1;
            match state {
                RecordState::Pending => summary.pending += 1,
                RecordState::Completed => summary.completed += 1,
                RecordState::Failed => summary.failed += 1,
                _ => summary.in_flight += 1,
            }
        }
        summary
    }

    pub fn is_settled(&self) -> bool {
        self.completed + self.failed == self.total
    }

    /// 完成百分比
    pub fn completion_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "完成 {} | 处理中 {} | 失败 {} | 待处理 {} | 共 {}",
            self.completed, self.in_flight, self.failed, self.pending, self.total
        )
    }
}
