use thiserror::Error;

use crate::models::record::{RecordEvent, RecordId, RecordState};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 远端网关错误
    #[error("网关错误: {0}")]
    Gateway(#[from] GatewayError),
    /// 记录存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 状态机拒绝的转换
    #[error("状态错误: {0}")]
    Transition(#[from] TransitionError),
    /// 输入校验失败
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 批量导入失败
    #[error("导入错误: {0}")]
    Ingest(#[from] IngestError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件读写错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
    /// JSON 序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 远端调用错误
///
/// `Display` 直接输出远端或传输层给出的消息，记录的 `error` 字段原样保存它。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 上游明确拒绝（非 2xx）
    #[error("{message}")]
    RemoteRejected { status: u16, message: String },
    /// 传输失败：超时、连接被拒、响应体无法解析
    #[error("{message}")]
    Unreachable { message: String },
}

impl GatewayError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        GatewayError::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        GatewayError::Unreachable {
            message: message.into(),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, GatewayError::Unreachable { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::unreachable(err.to_string())
    }
}

/// 记录存储错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("记录不存在: {0}")]
    NotFound(RecordId),
}

/// 状态机错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("非法状态转换: {from} 不接受事件 {event}")]
    Illegal { from: RecordState, event: &'static str },
}

impl TransitionError {
    pub fn illegal(from: RecordState, event: &RecordEvent) -> Self {
        TransitionError::Illegal {
            from,
            event: event.name(),
        }
    }
}

/// 输入校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必填字段为空
    #[error("Full Name and Email are required (缺少: {})", .missing.join(", "))]
    MissingRequired { missing: Vec<&'static str> },
}

/// 批量导入错误
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("JSON 解析失败: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("JSON must contain a 'resumes' array")]
    MissingResumes,
    #[error("The resumes array cannot be empty")]
    EmptyBatch,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
