//! 远端网关 - 业务能力层
//!
//! 只负责"注册"和"上传文档"两个远端调用，不关心流程，不重试

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;
use crate::infrastructure::{HttpExecutor, HttpReply};
use crate::models::{CandidateFields, DocumentUpload};

const REGISTER_FAILED: &str = "Registration failed";
const UPLOAD_FAILED: &str = "Upload failed";

/// 远端网关
///
/// 同样的输入调用两次就是两次远端请求，网关本身不做去重。
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// 注册候选人，返回远端用户 id
    async fn register(&self, fields: &CandidateFields) -> Result<String, GatewayError>;

    /// 上传候选人文档，返回远端文档 id
    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String, GatewayError>;
}

/// 基于 HTTP 的网关实现
pub struct HttpGateway {
    executor: HttpExecutor,
    register_url: String,
    upload_url: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        Ok(Self {
            executor: HttpExecutor::new(config.request_timeout())?,
            register_url: config.register_url.clone(),
            upload_url: config.upload_url.clone(),
        })
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn register(&self, fields: &CandidateFields) -> Result<String, GatewayError> {
        debug!("注册候选人: {} <{}>", fields.full_name, fields.email);

        let reply = self
            .executor
            .post_json(&self.register_url, &fields.registration_payload())
            .await?;

        interpret_reply(reply, REGISTER_FAILED)
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String, GatewayError> {
        debug!(
            "上传文档: 用户 {} | 类型 {} | 文件 {}",
            upload.user_id, upload.document_type, upload.file_name
        );

        let reply = self.executor.post_json(&self.upload_url, upload).await?;

        interpret_reply(reply, UPLOAD_FAILED)
    }
}

/// 把 HTTP 响应翻译成 id 或错误
fn interpret_reply(reply: HttpReply, default_message: &str) -> Result<String, GatewayError> {
    if !reply.is_success() {
        let message = extract_message(&reply.body).unwrap_or_else(|| default_message.to_string());
        warn!("远端拒绝 (HTTP {}): {}", reply.status, message);
        return Err(GatewayError::rejected(reply.status, message));
    }

    extract_remote_id(&reply.body).ok_or_else(|| {
        GatewayError::unreachable(format!("响应中缺少 id (HTTP {})", reply.status))
    })
}

/// 成功响应中的 id：优先 `data.id`，其次顶层 `id`
pub fn extract_remote_id(body: &JsonValue) -> Option<String> {
    let nested = body.get("data").and_then(|data| data.get("id"));
    [nested, body.get("id")]
        .into_iter()
        .flatten()
        .find_map(id_to_string)
}

fn id_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 错误响应中的消息：`message`，其次 `error`
pub fn extract_message(body: &JsonValue) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, body: JsonValue) -> HttpReply {
        HttpReply { status, body }
    }

    #[test]
    fn prefers_nested_data_id() {
        let body = json!({ "id": "outer", "data": { "id": "inner" } });
        assert_eq!(extract_remote_id(&body).as_deref(), Some("inner"));
    }

    #[test]
    fn falls_back_to_top_level_numeric_id() {
        let body = json!({ "id": 42, "data": {} });
        assert_eq!(extract_remote_id(&body).as_deref(), Some("42"));
    }

    #[test]
    fn rejected_reply_uses_upstream_message() {
        let err = interpret_reply(
            reply(409, json!({ "message": "Email already exists" })),
            REGISTER_FAILED,
        )
        .unwrap_err();
        assert_eq!(err, GatewayError::rejected(409, "Email already exists"));
    }

    #[test]
    fn rejected_reply_without_message_uses_default() {
        let err = interpret_reply(reply(500, json!({})), UPLOAD_FAILED).unwrap_err();
        assert_eq!(err.to_string(), "Upload failed");
    }

    #[test]
    fn success_without_id_is_malformed() {
        let err = interpret_reply(reply(200, json!({ "ok": true })), REGISTER_FAILED).unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let config = Config {
            register_url: "http://127.0.0.1:1/register".to_string(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let gateway = HttpGateway::new(&config).unwrap();

        let err = gateway
            .register(&CandidateFields::default())
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
    }
}
