//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"POST 一个 JSON"的能力

use crate::error::GatewayError;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// 一次 HTTP 调用的结果
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: JsonValue,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP 执行器
///
/// 职责：
/// - 持有 reqwest Client（连接池、超时）
/// - 暴露 post_json() 能力
/// - 不认识候选人 / 记录
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    /// 创建带超时的执行器
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// POST JSON 并解析 JSON 响应
    ///
    /// 传输失败或响应体不是 JSON 时返回 `Unreachable`；非 2xx 状态照常返回，由调用方判断。
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<HttpReply, GatewayError> {
        debug!("POST {}", url);

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = serde_json::from_str(&text).map_err(|e| {
            GatewayError::unreachable(format!("无效的响应体 (HTTP {}): {}", status, e))
        })?;

        debug!("POST {} -> HTTP {}", url, status);

        Ok(HttpReply { status, body })
    }
}
