//! 单条记录的入驻流程 - 流程层
//!
//! 核心职责：把一条 `Pending` 记录推进到终态
//!
//! 流程顺序：
//! 1. start → Register
//! 2. Registered → Uploading → UploadDocument
//! 3. Completed / Failed
//!
//! 每次状态变化先写入记录存储，再推送进度事件。远端失败只记录在该记录上，不向上抛出。

use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{DocumentUpload, Record, RecordEvent, RecordState};
use crate::services::{ProgressReporter, RecordStore, RemoteGateway};
use crate::utils::truncate_text;
use crate::workflow::record_ctx::RecordCtx;

/// 单条记录的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Completed,
    Failed,
}

/// 上传文档的固定参数
#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub document_type: String,
    pub mime_type: String,
    pub extension: String,
}

impl DocumentSettings {
    /// 批量处理使用的文档参数
    pub fn for_batch(config: &Config) -> Self {
        Self {
            document_type: config.document_type.clone(),
            mime_type: config.document_mime_type.clone(),
            extension: config.batch_document_extension.clone(),
        }
    }

    /// 单条注册使用的文档参数
    pub fn for_single(config: &Config) -> Self {
        Self {
            extension: config.single_document_extension.clone(),
            ..Self::for_batch(config)
        }
    }
}

/// 记录入驻流程
///
/// - 决定何时注册、何时上传
/// - 只通过 RemoteGateway 访问网络
/// - 只通过 RecordStore 修改记录
pub struct OnboardingFlow {
    gateway: Arc<dyn RemoteGateway>,
    store: RecordStore,
    reporter: ProgressReporter,
    document: DocumentSettings,
}

impl OnboardingFlow {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        store: RecordStore,
        reporter: ProgressReporter,
        document: DocumentSettings,
    ) -> Self {
        Self {
            gateway,
            store,
            reporter,
            document,
        }
    }

    /// 执行一条记录的完整流程
    ///
    /// 只有存储层面的错误（记录不存在、非法转换）会以 `Err` 返回。
    pub async fn run(&self, ctx: &RecordCtx) -> AppResult<RecordOutcome> {
        let record = self.advance(ctx, RecordEvent::Start)?;
        info!(
            "{} 📝 正在注册: {} <{}>",
            ctx, record.fields.full_name, record.fields.email
        );

        // ========== 步骤 1: 注册 ==========
        let remote_user_id = match self.gateway.register(&record.fields).await {
            Ok(id) => id,
            Err(e) => {
                error!("{} ❌ 注册失败: {}", ctx, truncate_text(&e.to_string(), 200));
                self.advance(
                    ctx,
                    RecordEvent::RegisterFailed {
                        error: e.to_string(),
                    },
                )?;
                return Ok(RecordOutcome::Failed);
            }
        };

        info!("{} ✓ 注册成功，用户 ID: {}", ctx, remote_user_id);
        self.advance(
            ctx,
            RecordEvent::RegisterSucceeded {
                remote_user_id: remote_user_id.clone(),
            },
        )?;

        // ========== 步骤 2: 上传文档 ==========
        let record = self.advance(ctx, RecordEvent::BeginUpload)?;
        info!("{} 📤 正在上传简历...", ctx);

        let upload = match self.build_upload(&record, remote_user_id) {
            Ok(upload) => upload,
            Err(message) => return self.fail_upload(ctx, message),
        };

        match self.gateway.upload_document(&upload).await {
            Ok(document_id) => {
                info!("{} ✓ 上传成功，文档 ID: {}", ctx, document_id);
                self.advance(
                    ctx,
                    RecordEvent::UploadSucceeded {
                        remote_document_id: document_id,
                    },
                )?;
                Ok(RecordOutcome::Completed)
            }
            Err(e) => self.fail_upload(ctx, e.to_string()),
        }
    }

    fn build_upload(&self, record: &Record, user_id: String) -> Result<DocumentUpload, String> {
        let file_content = record
            .fields
            .document_content()
            .map_err(|e| format!("无法序列化原始数据: {}", e))?;

        Ok(DocumentUpload {
            user_id,
            document_type: self.document.document_type.clone(),
            file_name: record.fields.document_file_name(&self.document.extension),
            file_content,
            mime_type: self.document.mime_type.clone(),
        })
    }

    fn fail_upload(&self, ctx: &RecordCtx, message: String) -> AppResult<RecordOutcome> {
        error!("{} ❌ 上传失败: {}", ctx, truncate_text(&message, 200));
        self.advance(ctx, RecordEvent::UploadFailed { error: message })?;
        Ok(RecordOutcome::Failed)
    }

    /// 提交一次状态变化，然后推送转换事件和最新汇总
    fn advance(&self, ctx: &RecordCtx, event: RecordEvent) -> AppResult<Record> {
        let mut from = RecordState::Pending;
        let record = self.store.update(&ctx.record_id, |r| {
            from = r.apply(event)?.from;
            Ok(())
        })?;

        self.reporter
            .transition(&record.id, from, record.state, record.error.clone());
        self.reporter.summary(self.store.summary());

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::models::{CandidateFields, RecordId};
    use crate::services::ProgressEvent;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc::Receiver;

    #[derive(Default)]
    struct FakeGateway {
        fail_register: bool,
        uploads: Mutex<Vec<DocumentUpload>>,
    }

    #[async_trait]
    impl RemoteGateway for FakeGateway {
        async fn register(&self, _fields: &CandidateFields) -> Result<String, GatewayError> {
            if self.fail_register {
                Err(GatewayError::rejected(400, "Invalid email"))
            } else {
                Ok("user-1".to_string())
            }
        }

        async fn upload_document(&self, upload: &DocumentUpload) -> Result<String, GatewayError> {
            self.uploads.lock().unwrap().push(upload.clone());
            Ok("doc-1".to_string())
        }
    }

    fn setup(gateway: Arc<FakeGateway>) -> (OnboardingFlow, RecordStore, Receiver<ProgressEvent>) {
        let store = RecordStore::from_batch([CandidateFields {
            full_name: "Jane Q Doe".into(),
            email: "jane@example.com".into(),
            original_data: json!({ "fullName": "Jane Q Doe" }),
            ..Default::default()
        }]);
        let (reporter, rx) = ProgressReporter::channel(64);
        let flow = OnboardingFlow::new(
            gateway,
            store.clone(),
            reporter,
            DocumentSettings::for_batch(&Config::default()),
        );
        (flow, store, rx)
    }

    fn transitions(rx: &mut Receiver<ProgressEvent>) -> Vec<(RecordState, RecordState)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressEvent::Transition(t) = event {
                out.push((t.from, t.to));
            }
        }
        out
    }

    #[tokio::test]
    async fn success_reports_every_transition() {
        let gateway = Arc::new(FakeGateway::default());
        let (flow, store, mut rx) = setup(gateway.clone());
        let ctx = RecordCtx::new(RecordId::from_index(0), 1, 1);

        assert_eq!(flow.run(&ctx).await.unwrap(), RecordOutcome::Completed);

        use RecordState::*;
        assert_eq!(
            transitions(&mut rx),
            vec![
                (Pending, Registering),
                (Registering, Registered),
                (Registered, Uploading),
                (Uploading, Completed)
            ]
        );

        let record = store.get(&ctx.record_id).unwrap();
        assert_eq!(record.remote_user_id.as_deref(), Some("user-1"));
        assert_eq!(record.remote_document_id.as_deref(), Some("doc-1"));

        let uploads = gateway.uploads.lock().unwrap();
        assert_eq!(uploads[0].user_id, "user-1");
        assert_eq!(uploads[0].file_name, "Jane_Q_Doe_resume.pdf");
        assert_eq!(uploads[0].document_type, "resume");
        assert_eq!(uploads[0].file_content, r#"{"fullName":"Jane Q Doe"}"#);
    }

    #[tokio::test]
    async fn register_failure_skips_upload() {
        let gateway = Arc::new(FakeGateway {
            fail_register: true,
            ..Default::default()
        });
        let (flow, store, mut rx) = setup(gateway.clone());
        let ctx = RecordCtx::new(RecordId::from_index(0), 1, 1);

        assert_eq!(flow.run(&ctx).await.unwrap(), RecordOutcome::Failed);
        assert!(gateway.uploads.lock().unwrap().is_empty());

        let record = store.get(&ctx.record_id).unwrap();
        assert_eq!(record.state, RecordState::Failed);
        assert_eq!(record.error.as_deref(), Some("Invalid email"));
        assert!(record.remote_user_id.is_none());
        assert_eq!(
            transitions(&mut rx),
            vec![
                (RecordState::Pending, RecordState::Registering),
                (RecordState::Registering, RecordState::Failed)
            ]
        );
    }
}
