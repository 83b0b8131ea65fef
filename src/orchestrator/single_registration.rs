//! 单条注册 - 编排层
//!
//! 手工录入的一条记录走与批量相同的流程（规模为 1 的一轮）

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{CandidateFields, Record, RecordId};
use crate::orchestrator::batch_driver::BatchDriver;
use crate::services::{validate_candidate, ProgressReporter, RecordStore, RemoteGateway};
use crate::workflow::DocumentSettings;

/// 注册单个候选人并上传其资料
///
/// 校验失败时直接返回错误，不发起任何远端调用。远端失败体现在返回记录的 `state` / `error` 上。
pub async fn register_single(
    mut fields: CandidateFields,
    gateway: Arc<dyn RemoteGateway>,
    reporter: ProgressReporter,
    config: &Config,
) -> AppResult<Record> {
    validate_candidate(&fields)?;

    // 表单本身就是要上传的原始资料
    if fields.original_data.is_null() {
        fields.original_data = serde_json::to_value(&fields)?;
    }

    info!("📝 单条注册: {} <{}>", fields.full_name, fields.email);

    let store = RecordStore::from_batch([fields]);
    let driver = BatchDriver::new(
        store.clone(),
        gateway,
        reporter,
        DocumentSettings::for_single(config),
        Duration::ZERO,
    );

    driver.run().await?;

    Ok(store.get(&RecordId::from_index(0))?)
}
