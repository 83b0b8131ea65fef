//! 失败记录写入服务 - 业务能力层
//!
//! 只负责"把当前失败的记录写到文件"，不关心流程

use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::debug;

use crate::models::{Record, RecordState};

/// 失败记录写入服务
pub struct FailureWriter {
    file_path: String,
}

impl FailureWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    /// 用当前处于 `Failed` 的记录覆盖文件，返回写入的条数
    ///
    /// 重试后成功的记录不会留在文件里，再次失败的记录也只出现一次。
    pub fn write(&self, records: &[Record]) -> Result<usize> {
        let mut file = BufWriter::new(File::create(&self.file_path)?);
        let mut written = 0;

        for record in records.iter().filter(|r| r.state == RecordState::Failed) {
            debug!("写入失败记录: {}", record.id);
            writeln!(
                file,
                "记录 {} | {} | {} | 错误: {}",
                record.id,
                record.fields.full_name,
                record.fields.email,
                record.error.as_deref().unwrap_or_default()
            )?;
            written += 1;
        }
        file.flush()?;

        Ok(written)
    }
}
