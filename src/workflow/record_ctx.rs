//! 记录处理上下文
//!
//! 封装"我正在处理本批的第几条记录"这一信息

use std::fmt::Display;

use crate::models::RecordId;

/// 记录处理上下文
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 记录 id
    pub record_id: RecordId,

    /// 本轮中的序号（从1开始，仅用于日志显示）
    pub position: usize,

    /// 本轮记录总数
    pub total: usize,
}

impl RecordCtx {
    pub fn new(record_id: RecordId, position: usize, total: usize) -> Self {
        Self {
            record_id,
            position,
            total,
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[记录 {}/{} #{}]", self.position, self.total, self.record_id)
    }
}
