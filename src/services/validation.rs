//! 输入校验 - 业务能力层
//!
//! 只做必填字段的存在性检查，在状态机启动之前拒绝记录

use crate::error::ValidationError;
use crate::models::CandidateFields;

/// 检查 `fullName` 与 `email` 非空（忽略首尾空白）
pub fn validate_candidate(fields: &CandidateFields) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if fields.full_name.trim().is_empty() {
        missing.push("fullName");
    }
    if fields.email.trim().is_empty() {
        missing.push("email");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingRequired { missing })
    }
}
