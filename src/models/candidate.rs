use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

/// 候选人输入字段
///
/// 导入时确定，处理过程中不再修改。缺失的字符串字段为空串，列表字段为空列表。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub dob: String,
    pub gender: String,
    pub title: String,
    pub overview: String,
    pub experience: Vec<JsonValue>,
    pub education: Vec<JsonValue>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    /// 原始简历数据，上传步骤原样序列化
    #[serde(skip_serializing)]
    pub original_data: JsonValue,
}

/// 注册接口的请求体（除原始数据外的全部输入字段）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub phone: &'a str,
    pub location: &'a str,
    pub dob: &'a str,
    pub gender: &'a str,
    pub title: &'a str,
    pub overview: &'a str,
    pub experience: &'a [JsonValue],
    pub education: &'a [JsonValue],
    pub skills: &'a [String],
    pub languages: &'a [String],
}

impl CandidateFields {
    pub fn registration_payload(&self) -> RegistrationPayload<'_> {
        RegistrationPayload {
            email: &self.email,
            full_name: &self.full_name,
            phone: &self.phone,
            location: &self.location,
            dob: &self.dob,
            gender: &self.gender,
            title: &self.title,
            overview: &self.overview,
            experience: &self.experience,
            education: &self.education,
            skills: &self.skills,
            languages: &self.languages,
        }
    }

    /// 上传文档的文件名：姓名中的空白替换为下划线，加 `_resume.<ext>`
    pub fn document_file_name(&self, extension: &str) -> String {
        static WHITESPACE: OnceLock<Regex> = OnceLock::new();
        let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("静态正则"));
        format!(
            "{}_resume.{}",
            re.replace_all(&self.full_name, "_"),
            extension
        )
    }

    /// 上传文档的内容：原始数据的 JSON 字符串
    pub fn document_content(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.original_data)
    }
}

/// 文档上传请求
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    pub user_id: String,
    pub document_type: String,
    pub file_name: String,
    pub file_content: String,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_name_collapses_whitespace_runs() {
        let fields = CandidateFields {
            full_name: "Ana  Maria\tLopez".to_string(),
            ..Default::default()
        };
        assert_eq!(fields.document_file_name("pdf"), "Ana_Maria_Lopez_resume.pdf");
    }

    #[test]
    fn registration_payload_is_camel_case_without_original_data() {
        let fields = CandidateFields {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            skills: vec!["rust".to_string()],
            original_data: json!({ "secret": true }),
            ..Default::default()
        };
        let body = serde_json::to_value(fields.registration_payload()).unwrap();
        assert_eq!(body["fullName"], "Jane Doe");
        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["skills"], json!(["rust"]));
        assert!(body.get("originalData").is_none());
    }

    #[test]
    fn document_content_serializes_original_data() {
        let fields = CandidateFields {
            original_data: json!({ "fullName": "Jane" }),
            ..Default::default()
        };
        assert_eq!(fields.document_content().unwrap(), r#"{"fullName":"Jane"}"#);
    }
}
