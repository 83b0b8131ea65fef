use crate::error::IngestError;
use crate::models::candidate::CandidateFields;
use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::fs;

/// 从 JSON 文本解析候选人批次
///
/// 格式: `{ "resumes": [ { "cv_json": { ... } } ] }`
pub fn parse_batch(text: &str) -> Result<Vec<CandidateFields>, IngestError> {
    let data: JsonValue = serde_json::from_str(text).map_err(IngestError::InvalidJson)?;

    let resumes = data
        .get("resumes")
        .and_then(|v| v.as_array())
        .ok_or(IngestError::MissingResumes)?;

    if resumes.is_empty() {
        return Err(IngestError::EmptyBatch);
    }

    Ok(resumes
        .iter()
        .map(|resume| candidate_from_cv(resume.get("cv_json")))
        .collect())
}

/// 从文件加载候选人批次
pub async fn load_batch_file(path: &Path) -> Result<Vec<CandidateFields>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取批次文件: {}", path.display()))?;

    let batch = parse_batch(&content)
        .with_context(|| format!("无法解析批次文件: {}", path.display()))?;

    tracing::info!(
        "成功加载 {} 份简历: {}",
        batch.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(batch)
}

fn candidate_from_cv(cv: Option<&JsonValue>) -> CandidateFields {
    let cv = cv.unwrap_or(&JsonValue::Null);
    let personal = cv.get("personalInfo").unwrap_or(&JsonValue::Null);

    CandidateFields {
        full_name: string_field(cv, "fullName"),
        email: string_field(personal, "email"),
        phone: string_field(personal, "phone"),
        location: string_field(personal, "location"),
        dob: string_field(personal, "dob"),
        gender: string_field(personal, "gender"),
        title: string_field(cv, "title"),
        overview: string_field(cv, "overview"),
        experience: list_field(cv, "experience"),
        education: list_field(cv, "education"),
        skills: string_list_field(cv, "skills"),
        languages: string_list_field(cv, "languages"),
        original_data: cv.clone(),
    }
}

fn string_field(value: &JsonValue, key: &str) -> String {
    match value.get(key) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn list_field(value: &JsonValue, key: &str) -> Vec<JsonValue> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

fn string_list_field(value: &JsonValue, key: &str) -> Vec<String> {
    list_field(value, key)
        .into_iter()
        .filter_map(|item| match item {
            JsonValue::String(s) => Some(s),
            JsonValue::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn maps_nested_personal_info() {
        let text = json!({
            "resumes": [{
                "cv_json": {
                    "fullName": "Jane Doe",
                    "title": "Engineer",
                    "personalInfo": { "email": "jane@example.com", "phone": "123" },
                    "skills": ["rust", "sql"],
                    "experience": [{ "company": "Acme" }]
                }
            }]
        })
        .to_string();

        let batch = parse_batch(&text).unwrap();
        assert_eq!(batch.len(), 1);
        let cv = &batch[0];
        assert_eq!(cv.full_name, "Jane Doe");
        assert_eq!(cv.email, "jane@example.com");
        assert_eq!(cv.phone, "123");
        assert_eq!(cv.location, "");
        assert_eq!(cv.skills, vec!["rust", "sql"]);
        assert_eq!(cv.experience.len(), 1);
        assert!(cv.languages.is_empty());
        assert_eq!(cv.original_data["title"], "Engineer");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let batch = parse_batch(r#"{ "resumes": [ {} ] }"#).unwrap();
        assert_eq!(batch[0].full_name, "");
        assert_eq!(batch[0].email, "");
        assert!(batch[0].education.is_empty());
        assert!(batch[0].original_data.is_null());
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            parse_batch(r#"{ "items": [] }"#),
            Err(IngestError::MissingResumes)
        ));
        assert!(matches!(
            parse_batch(r#"{ "resumes": [] }"#),
            Err(IngestError::EmptyBatch)
        ));
        assert!(matches!(
            parse_batch("not json"),
            Err(IngestError::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "resumes": [ {{ "cv_json": {{ "fullName": "A" }} }}, {{ "cv_json": {{ "fullName": "B" }} }} ] }}"#
        )
        .unwrap();

        let batch = load_batch_file(file.path()).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].full_name, "B");
    }
}
