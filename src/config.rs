use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 远端接口 ---
    /// 求职者注册接口
    pub register_url: String,
    /// 文档上传接口
    pub upload_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 批处理 ---
    /// 两条记录之间的间隔（毫秒）
    pub pacing_interval_ms: u64,
    /// 批次 JSON 文件
    pub input_file: String,
    /// 进度事件通道容量
    pub progress_channel_capacity: usize,
    // --- 上传文档 ---
    pub document_type: String,
    pub document_mime_type: String,
    pub batch_document_extension: String,
    pub single_document_extension: String,
    // --- 日志与输出 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败记录文件
    pub failure_log_file: String,
    /// 最终报告文件
    pub report_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            register_url: "https://jtestlabs.com/api/user/jobseeker/register".to_string(),
            upload_url: "https://jtestlabs.com/api/matching/jobseeker/documents/upload"
                .to_string(),
            request_timeout_secs: 30,
            pacing_interval_ms: 500,
            input_file: "resumes.json".to_string(),
            progress_channel_capacity: 256,
            document_type: "resume".to_string(),
            document_mime_type: "application/json".to_string(),
            batch_document_extension: "pdf".to_string(),
            single_document_extension: "json".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            failure_log_file: "failed.txt".to_string(),
            report_file: "report.json".to_string(),
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，未写出的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 按顺序加载：`ONBOARD_CONFIG` 指定的文件（或当前目录的 `onboard.toml`），再叠加环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("ONBOARD_CONFIG").ok().or_else(|| {
            Path::new("onboard.toml")
                .exists()
                .then(|| "onboard.toml".to_string())
        });

        let base = match file {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            register_url: env_or("REGISTER_URL", self.register_url),
            upload_url: env_or("UPLOAD_URL", self.upload_url),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?,
            pacing_interval_ms: env_parse("PACING_INTERVAL_MS", self.pacing_interval_ms)?,
            input_file: env_or("INPUT_FILE", self.input_file),
            progress_channel_capacity: env_parse(
                "PROGRESS_CHANNEL_CAPACITY",
                self.progress_channel_capacity,
            )?,
            document_type: env_or("DOCUMENT_TYPE", self.document_type),
            document_mime_type: env_or("DOCUMENT_MIME_TYPE", self.document_mime_type),
            batch_document_extension: env_or(
                "BATCH_DOCUMENT_EXTENSION",
                self.batch_document_extension,
            ),
            single_document_extension: env_or(
                "SINGLE_DOCUMENT_EXTENSION",
                self.single_document_extension,
            ),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
            output_log_file: env_or("OUTPUT_LOG_FILE", self.output_log_file),
            failure_log_file: env_or("FAILURE_LOG_FILE", self.failure_log_file),
            report_file: env_or("REPORT_FILE", self.report_file),
        })
    }

    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_original_pacing() {
        let config = Config::default();
        assert_eq!(config.pacing_interval(), Duration::from_millis(500));
        assert_eq!(config.document_type, "resume");
        assert_eq!(config.document_mime_type, "application/json");
    }

    #[test]
    fn toml_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "register_url = \"http://localhost:9000/register\"\npacing_interval_ms = 50"
        )
        .unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.register_url, "http://localhost:9000/register");
        assert_eq!(config.pacing_interval_ms, 50);
        assert_eq!(config.upload_url, Config::default().upload_url);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pacing_interval_ms = \"soon\"").unwrap();

        let err = Config::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseFailed { .. }));
    }
}
