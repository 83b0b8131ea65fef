use anyhow::Result;
use candidate_onboard::utils::logging;
use candidate_onboard::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let mut config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 命令行第一个参数可覆盖批次文件
    if let Some(input_file) = std::env::args().nth(1) {
        config.input_file = input_file;
    }

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    app.run().await?;
    app.finish().await?;

    Ok(())
}
