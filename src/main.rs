use std::path::PathBuf;

use anyhow::Result;
use physics_critic::config::DEFAULT_CONFIG_PATH;
use physics_critic::{App, Config, LogContext, PipelineMode};
use tracing::info;

/// 用法: physics_critic [critic|i2t] [配置文件路径]
#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mode: PipelineMode = args.next().as_deref().unwrap_or("critic").parse()?;

    // 加载配置
    let config_path = args
        .next()
        .or_else(|| std::env::var("PHYSICS_CRITIC_CONFIG").ok())
        .map(PathBuf::from);
    let config = match config_path {
        Some(path) => Config::load(&path)?,
        None if PathBuf::from(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(&PathBuf::from(DEFAULT_CONFIG_PATH))?
        }
        None => {
            let config = Config::default().with_env_overrides()?;
            config.validate()?;
            config
        }
    };

    // 初始化日志
    let log = LogContext::init(&config.logging, &config.output_paths.logs)?;

    // 初始化并运行应用
    let report = App::initialize(config, log, mode).await?.run().await?;
    info!("全部结果已保存至: {}", report.output_path.display());

    Ok(())
}
