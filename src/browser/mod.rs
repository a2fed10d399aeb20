//! 浏览器获取：连接已有调试端口，或启动无头实例

pub mod connection;
pub mod headless;

use chromiumoxide::Browser;

use crate::config::RenderConfig;
use crate::error::RenderError;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 按配置获取浏览器：配置了调试端口就连接，否则启动无头浏览器
pub async fn open_browser(config: &RenderConfig) -> Result<Browser, RenderError> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config.chrome_executable.as_deref()).await,
    }
}
