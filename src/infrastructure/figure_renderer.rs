//! 图像渲染 - 基础设施层
//!
//! 把 HTML 代码交给浏览器渲染成 PNG。优先截取 `canvas`/`svg` 元素，
//! 找不到或截取失败时截取整页。

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::RenderError;

/// 等待页面脚本完成绘制的时间
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// HTML → PNG 渲染能力
#[async_trait]
pub trait FigureRenderer: Send + Sync {
    /// 渲染 `html` 并保存到 `output`，返回实际写入的路径
    async fn render(&self, html: &str, output: &Path) -> Result<PathBuf, RenderError>;
}

/// 基于 Chromium 的渲染器
///
/// 持有一个浏览器实例，每次渲染新开一个页面，用完关闭。
pub struct ChromeRenderer {
    browser: Browser,
}

impl ChromeRenderer {
    pub fn new(browser: Browser) -> Self {
        Self { browser }
    }

    async fn capture(&self, page: &Page, html: &str, output: &Path) -> Result<(), RenderError> {
        page.set_content(html).await?;
        sleep(SETTLE_DELAY).await;

        match page.find_element("canvas, svg").await {
            Ok(element) => {
                match element
                    .save_screenshot(CaptureScreenshotFormat::Png, output)
                    .await
                {
                    Ok(_) => return Ok(()),
                    Err(e) => warn!("元素截图失败，改为整页截图: {}", e),
                }
            }
            Err(_) => debug!("页面中没有 canvas/svg 元素，使用整页截图"),
        }

        page.save_screenshot(ScreenshotParams::builder().full_page(true).build(), output)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FigureRenderer for ChromeRenderer {
    async fn render(&self, html: &str, output: &Path) -> Result<PathBuf, RenderError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| RenderError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let page = self.browser.new_page("about:blank").await?;
        let result = self.capture(&page, html, output).await;
        if let Err(e) = page.close().await {
            debug!("关闭渲染页面失败: {}", e);
        }
        result?;

        info!("🖼️ 已保存渲染图像: {}", output.display());
        Ok(output.to_path_buf())
    }
}
