//! 图片与输出路径解析

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::utils::logging::timestamp;

/// 数据集中图片路径的公共前缀
const IMAGE_PREFIX: &str = "images/";

/// 把数据集中的相对路径映射到本地文件
#[derive(Debug, Clone)]
pub struct PathResolver {
    image_root: PathBuf,
    generated_html_code: PathBuf,
    html_images: PathBuf,
}

impl PathResolver {
    pub fn new(
        image_root: impl Into<PathBuf>,
        generated_html_code: impl Into<PathBuf>,
        html_images: impl Into<PathBuf>,
    ) -> Self {
        Self {
            image_root: image_root.into(),
            generated_html_code: generated_html_code.into(),
            html_images: html_images.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.data_paths.image_root,
            &config.output_paths.generated_html_code,
            &config.output_paths.html_images,
        )
    }

    /// `images/a.png` -> `<image_root>/a.png`
    pub fn resolve_image_path(&self, relative: &str) -> PathBuf {
        let trimmed = relative.strip_prefix(IMAGE_PREFIX).unwrap_or(relative);
        self.image_root.join(trimmed)
    }

    /// 图片 id（文件名第一个 `.` 之前的部分）
    pub fn image_id(relative: &str) -> String {
        Path::new(relative)
            .file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                name.split_once('.')
                    .map_or(name.as_ref(), |(id, _)| id)
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// 某张图片对应的 HTML 代码文件
    pub fn html_code_path(&self, image_id: &str) -> PathBuf {
        self.generated_html_code.join(format!("{}.html", image_id))
    }

    /// 读取图片已生成的 HTML 代码，不存在时返回空字符串
    pub async fn image_code(&self, relative: &str) -> String {
        let path = self.html_code_path(&Self::image_id(relative));
        match tokio::fs::read_to_string(&path).await {
            Ok(code) => code,
            Err(_) => {
                debug!("未找到图片代码: {}", path.display());
                String::new()
            }
        }
    }

    /// 渲染截图路径 `<html_images>/<index>/<image_id>_<timestamp>.png`
    pub fn rendered_image_path(&self, index: u32, image_id: &str) -> PathBuf {
        self.html_images
            .join(index.to_string())
            .join(format!("{}_{}.png", image_id, timestamp()))
    }

    pub fn generated_html_dir(&self) -> &Path {
        &self.generated_html_code
    }
}

/// 本次运行的结果文件路径
///
/// `<dir>/<experiment>_<时间戳>.json`，未指定实验名时前缀为 `results`
pub fn results_file_path(dir: &Path, experiment: Option<&str>) -> PathBuf {
    let prefix = experiment.filter(|s| !s.is_empty()).unwrap_or("results");
    dir.join(format!("{}_{}.json", prefix, timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(root: &Path) -> PathResolver {
        PathResolver::new(
            "data/upscaled_images",
            root.join("html_code"),
            root.join("html_images"),
        )
    }

    #[test]
    fn test_resolve_strips_images_prefix() {
        let r = resolver(Path::new("/tmp"));
        assert_eq!(
            r.resolve_image_path("images/fig_12.png"),
            PathBuf::from("data/upscaled_images/fig_12.png")
        );
        assert_eq!(
            r.resolve_image_path("other/fig_12.png"),
            PathBuf::from("data/upscaled_images/other/fig_12.png")
        );
    }

    #[test]
    fn test_image_id_cuts_at_first_dot() {
        assert_eq!(PathResolver::image_id("images/fig_12.png"), "fig_12");
        assert_eq!(PathResolver::image_id("images/a.b.png"), "a");
        assert_eq!(PathResolver::image_id("images/noext"), "noext");
    }

    #[tokio::test]
    async fn test_image_code_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());
        assert_eq!(r.image_code("images/fig_1.png").await, "");

        std::fs::create_dir_all(dir.path().join("html_code")).unwrap();
        std::fs::write(dir.path().join("html_code/fig_1.html"), "<canvas></canvas>").unwrap();
        assert_eq!(r.image_code("images/fig_1.png").await, "<canvas></canvas>");

        std::fs::write(dir.path().join("html_code/fig_2.html"), "<svg></svg>").unwrap();
        assert_eq!(r.image_code("images/fig_2.v2.png").await, "<svg></svg>");
    }

    #[test]
    fn test_results_file_path_prefix() {
        let p = results_file_path(Path::new("out"), None);
        let name = p.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("results_"));
        assert!(name.ends_with(".json"));

        let p = results_file_path(Path::new("out"), Some("exp1"));
        assert!(p.file_name().unwrap().to_string_lossy().starts_with("exp1_"));
    }

    #[test]
    fn test_rendered_path_layout() {
        let r = resolver(Path::new("/r"));
        let p = r.rendered_image_path(7, "fig");
        assert!(p.starts_with("/r/html_images/7"));
        assert!(p.file_name().unwrap().to_string_lossy().starts_with("fig_"));
    }
}
