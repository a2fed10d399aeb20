//! 从模型回复中提取 HTML 代码

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::info;

use crate::error::StoreError;

/// 提取第一个 ```` ```html ```` 代码块的内容
pub fn extract_html_code(response: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)```html\n(.*?)\n```").ok()?;
    re.captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// 保存代码到 `<dir>/<image_id>.html`
pub async fn save_html_code(dir: &Path, image_id: &str, code: &str) -> Result<PathBuf, StoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StoreError::WriteFailed {
            path: dir.to_path_buf(),
            source,
        })?;
    let path = dir.join(format!("{}.html", image_id));
    tokio::fs::write(&path, code)
        .await
        .map_err(|source| StoreError::WriteFailed {
            path: path.clone(),
            source,
        })?;
    info!("💾 已保存生成的代码: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_block() {
        let response = "Here:\n```html\n<canvas id=\"c\"></canvas>\n<script>\n</script>\n```\nand\n```html\nsecond\n```";
        assert_eq!(
            extract_html_code(response),
            Some("<canvas id=\"c\"></canvas>\n<script>\n</script>")
        );
    }

    #[test]
    fn test_no_block() {
        assert_eq!(extract_html_code("no code here"), None);
        assert_eq!(extract_html_code("```python\nprint(1)\n```"), None);
    }

    #[tokio::test]
    async fn test_save_html_code() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("html_code");
        let path = save_html_code(&out, "fig_1", "<svg/>").await.unwrap();
        assert_eq!(path, out.join("fig_1.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<svg/>");
    }
}
