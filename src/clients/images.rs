use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ModelError;

/// base64 编码后的本地图片
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub data: String,
}

impl EncodedImage {
    /// `data:<mime>;base64,<data>` 形式的 URL
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// 按扩展名推断图片类型，无法识别时视为 PNG
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

pub fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// 读取并编码一张图片
pub async fn encode_image(path: &Path) -> Result<EncodedImage, ModelError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ModelError::InvalidImage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(EncodedImage {
        mime_type: mime_type_for(path),
        data: STANDARD.encode(bytes),
    })
}

/// 依次编码多张图片
pub async fn encode_images(paths: &[impl AsRef<Path>]) -> Result<Vec<EncodedImage>, ModelError> {
    let mut encoded = Vec::with_capacity(paths.len());
    for path in paths {
        encoded.push(encode_image(path.as_ref()).await?);
    }
    Ok(encoded)
}
