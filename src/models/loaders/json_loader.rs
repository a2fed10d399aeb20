use crate::models::problem::ProblemItem;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 从 JSON 数组文件加载全部题目
///
/// 按 `index` 去重，重复出现的题目只保留第一条
pub async fn load_dataset(path: &Path) -> Result<Vec<ProblemItem>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取数据集: {}", path.display()))?;

    let items: Vec<ProblemItem> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析数据集: {}", path.display()))?;

    let total = items.len();
    let items = dedup_by_index(items);
    if items.len() < total {
        tracing::warn!(
            "数据集中有 {} 条重复 index 的题目已被忽略",
            total - items.len()
        );
    }
    tracing::info!("成功加载 {} 道题目", items.len());

    Ok(items)
}

/// 读取已有结果文件中的全部 index
pub async fn load_completed_indices(path: &Path) -> Result<HashSet<u32>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取续跑文件: {}", path.display()))?;

    let records: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析续跑文件: {}", path.display()))?;

    let indices = records
        .iter()
        .filter_map(|r| r.get("index").and_then(|v| v.as_u64()))
        .filter_map(|v| u32::try_from(v).ok())
        .collect();

    Ok(indices)
}

/// 断点续跑：剔除已经完成的题目
pub fn filter_pending(items: Vec<ProblemItem>, completed: &HashSet<u32>) -> Vec<ProblemItem> {
    items
        .into_iter()
        .filter(|item| !completed.contains(&item.index))
        .collect()
}

fn dedup_by_index(items: Vec<ProblemItem>) -> Vec<ProblemItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_json(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_dataset_dedups_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "final_set.json",
            r#"[
                {"index": 1, "question": "a", "subject": "CM", "level": 1, "language": "English"},
                {"index": 2, "question": "b", "subject": "EM", "level": 2, "language": "Chinese"},
                {"index": 1, "question": "dup", "subject": "CM", "level": 1, "language": "English"}
            ]"#,
        );

        let items = load_dataset(&path).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].question, "a");
    }

    #[tokio::test]
    async fn test_resume_filters_completed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "results.json",
            r#"[{"index": 1, "prediction": "x"}, {"index": 3, "prediction": "y"}]"#,
        );
        let completed = load_completed_indices(&path).await.unwrap();
        assert_eq!(completed, HashSet::from([1, 3]));

        let items: Vec<ProblemItem> = (1..=4)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "index": i, "question": "q", "subject": "CM",
                    "level": 1, "language": "English"
                }))
                .unwrap()
            })
            .collect();
        let pending: Vec<u32> = filter_pending(items, &completed)
            .iter()
            .map(|i| i.index)
            .collect();
        assert_eq!(pending, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dataset(&dir.path().join("nope.json")).await.is_err());
    }
}
