//! 结果存储 - 基础设施层
//!
//! 单个 JSON 数组文件，每次追加都在同一把锁内完成 读取 → 追加 → 整体重写。
//! 重写先写入同目录的临时文件再原子替换，进程中途崩溃不会留下半个文件。

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;

/// 追加结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// 已写入，附带写入后的记录总数
    Appended { total: usize },
    /// 文件中已有相同 index，未写入
    Duplicate,
}

/// 追加式结果文件
///
/// 文件是整个进程中唯一的共享可变资源，所有读写都经过 `lock`。
pub struct ResultStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    ///
    /// 同一个 index 在文件中最多出现一次，重复追加返回 `Duplicate`。
    pub async fn append<T: Serialize>(
        &self,
        index: u32,
        record: &T,
    ) -> Result<AppendOutcome, StoreError> {
        let value = serde_json::to_value(record)?;
        let _guard = self.lock.lock().await;

        let mut records = self.read_records().await?;
        if records.iter().any(|r| record_index(r) == Some(index)) {
            warn!("⚠️ 题目 {} 已存在于结果文件中，跳过写入", index);
            return Ok(AppendOutcome::Duplicate);
        }
        records.push(value);
        let total = records.len();

        let bytes = to_pretty_json(&records)?;
        write_atomic(self.path.clone(), bytes).await?;
        debug!("结果已写入 {} (共 {} 条)", self.path.display(), total);

        Ok(AppendOutcome::Appended { total })
    }

    /// 读取全部记录
    pub async fn load(&self) -> Result<Vec<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_records().await
    }

    /// 已写入的全部 index
    pub async fn indices(&self) -> Result<HashSet<u32>, StoreError> {
        Ok(self.load().await?.iter().filter_map(record_index).collect())
    }

    // 文件不存在视为空；内容损坏时告警并视为空
    async fn read_records(&self) -> Result<Vec<Value>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "⚠️ 结果文件 {} 无法解析，按空文件处理: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }
}

fn record_index(record: &Value) -> Option<u32> {
    record
        .get("index")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

/// 4 空格缩进，非 ASCII 字符原样输出
fn to_pretty_json(records: &[Value]) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    Ok(buf)
}

async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), StoreError> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&target, &bytes))
        .await
        .map_err(|e| StoreError::WriteFailed {
            path,
            source: std::io::Error::other(e.to_string()),
        })?
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut temp_file = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp_file.write_all(bytes).map_err(write_err)?;
    temp_file.as_file().sync_all().map_err(write_err)?;
    temp_file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
