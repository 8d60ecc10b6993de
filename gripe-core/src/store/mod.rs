//! # Record Store
//!
//! 每条投诉记录对应一个 JSON 文件，文件名为 `<id>.json`。
//!
//! ## 目录布局
//!
//! ```text
//! flat:     <root>/<id>.json
//! sharded:  <root>/<id[0..2]>/<id>.json
//! ```
//!
//! 写路径与读路径使用同一布局。文件名只由不可变的 ID 决定，
//! 同一记录的多次保存总是覆盖同一个文件。
//!
//! ## 原子写入
//!
//! 先写入同目录下的临时文件并 `fsync`，再 `rename` 覆盖目标文件，
//! 读者不会看到写了一半的记录。
//!
//! 本模块只负责 I/O，不包含任何缓存逻辑。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use walkdir::WalkDir;

use gripe_types::{validate_id, Complaint};

use crate::error::{GripeError, Result};

const RECORD_EXTENSION: &str = "json";

/// 磁盘目录布局
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLayout {
    /// 单层目录
    #[default]
    Flat,
    /// 按 ID 前两个字符分片的两层目录
    Sharded,
}

impl std::str::FromStr for StorageLayout {
    type Err = GripeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(StorageLayout::Flat),
            "sharded" => Ok(StorageLayout::Sharded),
            other => Err(GripeError::configuration(format!(
                "unknown storage layout {:?} (expected flat or sharded)",
                other
            ))),
        }
    }
}

/// 批量加载结果
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 成功解析的记录
    pub complaints: Vec<Complaint>,
    /// 因损坏或不可读而跳过的文件
    pub skipped: Vec<PathBuf>,
}

/// 基于文件的投诉记录存储
#[derive(Debug, Clone)]
pub struct ComplaintStore {
    root: PathBuf,
    layout: StorageLayout,
}

impl ComplaintStore {
    /// 打开存储目录，不存在时创建
    pub async fn open(root: impl Into<PathBuf>, layout: StorageLayout) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| GripeError::storage(&root, e))?;
        debug!(root = %root.display(), ?layout, "complaint store opened");
        Ok(Self { root, layout })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// 记录的规范文件路径
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        let file_name = format!("{}.{}", id, RECORD_EXTENSION);
        Ok(match self.layout {
            StorageLayout::Flat => self.root.join(file_name),
            StorageLayout::Sharded => {
                let shard = id.get(..2).unwrap_or(id);
                self.root.join(shard).join(file_name)
            }
        })
    }

    /// 原子写入一条记录
    ///
    /// # 返回
    /// - `PathBuf`: 最终写入的文件路径
    pub async fn write(&self, complaint: &Complaint) -> Result<PathBuf> {
        let path = self.path_for(&complaint.id)?;
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        let bytes = serde_json::to_vec_pretty(complaint)?;

        if self.layout == StorageLayout::Sharded {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| GripeError::storage(&dir, e))?;
        }

        let tmp = dir.join(format!(".{}.{}.tmp", complaint.id, uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_synced(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(GripeError::storage(&tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(GripeError::storage(&path, e));
        }

        debug!(id = %complaint.id, path = %path.display(), bytes = bytes.len(), "complaint written");
        Ok(path)
    }

    /// 读取单条记录
    pub async fn read(&self, id: &str) -> Result<Complaint> {
        let path = self.path_for(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GripeError::not_found(format!("complaint {}", id)));
            }
            Err(e) => return Err(GripeError::storage(&path, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// 记录文件是否存在
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| GripeError::storage(&path, e))
    }

    /// 读取全部记录
    ///
    /// 单个损坏或不可读的文件只记录警告并跳过；根目录不可读则返回错误。
    pub async fn load_all(&self) -> Result<LoadReport> {
        let root = self.root.clone();
        let max_depth = match self.layout {
            StorageLayout::Flat => 1,
            StorageLayout::Sharded => 2,
        };

        tokio::task::spawn_blocking(move || load_dir(&root, max_depth)).await?
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

fn is_record_file(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| !n.starts_with('.'))
        .unwrap_or(false);
    visible && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
}

fn load_dir(root: &Path, max_depth: usize) -> Result<LoadReport> {
    let meta = std::fs::metadata(root).map_err(|e| GripeError::storage(root, e))?;
    if !meta.is_dir() {
        return Err(GripeError::storage(
            root,
            std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
        ));
    }

    let mut report = LoadReport::default();
    for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                if let Some(p) = e.path() {
                    report.skipped.push(p.to_path_buf());
                }
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_record_file(entry.path()) {
            continue;
        }

        let path = entry.path();
        let parsed = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                serde_json::from_slice::<Complaint>(&bytes).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(c) => report.complaints.push(c),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping corrupt complaint file");
                report.skipped.push(path.to_path_buf());
            }
        }
    }

    debug!(
        root = %root.display(),
        loaded = report.complaints.len(),
        skipped = report.skipped.len(),
        "complaint files loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gripe_types::{NewComplaint, Severity};
    use tempfile::TempDir;

    fn complaint(task: &str) -> Complaint {
        Complaint::create(NewComplaint {
            task_description: task.to_string(),
            severity: Severity::Low,
            ..Default::default()
        })
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(dir)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path(), StorageLayout::Flat).await.unwrap();
        let c = complaint("write me");

        let path = store.write(&c).await.unwrap();
        assert_eq!(path, dir.path().join(format!("{}.json", c.id)));
        assert_eq!(store.read(&c.id).await.unwrap(), c);
        assert!(store.exists(&c.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rewrite_leaves_single_file_and_no_temp() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path(), StorageLayout::Flat).await.unwrap();
        let mut c = complaint("v1");
        for i in 0..5 {
            c.context = format!("revision {}", i);
            store.write(&c).await.unwrap();
        }
        assert_eq!(file_names(dir.path()), vec![format!("{}.json", c.id)]);
        assert_eq!(store.read(&c.id).await.unwrap().context, "revision 4");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path(), StorageLayout::Flat).await.unwrap();
        let err = store.read("does-not-exist").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unsafe_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path(), StorageLayout::Flat).await.unwrap();
        let mut c = complaint("escape");
        c.id = "../outside".to_string();
        assert!(matches!(store.write(&c).await, Err(GripeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sharded_layout_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path(), StorageLayout::Sharded).await.unwrap();
        let c = complaint("sharded");

        let path = store.write(&c).await.unwrap();
        assert_eq!(path, dir.path().join(&c.id[..2]).join(format!("{}.json", c.id)));

        let report = store.load_all().await.unwrap();
        assert_eq!(report.complaints, vec![c]);
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path(), StorageLayout::Flat).await.unwrap();
        store.write(&complaint("a")).await.unwrap();
        store.write(&complaint("b")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        std::fs::write(dir.path().join(".half.tmp"), b"{").unwrap();

        let report = store.load_all().await.unwrap();
        assert_eq!(report.complaints.len(), 2);
        assert_eq!(report.skipped, vec![dir.path().join("broken.json")]);
    }

    #[tokio::test]
    async fn test_load_all_on_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let store = ComplaintStore::open(dir.path().join("gone"), StorageLayout::Flat)
            .await
            .unwrap();
        std::fs::remove_dir(dir.path().join("gone")).unwrap();
        assert!(matches!(store.load_all().await, Err(GripeError::Storage { .. })));
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("Sharded".parse::<StorageLayout>().unwrap(), StorageLayout::Sharded);
        assert!("nested".parse::<StorageLayout>().is_err());
    }
}
