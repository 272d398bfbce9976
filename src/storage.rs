//! 本地存储封装模块
//!
//! 按浏览器 LocalStorage 的语义抽象出 `KeyValueStore`：
//! 同步读写、字符串键值、失败不抛错只返回结果标记。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::warn;

/// 持久化键值存储
pub trait KeyValueStore {
    /// 获取存储的字符串值
    ///
    /// # 返回
    /// - `Some(String)` 如果键存在且有值
    /// - `None` 如果键不存在或发生错误
    fn get(&self, key: &str) -> Option<String>;

    /// 设置存储值
    ///
    /// # 返回
    /// - `true` 如果操作成功
    /// - `false` 如果操作失败
    fn set(&self, key: &str, value: &str) -> bool;

    /// 删除存储的键值对
    fn delete(&self, key: &str) -> bool;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> bool {
        (**self).delete(key)
    }
}

// =========================================================
// 内存实现
// =========================================================

/// 进程内存储，不跨进程保留
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.borrow_mut().remove(key);
        true
    }
}

// =========================================================
// 文件实现
// =========================================================

/// 以单个 JSON 文件持久化的存储，重启后仍然保留
///
/// 每次写入都会完整落盘（先写临时文件再 rename）。
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStorage {
    /// 打开存储文件；文件不存在或内容损坏时从空存储开始
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries: RefCell::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> bool {
        let text = match serde_json::to_string_pretty(entries) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to serialize storage");
                return false;
            }
        };
        let tmp = self.path.with_extension("tmp");
        let result = fs::write(&tmp, text).and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to write storage file");
            return false;
        }
        true
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        let mut entries = self.entries.borrow_mut();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.remove(key).is_none() {
            return true;
        }
        self.flush(&entries)
    }
}
