// src/storage/store.rs

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// 门户的持久化键值存储（token、last_client_id 等）
pub trait PortalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// 基于单个 JSON 文件的存储实现。
/// 读取失败按空存储处理，写入失败仅打印错误，不影响当前会话。
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content = fs::read_to_string(&path).unwrap_or_else(|_| "{}".to_string());
        let cache: HashMap<String, String> = serde_json::from_str(&content).unwrap_or_default();
        Self {
            path,
            cache: Mutex::new(cache),
        }
    }

    fn flush(&self, cache: &HashMap<String, String>) {
        let content = serde_json::to_string_pretty(cache).unwrap_or_else(|_| "{}".to_string());
        if let Err(e) = fs::write(&self.path, content) {
            eprintln!("Failed to write store file {:?}: {}", self.path, e);
        }
    }
}

impl PortalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cache.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(key.to_string(), value.to_string());
        self.flush(&cache);
    }

    fn remove(&self, key: &str) {
        let mut cache = self.cache.lock().unwrap();
        cache.remove(key);
        self.flush(&cache);
    }
}

/// 纯内存存储，用于测试和一次性会话
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PortalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.lock().unwrap().remove(key);
    }
}
