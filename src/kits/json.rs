// src/kits/json.rs

use crate::error::{AppError, AppResult};
use anyhow::Context;
use serde_json::{Map, Value};
use std::{fs, path::Path};

fn load_object(path: &Path) -> AppResult<Map<String, Value>> {
    let content = fs::read_to_string(path).with_context(|| format!("读取 '{}' 失败", path.display()))?;
    match serde_json::from_str(&content)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::UserInputError(format!("'{}' 的顶层不是 JSON 对象", path.display()))),
    }
}

/// 顶层键对应的值
pub fn query(path: &Path, key: &str) -> AppResult<Value> {
    let mut map = load_object(path)?;
    map.remove(key)
        .ok_or_else(|| AppError::UserInputError(format!("'{}' 中没有键 '{}'", path.display(), key)))
}

/// 字符串原样输出，其余按 JSON 输出
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 用 `new` 的顶层键覆盖 `old`，写回 `old`
pub fn update(old: &Path, new: &Path) -> AppResult<Map<String, Value>> {
    let mut data = load_object(old)?;
    data.extend(load_object(new)?);
    fs::write(old, serde_json::to_string(&data)?).with_context(|| format!("写入 '{}' 失败", old.display()))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.json");
        let new = dir.path().join("new.json");
        fs::write(&old, r#"{"name":"a","n":1,"keep":true}"#).unwrap();
        fs::write(&new, r#"{"name":"b","extra":[1,2]}"#).unwrap();

        assert_eq!(display_value(&query(&old, "name").unwrap()), "a");
        assert_eq!(display_value(&query(&old, "n").unwrap()), "1");
        assert!(matches!(query(&old, "missing"), Err(AppError::UserInputError(_))));

        update(&old, &new).unwrap();
        let merged: Value = serde_json::from_str(&fs::read_to_string(&old).unwrap()).unwrap();
        assert_eq!(merged, json!({"name": "b", "n": 1, "keep": true, "extra": [1, 2]}));
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("list.json");
        fs::write(&file, "[1,2,3]").unwrap();
        assert!(matches!(query(&file, "x"), Err(AppError::UserInputError(_))));
    }
}
