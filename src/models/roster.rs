use crate::error::AppError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// 花名册中的一位学生
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterStudent {
    pub order: i64,
    pub student_id: String,
    pub name: String,
}

/// 原始学生花名册（封闭世界：合并时只接受名册内的学号）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub students: Vec<RosterStudent>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// 从 TOML 文件加载花名册
///
/// 格式：
/// ```toml
/// [[students]]
/// order = 1
/// student_id = "B1234567"
/// name = "王小明"
/// ```
pub async fn load_roster(roster_path: &Path) -> Result<Roster> {
    if !roster_path.exists() {
        anyhow::bail!(AppError::File(crate::error::FileError::NotFound {
            path: roster_path.display().to_string(),
        }));
    }

    let content = fs::read_to_string(roster_path)
        .await
        .with_context(|| format!("无法读取花名册文件: {}", roster_path.display()))?;

    let roster: Roster = toml::from_str(&content)
        .with_context(|| format!("无法解析花名册文件: {}", roster_path.display()))?;

    tracing::info!("✓ 已加载花名册: {} 位学生", roster.len());

    Ok(roster)
}
