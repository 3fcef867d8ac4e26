use serde::{Deserialize, Serialize};

/// 一条评分记录：一位评分人对一位学生在一份评分表上的评分
///
/// 隐私模式下只有 `order` 和 `score`，学号姓名均为 None
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreObservation {
    /// 报告顺序（评分表内唯一，跨表对同一学生重复）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 手写评分（1-10），空白或无法辨识时为 None
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
}

impl Default for ScoreObservation {
    fn default() -> Self {
        Self {
            order: None,
            student_id: None,
            name: None,
            score: None,
        }
    }
}

// Helper function to deserialize score as either integer, float or null
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or null representing a score")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(ScoreVisitor)
        }
    }

    deserializer.deserialize_option(ScoreVisitor)
}

/// 一份评分表经 OCR 提取后的结构化数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_students: Option<usize>,

    #[serde(default)]
    pub scores: Vec<ScoreObservation>,
}

/// 单份评分表的处理结果：成功（带数据）或失败（带原因）
///
/// 失败的评分表不会中止批次，由聚合层整体跳过
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub file_name: String,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SheetData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 解析失败时保留的原始响应，便于排查
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl DocumentResult {
    /// 创建成功结果
    pub fn success(file_name: impl Into<String>, data: SheetData) -> Self {
        Self {
            file_name: file_name.into(),
            success: true,
            data: Some(data),
            error: None,
            raw_response: None,
        }
    }

    /// 创建失败结果
    pub fn failure(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            raw_response: None,
        }
    }

    /// 创建保留原始响应的失败结果
    pub fn failure_with_raw(
        file_name: impl Into<String>,
        error: impl Into<String>,
        raw_response: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            raw_response: Some(raw_response.into()),
        }
    }
}

/// 聚合单元：一位学生（或隐私模式下的一个序号位）
///
/// `student_id` 与 `order` 一经确定不再变更，`scores` 只增不减，
/// 其顺序即评分表的合并顺序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub order: Option<i64>,
    pub name: Option<String>,
    pub scores: Vec<Option<f64>>,
}

impl StudentRecord {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            order: None,
            name: None,
            scores: Vec::new(),
        }
    }

    /// 过滤掉 None 之后的有效评分（缺席 ≠ 0 分）
    pub fn present_scores(&self) -> Vec<f64> {
        self.scores.iter().filter_map(|s| *s).collect()
    }
}
