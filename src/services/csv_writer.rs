//! CSV 输出服务 - 业务能力层
//!
//! 只负责"把汇总数据写成矩形 CSV"能力，不做排序（排序是快照的职责）

use crate::aggregator::scoring::FinalScore;
use crate::error::AppError;
use crate::models::sheet::StudentRecord;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// UTF-8 BOM，Excel 打开含中文表头的 CSV 需要它
const UTF8_BOM: &str = "\u{feff}";

/// CSV 文件写入器
pub struct CsvWriter {
    output_path: PathBuf,
}

impl CsvWriter {
    /// 创建新的 CSV 写入器
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// 写入汇总评分表
    ///
    /// 列结构：`报告顺序, 学号, 姓名, 评分1..评分N`，
    /// N 取所有学生中评分数的最大值；不足的行补空串，
    /// None 评分渲染为空串（区别于 0 分）。
    ///
    /// # 返回
    /// 数据为空时不写任何内容并返回 `Ok(false)`，由调用方决定如何提示
    pub async fn write_scores(&self, data: &[StudentRecord]) -> Result<bool> {
        if data.is_empty() {
            warn!("数据为空，无法写入 CSV");
            return Ok(false);
        }

        // 计算最大评分数（用于决定列数）
        let max_scores = data
            .iter()
            .map(|student| student.scores.len())
            .max()
            .unwrap_or(0);

        let mut lines = Vec::with_capacity(data.len() + 1);

        let mut headers = vec![
            "报告顺序".to_string(),
            "学号".to_string(),
            "姓名".to_string(),
        ];
        headers.extend((1..=max_scores).map(|i| format!("评分{}", i)));
        lines.push(headers.join(","));

        for student in data {
            let mut row = vec![
                student.order.map(|o| o.to_string()).unwrap_or_default(),
                student.student_id.clone(),
                student.name.clone().unwrap_or_default(),
            ];

            row.extend(student.scores.iter().map(|score| format_score(*score)));

            // 评分数不足 max_scores 的行补空串，保证所有行列数一致
            row.extend(std::iter::repeat(String::new()).take(max_scores - student.scores.len()));

            lines.push(row.join(","));
        }

        self.write_lines(&lines).await?;

        info!(
            "✓ 成功写入 CSV: {} (学生数: {}, 评分列数: {})",
            self.output_path.display(),
            data.len(),
            max_scores
        );

        Ok(true)
    }

    /// 写入最终成绩表
    ///
    /// 列结构：`顺序, 成绩`
    pub async fn write_final_scores(&self, data: &[FinalScore]) -> Result<bool> {
        if data.is_empty() {
            warn!("最终成绩为空，无法写入 CSV");
            return Ok(false);
        }

        let mut lines = Vec::with_capacity(data.len() + 1);
        lines.push("顺序,成绩".to_string());

        for entry in data {
            lines.push(format!(
                "{},{}",
                entry.order.map(|o| o.to_string()).unwrap_or_default(),
                entry.final_score
            ));
        }

        self.write_lines(&lines).await?;

        info!(
            "✓ 成功写入最终成绩: {} ({} 位学生)",
            self.output_path.display(),
            data.len()
        );

        Ok(true)
    }

    async fn write_lines(&self, lines: &[String]) -> Result<()> {
        let content = format!("{}{}\n", UTF8_BOM, lines.join("\n"));

        fs::write(&self.output_path, content)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_path.display().to_string(), e))?;

        Ok(())
    }
}

/// 评分渲染：整数分去掉小数点，None 渲染为空串
fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) if value.fract() == 0.0 => format!("{}", value as i64),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, order: i64, name: Option<&str>, scores: Vec<Option<f64>>) -> StudentRecord {
        StudentRecord {
            student_id: id.to_string(),
            order: Some(order),
            name: name.map(|n| n.to_string()),
            scores,
        }
    }

    #[tokio::test]
    async fn test_rows_padded_to_equal_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let writer = CsvWriter::new(&path);

        let data = vec![
            record("B1", 1, Some("王小明"), vec![Some(8.0), Some(7.0), Some(9.0)]),
            record("B2", 2, Some("李四"), vec![Some(6.0)]),
        ];

        assert!(writer.write_scores(&data).await.unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.trim_start_matches(UTF8_BOM).trim_end().lines().collect();

        assert_eq!(lines[0], "报告顺序,学号,姓名,评分1,评分2,评分3");
        assert_eq!(lines[1], "1,B1,王小明,8,7,9");
        // 第二位学生只有 1 份评分，后两列补空
        assert_eq!(lines[2], "2,B2,李四,6,,");

        // 所有行列数一致
        for line in &lines {
            assert_eq!(line.matches(',').count(), 5);
        }
    }

    #[tokio::test]
    async fn test_null_score_is_empty_cell_not_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let writer = CsvWriter::new(&path);

        let data = vec![record("B1", 1, None, vec![Some(0.0), None])];
        writer.write_scores(&data).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.trim_start_matches(UTF8_BOM).trim_end().lines().collect();

        // 0 分与空白必须可区分
        assert_eq!(lines[1], "1,B1,,0,");
    }

    #[tokio::test]
    async fn test_empty_data_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let writer = CsvWriter::new(&path);

        let written = writer.write_scores(&[]).await.unwrap();

        assert!(!written);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_final_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.csv");
        let writer = CsvWriter::new(&path);

        let data = vec![
            FinalScore {
                order: Some(1),
                student_id: "B1".to_string(),
                score_count: 10,
                trimmed_mean: 7.0,
                final_score: 70,
            },
            FinalScore {
                order: Some(2),
                student_id: "B2".to_string(),
                score_count: 8,
                trimmed_mean: 8.5,
                final_score: 85,
            },
        ];

        assert!(writer.write_final_scores(&data).await.unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.trim_start_matches(UTF8_BOM).trim_end().lines().collect();
        assert_eq!(lines, vec!["顺序,成绩", "1,70", "2,85"]);
    }
}
