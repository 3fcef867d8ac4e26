//! 稳健评分 - 核心层
//!
//! 去除前后各 10% 极端值后取平均，再乘以 10 得到最终成绩。
//!
//! 舍入规则：银行家舍入（round half to even，`f64::round_ties_even`），
//! 保证半分处的结果可复现。
//!
//! 本模块只接受已过滤的有效分数：None（空白 / 无法辨识）
//! 必须由调用方在进入本模块之前剔除，缺席不等于 0 分。

use crate::models::sheet::StudentRecord;
use serde::Serialize;

/// 默认去除比例（前后各 10%）
pub const DEFAULT_TRIM_FRACTION: f64 = 0.10;

/// 一位学生的最终成绩（派生值，不存储）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalScore {
    pub order: Option<i64>,
    pub student_id: String,
    /// 参与计算的有效评分数
    pub score_count: usize,
    pub trimmed_mean: f64,
    /// 最终成绩 = round(trimmed_mean × 10)
    pub final_score: i64,
}

/// 计算去除前后极端值的平均分数
///
/// 排序后从两端各去除 `floor(n × trim_fraction)` 个：
/// - 去除后为空时退回未去除的全量平均（刻意的退化输入策略，不是错误）
/// - 输入为空时结果定义为 0.0（调用方需自行区分"无评分"与"0 分"）
pub fn trimmed_mean(scores: &[f64], trim_fraction: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let trim_count = (n as f64 * trim_fraction).floor() as usize;

    let trimmed = if trim_count > 0 && n > 2 * trim_count {
        &sorted[trim_count..n - trim_count]
    } else {
        &sorted[..]
    };

    trimmed.iter().sum::<f64>() / trimmed.len() as f64
}

/// 计算最终成绩：去除极端值的平均分 × 10，银行家舍入
pub fn final_score(scores: &[f64]) -> i64 {
    (trimmed_mean(scores, DEFAULT_TRIM_FRACTION) * 10.0).round_ties_even() as i64
}

/// 为快照中的每位学生计算最终成绩
///
/// None 评分在此处被过滤，之后才进入均值计算；
/// 输出顺序与输入顺序一致（排序是快照的职责）
pub fn compute_final_scores(records: &[StudentRecord]) -> Vec<FinalScore> {
    records
        .iter()
        .map(|record| {
            let scores = record.present_scores();
            let mean = trimmed_mean(&scores, DEFAULT_TRIM_FRACTION);
            FinalScore {
                order: record.order,
                student_id: record.student_id.clone(),
                score_count: scores.len(),
                trimmed_mean: mean,
                final_score: (mean * 10.0).round_ties_even() as i64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(trimmed_mean(&[], DEFAULT_TRIM_FRACTION), 0.0);
        assert_eq!(final_score(&[]), 0);
    }

    #[test]
    fn test_small_input_trims_nothing() {
        // n = 3, trim_count = floor(0.3) = 0 → 全量平均
        assert_eq!(trimmed_mean(&[5.0, 6.0, 7.0], DEFAULT_TRIM_FRACTION), 6.0);
    }

    #[test]
    fn test_ten_values_trim_one_each_side() {
        let scores = [7.0; 10];
        assert_eq!(trimmed_mean(&scores, DEFAULT_TRIM_FRACTION), 7.0);
        assert_eq!(final_score(&scores), 70);
    }

    #[test]
    fn test_trim_removes_extremes() {
        // 10 个值：去除最低的 1.0 和最高的 10.0
        let scores = [1.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 10.0];
        assert_eq!(trimmed_mean(&scores, DEFAULT_TRIM_FRACTION), 7.0);
    }

    #[test]
    fn test_degenerate_trim_falls_back_to_untrimmed() {
        // trim_fraction = 0.5 时 n = 4 会被全部去除 → 退回全量平均
        let scores = [2.0, 4.0, 6.0, 8.0];
        assert_eq!(trimmed_mean(&scores, 0.5), 5.0);
    }

    #[test]
    fn test_result_bounded_by_min_and_max() {
        let cases: Vec<Vec<f64>> = vec![
            vec![3.0],
            vec![1.0, 10.0],
            vec![2.0, 5.0, 5.0, 9.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
            vec![6.5, 7.5, 8.0, 8.0, 9.0, 4.0, 5.5, 7.0, 7.0, 7.0, 6.0],
        ];

        for scores in cases {
            let mean = trimmed_mean(&scores, DEFAULT_TRIM_FRACTION);
            let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(mean >= min && mean <= max, "均值 {} 越界 [{}, {}]", mean, min, max);
        }
    }

    #[test]
    fn test_half_point_rounds_to_even() {
        // 平均 7.25 → 72.5 → 银行家舍入取偶数 72
        assert_eq!(final_score(&[6.0, 7.0, 8.0, 8.0]), 72);
        // 平均 7.75 → 77.5 → 78
        assert_eq!(final_score(&[7.0, 8.0, 8.0, 8.0]), 78);
    }

    #[test]
    fn test_non_half_rounding() {
        // 平均 (5+6+7)/3 = 6.0 → 60
        assert_eq!(final_score(&[5.0, 6.0, 7.0]), 60);
        // 平均 (7+8)/2 = 7.5 → 75（精确值，不是半分舍入点）
        assert_eq!(final_score(&[7.0, 8.0]), 75);
    }

    #[test]
    fn test_compute_final_scores_filters_missing() {
        let mut record = StudentRecord::new("B1001");
        record.order = Some(1);
        record.scores = vec![Some(8.0), None, Some(6.0)];

        let finals = compute_final_scores(&[record]);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].score_count, 2);
        assert_eq!(finals[0].trimmed_mean, 7.0);
        assert_eq!(finals[0].final_score, 70);
    }

    #[test]
    fn test_compute_final_scores_no_scores_is_zero() {
        let record = StudentRecord::new("B1001");
        let finals = compute_final_scores(&[record]);
        assert_eq!(finals[0].score_count, 0);
        assert_eq!(finals[0].final_score, 0);
    }
}
