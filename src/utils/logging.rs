use crate::aggregator::score_book::Statistics;
/// 日志工具模块
///
/// 提供流程横幅和统计输出的辅助函数
use crate::config::Config;
use tracing::info;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 评分表 OCR 辨识工具");
    info!("📂 输入目录: {}", config.input_dir);
    info!(
        "🔒 模式: {}",
        if config.privacy_mode {
            "隐私模式（只提取序号和评分）"
        } else {
            "完整模式（包含学号姓名）"
        }
    );
    info!("📊 OCR 并发数: {}", config.max_concurrent_sheets);
    info!("{}", "=".repeat(60));
}

/// 记录流程步骤横幅
///
/// # 参数
/// - `step`: 当前步骤编号
/// - `total`: 总步骤数
/// - `title`: 步骤标题
pub fn log_step(step: usize, total: usize, title: &str) {
    info!("\n[步骤 {}/{}] {}", step, total, title);
}

/// 记录 OCR 批次完成信息
pub fn log_ocr_complete(success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ OCR 辨识完成: 成功 {}/{}", success, total);
    info!("{}", "─".repeat(60));
}

/// 记录聚合统计信息
pub fn log_statistics(stats: &Statistics) {
    info!("  学生总数: {}", stats.total_students);
    info!("  评分表数: {}", stats.total_documents);
    info!("  平均评分数/学生: {}", stats.avg_scores_per_student);
    info!("  有完整评分的学生: {}", stats.students_with_all_scores);
}

/// 打印最终完成信息
pub fn print_final_summary(students: usize, documents: usize, output_csv: &str, final_csv: &str) {
    info!("\n{}", "=".repeat(60));
    info!("✓ 处理完成！");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("学生数: {}", students);
    info!("评分表数: {}", documents);
    info!("汇总评分: {}", output_csv);
    info!("最终成绩: {}", final_csv);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
