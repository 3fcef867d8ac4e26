//! 批量评分表处理器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、创建 OCR 服务
//! 2. **批量扫描**：收集并校验评分表 PDF
//! 3. **并发 OCR**：使用 Semaphore 限制并发数量
//! 4. **确定性合并**：OCR 结果按文件名排序后串行合并，
//!    保证同样的输入总是得到同样的每生评分序列
//! 5. **全局统计**：汇总并输出统计信息
//! 6. **结果输出**：汇总评分 CSV + 最终成绩 CSV

use crate::aggregator::score_book::ScoreBook;
use crate::aggregator::scoring::compute_final_scores;
use crate::config::Config;
use crate::error::{AppError, ConfigError};
use crate::models::roster::load_roster;
use crate::models::sheet::DocumentResult;
use crate::services::csv_writer::CsvWriter;
use crate::services::ocr_service::{save_results_json, OcrService};
use crate::services::pdf_scanner::collect_pdf_files;
use crate::utils::logging::{
    log_ocr_complete, log_startup, log_statistics, log_step, print_final_summary,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

const TOTAL_STEPS: usize = 4;

/// 应用主结构
pub struct App {
    config: Config,
    ocr_service: OcrService,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        if config.llm_api_key.is_empty() {
            error!("错误：未设置 API Key");
            error!("请设置环境变量，例如：");
            error!("  export LLM_API_KEY='your-api-key'");
            anyhow::bail!(AppError::Config(ConfigError::MissingApiKey));
        }

        log_startup(&config);

        let ocr_service = OcrService::new(&config);

        Ok(Self {
            config,
            ocr_service,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 步骤 1: 扫描 PDF 文件
        log_step(1, TOTAL_STEPS, "扫描 PDF 文件...");
        let pdf_files = collect_pdf_files(
            &self.config.input_dir,
            self.config.recursive_scan,
            self.config.validate_pdf,
        )
        .await?;

        if pdf_files.is_empty() {
            anyhow::bail!("未找到任何 PDF 文件: {}", self.config.input_dir);
        }

        // 步骤 2: OCR 辨识
        log_step(2, TOTAL_STEPS, "OCR 辨识...");
        info!("  使用模型: {}", self.config.llm_model_name);

        let ocr_results = self.extract_all(&pdf_files).await?;

        if self.config.save_ocr_results {
            save_results_json(&ocr_results, Path::new(&self.config.ocr_results_file)).await?;
        }

        let success_count = ocr_results.iter().filter(|r| r.success).count();
        log_ocr_complete(success_count, ocr_results.len());

        if success_count == 0 {
            anyhow::bail!("所有评分表辨识都失败");
        }

        // 步骤 3: 资料汇总
        log_step(3, TOTAL_STEPS, "资料汇总...");
        let book = self.aggregate(&ocr_results).await?;

        let stats = book.statistics();
        log_statistics(&stats);

        let data = book.snapshot(true);

        // 步骤 4: 输出 CSV
        log_step(4, TOTAL_STEPS, "输出 CSV...");

        let score_writer = CsvWriter::new(&self.config.output_csv);
        if !score_writer.write_scores(&data).await? {
            anyhow::bail!("写入 CSV 失败：没有可输出的学生数据");
        }

        let final_scores = compute_final_scores(&data);
        let final_writer = CsvWriter::new(&self.config.final_output_csv);
        final_writer.write_final_scores(&final_scores).await?;

        print_final_summary(
            stats.total_students,
            stats.total_documents,
            &self.config.output_csv,
            &self.config.final_output_csv,
        );

        Ok(())
    }

    /// 并发 OCR 所有评分表
    ///
    /// 并发只影响耗时，不影响结果顺序：
    /// 返回前按文件名排序，保证核心合并顺序与输入集合一一对应
    async fn extract_all(&self, pdf_files: &[PathBuf]) -> Result<Vec<DocumentResult>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_sheets));
        let total = pdf_files.len();
        let mut handles = Vec::with_capacity(total);

        for (idx, pdf_path) in pdf_files.iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let service = self.ocr_service.clone();
            let path = pdf_path.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                info!("[{}/{}] 处理: {}", idx + 1, total, path.display());
                service.extract_from_pdf(&path).await
            });
            handles.push((pdf_path.clone(), handle));
        }

        let mut results = Vec::with_capacity(total);
        for (pdf_path, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    let file_name = pdf_path
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| pdf_path.display().to_string());
                    error!("[{}] 任务执行失败: {}", file_name, e);
                    results.push(DocumentResult::failure(file_name, format!("任务执行失败: {}", e)));
                }
            }
        }

        // 合并顺序必须确定：按文件名排序
        results.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        Ok(results)
    }

    /// 把 OCR 结果串行合并进成绩册
    async fn aggregate(&self, ocr_results: &[DocumentResult]) -> Result<ScoreBook> {
        let mut book = ScoreBook::new();

        if let Some(roster_path) = &self.config.roster_file {
            let roster = load_roster(Path::new(roster_path)).await?;
            book.load_roster(&roster)
                .context("载入花名册失败")?;
        }

        for result in ocr_results {
            let outcome = book.merge_document(result);

            if !outcome.merged {
                warn!("跳过失败的辨识结果: {}", result.file_name);
                continue;
            }

            info!(
                "加入评分表: {} (配对 {} 条, 拒绝 {} 条)",
                result.file_name, outcome.matched, outcome.unmatched
            );

            if outcome.unmatched > 0 {
                warn!(
                    "  {} 条评分记录被拒绝: {}",
                    outcome.unmatched, result.file_name
                );
            }

            // 详细日志（如果启用）：逐条列出被拒绝的记录
            if self.config.verbose_logging {
                for rejected in &outcome.rejected {
                    match &rejected.student_id {
                        Some(student_id) => {
                            warn!("  学号 {} 不在花名册中，跳过", student_id);
                        }
                        None => {
                            warn!("  一条评分记录既无学号也无序号，跳过");
                        }
                    }
                }
            }
        }

        Ok(book)
    }
}
