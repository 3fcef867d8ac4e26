//! OCR 提取服务 - 业务能力层
//!
//! 只负责"把一份评分表 PDF 变成结构化评分数据"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 调用视觉模型
//! - 支持自定义 API 端点和模型（兼容 OpenAI API 的服务，如 Gemini）
//! - PDF 以 base64 data URL 形式随提示词上传

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, OcrError};
use crate::models::sheet::{DocumentResult, SheetData};

/// 完整模式提示词：提取顺序、学号、姓名、评分
const FULL_EXTRACTION_PROMPT: &str = r#"请仔细分析这份评分表，并提取以下资讯：

1. 评分表的结构（有多少位学生需要被评分）
2. 每位学生的资讯，包括：
   - 报告顺序（编号）
   - 学号
   - 姓名
   - 手写评分（1-10分）

请以 JSON 格式输出，格式如下：
```json
{
  "total_students": 总学生数,
  "scores": [
    {
      "order": 报告顺序数字,
      "student_id": "学号",
      "name": "姓名",
      "score": 评分数字或null
    }
  ]
}
```

注意事项：
- 请特别留意手写数字的辨识，评分范围应该在 1-10 之间
- 如果某个评分框是空白或无法辨识，请将 score 设为 null
- 请确保学号和姓名的准确性
- 只输出 JSON，不要有其他说明文字
- order 和 score 应为数字类型（如果有值的话）"#;

/// 隐私模式提示词：只提取序号和评分，不抄录任何个人资料
const PRIVACY_EXTRACTION_PROMPT: &str = r#"You are an OCR assistant. This is a grading sheet.

Please extract only the scoring information from the table:
- order: the sequence number on the left side of each row
- score: the handwritten score on the right side of each row, should be 1-10

The sheet may have two columns of students. The left column typically has students 1-18, and the right column has students 19 and beyond (could be up to 36, 37, or more depending on the class size).

Return the data as JSON:
{
  "total_students": <actual count>,
  "scores": [
    {"order": 1, "score": 6},
    {"order": 2, "score": 7},
    ...
  ]
}

IMPORTANT:
- Only extract the ORDER NUMBER and SCORE
- Do NOT transcribe student IDs, names, or any other personal information
- If a score is unclear, use null
- Count ALL students visible in the table, including any beyond row 36
- Output ONLY valid JSON, no explanations"#;

/// OCR 提取服务
///
/// 职责：
/// - 上传单份评分表并调用视觉模型
/// - 清理响应并解析为 SheetData
/// - 失败封装进 DocumentResult，从不向上抛出
#[derive(Clone)]
pub struct OcrService {
    client: Client<OpenAIConfig>,
    model_name: String,
    privacy_mode: bool,
}

impl OcrService {
    /// 创建新的 OCR 提取服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            privacy_mode: config.privacy_mode,
        }
    }

    /// 从单份 PDF 提取评分数据
    ///
    /// 任何一步失败都只影响这一份评分表：
    /// 错误被封装进返回的 `DocumentResult`，批次继续
    pub async fn extract_from_pdf(&self, pdf_path: &Path) -> DocumentResult {
        let file_name = pdf_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| pdf_path.display().to_string());

        info!("开始处理: {}", file_name);

        let pdf_bytes = match fs::read(pdf_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = AppError::file_read_failed(pdf_path.display().to_string(), e);
                warn!("✗ {} - {}", file_name, error);
                return DocumentResult::failure(file_name, error.to_string());
            }
        };

        let response_text = match self.request_extraction(&pdf_bytes).await {
            Ok(text) => text,
            Err(e) => {
                warn!("✗ {} - {}", file_name, e);
                return DocumentResult::failure(file_name, e.to_string());
            }
        };

        match parse_sheet_response(&response_text) {
            Ok(data) => {
                info!("✓ 成功辨识 {}，评分记录数: {}", file_name, data.scores.len());
                DocumentResult::success(file_name, data)
            }
            Err(e) => {
                warn!("✗ {} - {}", file_name, e);
                debug!("原始响应: {}", crate::utils::logging::truncate_text(&response_text, 200));
                DocumentResult::failure_with_raw(file_name, e.to_string(), response_text)
            }
        }
    }

    /// 调用视觉模型，返回原始响应文本
    async fn request_extraction(&self, pdf_bytes: &[u8]) -> Result<String> {
        debug!("调用视觉模型，模型: {}", self.model_name);
        debug!("PDF 大小: {} bytes", pdf_bytes.len());

        let prompt = if self.privacy_mode {
            PRIVACY_EXTRACTION_PROMPT
        } else {
            FULL_EXTRACTION_PROMPT
        };

        // PDF 以 data URL 形式作为图片部分上传
        let data_url = format!("data:application/pdf;base64,{}", STANDARD.encode(pdf_bytes));

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content("你是一个精确的评分表 OCR 助手，只输出 JSON。")
            .build()?;

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url,
                        detail: Some(ImageDetail::High),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.0)
            .max_tokens(4096u32)
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::ocr_api_failed(&self.model_name, e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Ocr(OcrError::EmptyResponse {
                    model: self.model_name.clone(),
                })
            })?;

        debug!("收到响应，长度: {} 字符", content.len());

        Ok(content.trim().to_string())
    }
}

/// 清理模型响应并解析为 SheetData
///
/// 模型即便被要求只输出 JSON，也经常包上 markdown 代码块，
/// 先剥掉围栏再解析
pub fn parse_sheet_response(text: &str) -> Result<SheetData> {
    let fence = Regex::new(r"```(?:json)?\s*([\s\S]*?)```")?;

    let json_body = fence
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| text.trim());

    let data: SheetData = serde_json::from_str(json_body)
        .map_err(AppError::from)
        .context("无法解析模型返回的评分 JSON")?;

    Ok(data)
}

/// 将 OCR 原始结果保存为 JSON 文件，便于排查与重放
pub async fn save_results_json(results: &[DocumentResult], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;

    fs::write(output_path, json)
        .await
        .map_err(|e| AppError::file_write_failed(output_path.display().to_string(), e))?;

    info!("OCR 原始结果已保存至: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json() {
        let text = "```json\n{\"total_students\": 2, \"scores\": [{\"order\": 1, \"score\": 8}, {\"order\": 2, \"score\": null}]}\n```";
        let data = parse_sheet_response(text).unwrap();

        assert_eq!(data.total_students, Some(2));
        assert_eq!(data.scores.len(), 2);
        assert_eq!(data.scores[0].score, Some(8.0));
        assert_eq!(data.scores[1].score, None);
    }

    #[test]
    fn test_parse_bare_fence() {
        let text = "```\n{\"scores\": [{\"order\": 3, \"student_id\": \"B1003\", \"name\": \"李四\", \"score\": 7}]}\n```";
        let data = parse_sheet_response(text).unwrap();

        assert_eq!(data.scores[0].student_id.as_deref(), Some("B1003"));
        assert_eq!(data.scores[0].name.as_deref(), Some("李四"));
    }

    #[test]
    fn test_parse_plain_json() {
        let text = "{\"total_students\": 1, \"scores\": [{\"order\": 1, \"score\": 9.5}]}";
        let data = parse_sheet_response(text).unwrap();
        assert_eq!(data.scores[0].score, Some(9.5));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_sheet_response("抱歉，我无法辨识这张图片。").is_err());
    }

    /// 测试真实视觉模型调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_extract_real_pdf -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_extract_real_pdf() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let service = OcrService::new(&config);

        let pdf_path = Path::new("sheets/期中报告_30-1-1.pdf");
        let result = service.extract_from_pdf(pdf_path).await;

        println!("\n========== 测试结果 ==========");
        println!("成功: {}", result.success);
        if let Some(data) = &result.data {
            println!("评分记录数: {}", data.scores.len());
        } else {
            println!("错误: {:?}", result.error);
        }
        assert!(result.success);
    }
}
