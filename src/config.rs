/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 评分表 PDF 所在目录
    pub input_dir: String,
    /// 汇总评分 CSV 输出路径
    pub output_csv: String,
    /// 最终成绩 CSV 输出路径
    pub final_output_csv: String,
    /// 是否递归扫描子目录
    pub recursive_scan: bool,
    /// 是否校验 PDF 文件头
    pub validate_pdf: bool,
    /// 隐私模式：只提取序号和评分，不提取学号姓名
    pub privacy_mode: bool,
    /// 同时 OCR 的评分表数量
    pub max_concurrent_sheets: usize,
    /// 是否保存 OCR 原始结果
    pub save_ocr_results: bool,
    /// OCR 原始结果保存路径
    pub ocr_results_file: String,
    /// 花名册文件路径（可选，TOML 格式）
    pub roster_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: "sheets".to_string(),
            output_csv: "scores.csv".to_string(),
            final_output_csv: "final_scores.csv".to_string(),
            recursive_scan: false,
            validate_pdf: true,
            privacy_mode: false,
            max_concurrent_sheets: 4,
            save_ocr_results: false,
            ocr_results_file: "ocr_results.json".to_string(),
            roster_file: None,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-3-flash-preview".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_dir: std::env::var("INPUT_DIR").unwrap_or(default.input_dir),
            output_csv: std::env::var("OUTPUT_CSV").unwrap_or(default.output_csv),
            final_output_csv: std::env::var("FINAL_OUTPUT_CSV").unwrap_or(default.final_output_csv),
            recursive_scan: std::env::var("RECURSIVE_SCAN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recursive_scan),
            validate_pdf: std::env::var("VALIDATE_PDF").ok().and_then(|v| v.parse().ok()).unwrap_or(default.validate_pdf),
            privacy_mode: std::env::var("PRIVACY_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.privacy_mode),
            max_concurrent_sheets: std::env::var("MAX_CONCURRENT_SHEETS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_sheets),
            save_ocr_results: std::env::var("SAVE_OCR_RESULTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.save_ocr_results),
            ocr_results_file: std::env::var("OCR_RESULTS_FILE").unwrap_or(default.ocr_results_file),
            roster_file: std::env::var("ROSTER_FILE").ok().filter(|v| !v.is_empty()),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            // GEMINI_API_KEY 作为兼容别名
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}
