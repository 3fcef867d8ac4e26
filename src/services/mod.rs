pub mod csv_writer;
pub mod ocr_service;
pub mod pdf_scanner;

pub use csv_writer::CsvWriter;
pub use ocr_service::OcrService;
pub use pdf_scanner::collect_pdf_files;
