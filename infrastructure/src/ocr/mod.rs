//! OCR adapters implementing [`TextExtractor`](mcq_application::TextExtractor)

pub mod ocr_space;

pub use ocr_space::OcrSpaceExtractor;
