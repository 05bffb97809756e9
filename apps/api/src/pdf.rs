//! CV text extraction from uploaded PDF bytes.

use crate::errors::AppError;

/// Extracts plain text from PDF bytes. Scanned/image-only PDFs come back
/// empty and are rejected here rather than sent to the extraction agent.
pub fn extract_cv_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::CvExtraction(format!("Failed to read PDF: {e}")))?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::CvExtraction(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}
