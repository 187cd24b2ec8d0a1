//! Document rendering
//!
//! A `DocumentRenderer` turns an issued document into a downloadable file.
//! Rich renderers (PDF and the like) are injected by the embedding
//! application; `TextRenderer` is always available as the fallback.

use async_trait::async_trait;

use crate::models::InsuranceDocument;

/// File produced for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `document` into a file
    ///
    /// # Errors
    ///
    /// Any failure; callers fall back to the text rendering
    async fn render(&self, document: &InsuranceDocument) -> anyhow::Result<RenderedDocument>;
}

/// Download name used by every renderer, without extension
#[must_use]
pub fn file_stem(document: &InsuranceDocument) -> String {
    format!("وثيقة-تأمين-{}", document.document_number)
}

/// Plain-text rendering of a document
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl TextRenderer {
    #[must_use]
    pub fn render_text(document: &InsuranceDocument) -> String {
        let details = &document.details;
        let lines = [
            "وثيقة تأمين سفر".to_string(),
            format!("رقم الوثيقة: {}", document.document_number),
            format!("تاريخ الإصدار: {}", document.created_at.format("%Y-%m-%d")),
            String::new(),
            "معلومات المسافر".to_string(),
            format!("الاسم: {}", details.traveler_name),
            format!("تاريخ الميلاد: {}", details.traveler_birth_date),
            format!("الجنس: {}", details.traveler_gender),
            format!("رقم جواز السفر: {}", details.passport_number),
            String::new(),
            "معلومات الرحلة".to_string(),
            format!("بلد الوجهة: {}", details.destination),
            format!("تاريخ البداية: {}", details.start_date),
            format!("تاريخ النهاية: {}", details.end_date),
            format!("مدة السفر: {} يوم", details.duration),
            String::new(),
            "معلومات السعر".to_string(),
            format!("قيمة القسط: {} دينار عراقي", details.price),
            format!("الحالة: {}", document.status.label()),
            String::new(),
            "هذه الوثيقة صادرة إلكترونياً وهي صالحة للاستخدام".to_string(),
        ];

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[async_trait]
impl DocumentRenderer for TextRenderer {
    async fn render(&self, document: &InsuranceDocument) -> anyhow::Result<RenderedDocument> {
        Ok(RenderedDocument {
            file_name: format!("{}.txt", file_stem(document)),
            content_type: "text/plain; charset=utf-8",
            bytes: Self::render_text(document).into_bytes(),
        })
    }
}
