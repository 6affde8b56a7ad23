use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(
        rename = "urlToImage",
        alias = "imageUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    pub text: String,
}

impl TextQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub file_bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: Option<String>,
}

impl DocumentQuery {
    pub fn new(file_name: impl Into<String>, file_bytes: Vec<u8>) -> Self {
        Self {
            file_bytes,
            file_name: file_name.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationQuery {
    Text(TextQuery),
    Document(DocumentQuery),
}

impl From<TextQuery> for VerificationQuery {
    fn from(value: TextQuery) -> Self {
        Self::Text(value)
    }
}

impl From<DocumentQuery> for VerificationQuery {
    fn from(value: DocumentQuery) -> Self {
        Self::Document(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_reads_url_to_image_wire_name() {
        let article: NewsArticle = serde_json::from_str(
            r#"{"id":"1","title":"T","description":"D","urlToImage":"https://img/1.png"}"#,
        )
        .expect("decode");
        assert_eq!(article.image_url.as_deref(), Some("https://img/1.png"));
    }

    #[test]
    fn article_image_is_absent_when_missing_or_null() {
        let missing: NewsArticle =
            serde_json::from_str(r#"{"id":"1","title":"T","description":"D"}"#).expect("decode");
        let null: NewsArticle =
            serde_json::from_str(r#"{"id":"1","title":"T","description":"D","urlToImage":null}"#)
                .expect("decode");
        assert_eq!(missing.image_url, None);
        assert_eq!(null.image_url, None);
    }

    #[test]
    fn article_accepts_image_url_alias() {
        let article: NewsArticle = serde_json::from_str(
            r#"{"id":"1","title":"T","description":"D","imageUrl":"a.jpg"}"#,
        )
        .expect("decode");
        assert_eq!(article.image_url.as_deref(), Some("a.jpg"));
    }
}
