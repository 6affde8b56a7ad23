use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::NewsArticle, error::VerificationError};

pub const GET_ALL_PATH: &str = "/api/News/getAll";
pub const CHECK_NEWS_PATH: &str = "/api/News/checkNews";
pub const CHECK_PDF_PATH: &str = "/api/News/checkPdf";
pub const CHECK_NEWS_QUERY_PARAM: &str = "query";
pub const CHECK_PDF_FIELD: &str = "file";

/// Verdict payload returned by either check operation. The client never
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckOutcome(pub Value);

impl CheckOutcome {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationResult {
    ArticleList(Vec<NewsArticle>),
    CheckOutcome(CheckOutcome),
}

/// Extracts the `articles` sequence from a list-all payload.
///
/// The sequence comes back in server order with nothing dropped or merged.
pub fn parse_article_list(payload: Value) -> Result<Vec<NewsArticle>, VerificationError> {
    let Value::Object(mut fields) = payload else {
        return Err(VerificationError::malformed(
            "list payload is not a JSON object",
        ));
    };

    let articles = match fields.remove("articles") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(VerificationError::malformed(format!(
                "`articles` is not an array (found {})",
                json_type_name(&other)
            )))
        }
        None => return Err(VerificationError::malformed("missing `articles` field")),
    };

    articles
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<NewsArticle>(item).map_err(|e| {
                VerificationError::malformed(format!("article at index {index} is invalid: {e}"))
            })
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_article_order_and_duplicates() {
        let articles = parse_article_list(json!({
            "status": "ok",
            "articles": [
                {"id": "b", "title": "B", "description": "second"},
                {"id": "a", "title": "A", "description": "first"},
                {"id": "b", "title": "B", "description": "second"}
            ]
        }))
        .expect("articles");

        let ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "b"]);
    }

    #[test]
    fn empty_articles_is_not_an_error() {
        let articles = parse_article_list(json!({ "articles": [] })).expect("articles");
        assert!(articles.is_empty());
    }

    #[test]
    fn missing_articles_is_malformed() {
        let err = parse_article_list(json!({ "error": "Failed to fetch news" }))
            .expect_err("must fail");
        assert_eq!(err, VerificationError::malformed("missing `articles` field"));
    }

    #[test]
    fn non_array_articles_is_malformed() {
        let err = parse_article_list(json!({ "articles": { "id": "1" } })).expect_err("must fail");
        assert!(err.to_string().contains("found object"), "{err}");
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = parse_article_list(json!([1, 2, 3])).expect_err("must fail");
        assert!(matches!(err, VerificationError::MalformedResponse { .. }));
    }

    #[test]
    fn bad_element_reports_its_index() {
        let err = parse_article_list(json!({
            "articles": [
                {"id": "1", "title": "T", "description": "D"},
                {"title": "no id"}
            ]
        }))
        .expect_err("must fail");
        assert!(err.to_string().contains("index 1"), "{err}");
    }
}
