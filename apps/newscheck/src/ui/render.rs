//! Text rendering of a view's request state.

use client_core::RequestState;
use shared::{
    domain::NewsArticle,
    protocol::{CheckOutcome, VerificationResult},
};

use crate::ui::theme::{Rgb, ThemeState};

pub const DEFAULT_IMAGE: &str = "/default-image.jpg";
pub const DEFAULT_ALT_TEXT: &str = "News Article";
pub const EMPTY_LIST_MESSAGE: &str = "No news available.";
pub const LOADING_MESSAGE: &str = "Loading...";

/// Image shown for an article; the article itself is left untouched.
pub fn image_for(article: &NewsArticle) -> &str {
    article
        .image_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(DEFAULT_IMAGE)
}

pub fn alt_text_for(article: &NewsArticle) -> &str {
    if article.title.trim().is_empty() {
        DEFAULT_ALT_TEXT
    } else {
        &article.title
    }
}

pub struct Renderer {
    theme: ThemeState,
    color: bool,
}

impl Renderer {
    pub fn new(theme: ThemeState, color: bool) -> Self {
        Self { theme, color }
    }

    pub fn toggle_theme(&mut self) -> String {
        let theme = self.theme.toggle();
        let palette = theme.palette();
        format!(
            "theme: {theme} (primary {}, secondary {})",
            palette.primary, palette.secondary
        )
    }

    pub fn render(&self, state: &RequestState) -> String {
        match state {
            RequestState::Idle => String::new(),
            RequestState::Loading => LOADING_MESSAGE.to_string(),
            RequestState::Failed(_) => {
                let message = state.user_message().unwrap_or_default();
                self.paint(&format!("error: {message}"), self.theme.palette().secondary)
            }
            RequestState::Succeeded(VerificationResult::ArticleList(articles)) => {
                self.render_articles(articles)
            }
            RequestState::Succeeded(VerificationResult::CheckOutcome(outcome)) => {
                self.render_outcome(outcome)
            }
        }
    }

    fn render_articles(&self, articles: &[NewsArticle]) -> String {
        if articles.is_empty() {
            return EMPTY_LIST_MESSAGE.to_string();
        }

        let primary = self.theme.palette().primary;
        articles
            .iter()
            .enumerate()
            .map(|(index, article)| {
                format!(
                    "[{}] {}\n    {}\n    image: {} ({})",
                    index + 1,
                    self.paint(&article.title, primary),
                    article.description,
                    image_for(article),
                    alt_text_for(article),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_outcome(&self, outcome: &CheckOutcome) -> String {
        let body = serde_json::to_string_pretty(outcome.as_value())
            .unwrap_or_else(|_| outcome.as_value().to_string());
        format!(
            "{}\n{body}",
            self.paint("verification result", self.theme.palette().primary)
        )
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if !self.color {
            return text.to_string();
        }
        let Rgb(r, g, b) = color;
        format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m")
    }
}

#[cfg(test)]
#[path = "../tests/render_tests.rs"]
mod tests;
