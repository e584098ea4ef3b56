//! HTML page templates.
//!
//! Each page is read from the templates directory on first use and kept for
//! the life of the process. Rendering replaces `{{variable}}` placeholders
//! with HTML-escaped values.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load template {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Pages served by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    Chat,
}

impl Page {
    pub fn file_name(&self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::Chat => "chat.html",
        }
    }
}

pub struct PageTemplates {
    dir: PathBuf,
    index: OnceCell<String>,
    chat: OnceCell<String>,
}

impl PageTemplates {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            index: OnceCell::new(),
            chat: OnceCell::new(),
        }
    }

    /// Render `page` with the given placeholder values
    pub async fn render(
        &self,
        page: Page,
        variables: &[(&str, &str)],
    ) -> Result<String, TemplateError> {
        let source = self.source(page).await?;
        Ok(substitute(source, variables))
    }

    async fn source(&self, page: Page) -> Result<&str, TemplateError> {
        let cell = match page {
            Page::Index => &self.index,
            Page::Chat => &self.chat,
        };

        let path = self.dir.join(page.file_name());
        let source = cell
            .get_or_try_init(|| async {
                tracing::debug!(path = %path.display(), "Loading template");
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| TemplateError::Load {
                        path: path.display().to_string(),
                        source,
                    })
            })
            .await?;

        Ok(source.as_str())
    }
}

/// Replace every `{{key}}` with its escaped value. Unknown placeholders are left as-is.
pub fn substitute(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in variables {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, &escape_html(value));
    }
    result
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
