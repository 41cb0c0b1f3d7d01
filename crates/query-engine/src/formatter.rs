use serde_json::Value;

pub const CITATION_CONTENT_MAX_CHARS: usize = 200;

const SOURCES_HEADER: &str = "\n\n📚 **Sources:**\n";
const UNKNOWN_TITLE: &str = "Unknown";
const ELLIPSIS: &str = "...";

/// A source the chat service cited while grounding its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    Structured {
        title: Option<String>,
        content: Option<String>,
    },
    Freeform(String),
}

impl Citation {
    /// Objects become structured citations, strings become free-form ones, and
    /// anything else is kept as its JSON text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => Self::Structured {
                title: fields
                    .get("title")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
                content: fields
                    .get("content")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
            },
            Value::String(raw) => Self::Freeform(raw.clone()),
            other => Self::Freeform(other.to_string()),
        }
    }
}

pub fn format_response(text: &str, citations: &[Citation]) -> String {
    if citations.is_empty() {
        return text.to_string();
    }

    let mut formatted = String::from(text);
    formatted.push_str(SOURCES_HEADER);
    for (index, citation) in citations.iter().enumerate() {
        let position = index + 1;
        match citation {
            Citation::Structured { title, content } => {
                let title = title
                    .as_deref()
                    .filter(|title| !title.is_empty())
                    .unwrap_or(UNKNOWN_TITLE);
                let excerpt = citation_excerpt(content.as_deref().unwrap_or_default());
                formatted.push_str(&format!("{position}. **{title}**\n   {excerpt}\n\n"));
            }
            Citation::Freeform(raw) => {
                formatted.push_str(&format!("{position}. {raw}\n"));
            }
        }
    }

    formatted
}

fn citation_excerpt(content: &str) -> String {
    if content.chars().count() <= CITATION_CONTENT_MAX_CHARS {
        return content.to_string();
    }

    let mut excerpt = content
        .chars()
        .take(CITATION_CONTENT_MAX_CHARS)
        .collect::<String>();
    excerpt.push_str(ELLIPSIS);
    excerpt
}
