//! Splits message text into prose and fenced code, and turns fences into snippets.
//!
//! Only terminated fences count, and a fence opens only at the start of a line.
//! An opening fence without a closing one stays prose, so a truncated reply
//! yields fewer snippets rather than an error.

use std::ops::Range;
use std::sync::OnceLock;

use project_store::{
    now_millis, CodeSnippet, Message, MessageRole, Project, SnippetCategory, Timestamp,
};
use regex::Regex;

pub const DEFAULT_LANGUAGE: &str = "typescript";
pub const SNIPPET_EXTENSION: &str = "tsx";

fn fence_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?ms)^```([^\s`]*)[^\n`]*\n(.*?)```").expect("fence regex must compile")
    })
}

fn category_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)Category:\s*(frontend|backend|database|config)\b")
            .expect("category regex must compile")
    })
}

/// One terminated fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence<'a> {
    /// Token right after the opening backticks, if any.
    pub language: Option<&'a str>,
    pub body: &'a str,
    /// Byte range of the whole fence, backticks included.
    pub span: Range<usize>,
}

impl Fence<'_> {
    #[must_use]
    pub fn language_or_default(&self) -> &str {
        self.language.unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Category marker found in the body, defaulting to frontend.
    #[must_use]
    pub fn category(&self) -> SnippetCategory {
        category_regex()
            .captures(self.body)
            .and_then(|captures| captures.get(1))
            .and_then(|marker| SnippetCategory::parse(marker.as_str()))
            .unwrap_or_default()
    }

    /// Body without the blank lines around it.
    #[must_use]
    pub fn code(&self) -> &str {
        self.body.trim_start_matches(['\r', '\n']).trim_end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Code(Fence<'a>),
}

/// Splits `content` into prose and code segments in source order.
///
/// Whitespace-only prose between fences is dropped.
#[must_use]
pub fn segments(content: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in fence_regex().captures_iter(content) {
        let (Some(whole), Some(body)) = (captures.get(0), captures.get(2)) else {
            continue;
        };

        push_prose(&mut segments, &content[cursor..whole.start()]);
        let language = captures
            .get(1)
            .map(|token| token.as_str())
            .filter(|token| !token.is_empty());
        segments.push(Segment::Code(Fence {
            language,
            body: body.as_str(),
            span: whole.range(),
        }));
        cursor = whole.end();
    }

    push_prose(&mut segments, &content[cursor..]);
    segments
}

fn push_prose<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.trim().is_empty() {
        segments.push(Segment::Prose(text));
    }
}

/// Extracts one snippet per terminated fence, in source order.
///
/// Filenames are `{category}-{last four digits of now_ms}.tsx`; fences
/// extracted in the same millisecond share a filename.
#[must_use]
pub fn extract_snippets(content: &str, now_ms: Timestamp) -> Vec<CodeSnippet> {
    let mut snippets = Vec::new();
    let mut explanation = "";

    for segment in segments(content) {
        match segment {
            Segment::Prose(text) => {
                explanation = last_non_empty_line(text);
            }
            Segment::Code(fence) => {
                let category = fence.category();
                snippets.push(CodeSnippet {
                    id: uuid::Uuid::new_v4().to_string(),
                    filename: snippet_filename(category, now_ms),
                    language: fence.language_or_default().to_string(),
                    code: fence.code().to_string(),
                    category,
                    explanation: explanation.to_string(),
                });
                explanation = "";
            }
        }
    }

    snippets
}

#[must_use]
pub fn snippet_filename(category: SnippetCategory, now_ms: Timestamp) -> String {
    format!(
        "{}-{:04}.{SNIPPET_EXTENSION}",
        category.as_str(),
        now_ms.rem_euclid(10_000)
    )
}

fn last_non_empty_line(text: &str) -> &str {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Result of appending one message to a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingestion {
    pub project: Project,
    pub message: Message,
    /// Snippets appended by this call, in source order.
    pub snippets: Vec<CodeSnippet>,
    /// Last frontend snippet appended by this call.
    pub latest_frontend: Option<CodeSnippet>,
}

/// Appends a message and, for assistant text, its snippets. Does not persist.
#[must_use]
pub fn ingest(project: Project, role: MessageRole, content: &str) -> Ingestion {
    ingest_at(project, role, content, now_millis())
}

#[must_use]
pub fn ingest_at(
    mut project: Project,
    role: MessageRole,
    content: &str,
    now_ms: Timestamp,
) -> Ingestion {
    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        role,
        content: content.to_string(),
        timestamp: now_ms,
    };
    project.workspace.messages.push(message.clone());

    let snippets = match role {
        MessageRole::Assistant => extract_snippets(content, now_ms),
        MessageRole::User => Vec::new(),
    };
    let latest_frontend = snippets
        .iter()
        .rev()
        .find(|snippet| snippet.category == SnippetCategory::Frontend)
        .cloned();
    project.workspace.snippets.extend(snippets.iter().cloned());
    project.last_modified = now_ms;

    Ingestion {
        project,
        message,
        snippets,
        latest_frontend,
    }
}
