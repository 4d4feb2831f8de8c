//! Single-slot live preview of the newest frontend snippet.

use std::fs;
use std::io;
use std::path::Path;

use project_store::{CodeSnippet, SnippetCategory};

pub const DEFAULT_PREVIEW_FILE: &str = "cockpit-preview.html";

const DOCUMENT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Cockpit preview</title>
<script src="https://unpkg.com/react@18/umd/react.development.js" crossorigin></script>
<script src="https://unpkg.com/react-dom@18/umd/react-dom.development.js" crossorigin></script>
<script src="https://unpkg.com/@babel/standalone/babel.min.js"></script>
<style>body { margin: 0; font-family: system-ui, sans-serif; }</style>
</head>
<body>
<div id="root"></div>
<script type="text/babel" data-presets="react,typescript">
"#;

const DOCUMENT_TAIL: &str = "\n</script>\n</body>\n</html>\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSlot {
    pub snippet_id: String,
    pub filename: String,
    pub code: String,
}

impl From<&CodeSnippet> for PreviewSlot {
    fn from(snippet: &CodeSnippet) -> Self {
        Self {
            snippet_id: snippet.id.clone(),
            filename: snippet.filename.clone(),
            code: snippet.code.clone(),
        }
    }
}

impl PreviewSlot {
    /// Newest frontend snippet among `snippets`, if any.
    #[must_use]
    pub fn latest_in(snippets: &[CodeSnippet]) -> Option<Self> {
        snippets
            .iter()
            .rev()
            .find(|snippet| snippet.category == SnippetCategory::Frontend)
            .map(Self::from)
    }
}

/// Standalone HTML page running `code` as inline script. The code is injected
/// verbatim.
#[must_use]
pub fn render_document(code: &str) -> String {
    let mut document = String::with_capacity(DOCUMENT_HEAD.len() + code.len() + DOCUMENT_TAIL.len());
    document.push_str(DOCUMENT_HEAD);
    document.push_str(code);
    document.push_str(DOCUMENT_TAIL);
    document
}

pub fn write_document(path: &Path, code: &str) -> io::Result<()> {
    fs::write(path, render_document(code))
}
