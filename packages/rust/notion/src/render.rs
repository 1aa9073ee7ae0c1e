//! Block → Markdown rendering.

use serde_json::Value;

use crate::types::Block;

/// Indentation applied to nested child blocks.
const CHILD_INDENT: &str = "    ";

/// Render a rich-text array with its inline annotations.
pub fn rich_text(value: Option<&Value>) -> String {
    let Some(spans) = value.and_then(Value::as_array) else {
        return String::new();
    };

    spans.iter().map(render_span).collect()
}

fn render_span(span: &Value) -> String {
    let text = span
        .get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| span.pointer("/text/content").and_then(Value::as_str))
        .unwrap_or_default();
    if text.is_empty() {
        return String::new();
    }

    let flag = |name: &str| {
        span.pointer(&format!("/annotations/{name}"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    let mut out = text.to_string();
    if flag("code") {
        out = format!("`{out}`");
    }
    if flag("bold") {
        out = format!("**{out}**");
    }
    if flag("italic") {
        out = format!("*{out}*");
    }
    if flag("strikethrough") {
        out = format!("~~{out}~~");
    }
    if let Some(href) = span.get("href").and_then(Value::as_str) {
        out = format!("[{out}]({href})");
    }
    out
}

/// Whether consecutive blocks of this kind are joined without a blank line.
pub fn is_list_like(kind: &str) -> bool {
    matches!(
        kind,
        "bulleted_list_item" | "numbered_list_item" | "to_do" | "toggle"
    )
}

/// Render a single block (without its children).
///
/// `number` is the 1-based position within a run of numbered list items.
/// Returns `None` for block kinds that carry no body text.
pub fn render_block(block: &Block, number: usize) -> Option<String> {
    let payload = block.payload();
    let text = rich_text(payload.and_then(|p| p.get("rich_text")));

    let rendered = match block.kind.as_str() {
        "paragraph" if text.is_empty() => return None,
        "paragraph" => text,
        "heading_1" => format!("# {text}"),
        "heading_2" => format!("## {text}"),
        "heading_3" => format!("### {text}"),
        "bulleted_list_item" | "toggle" => format!("- {text}"),
        "numbered_list_item" => format!("{number}. {text}"),
        "to_do" => {
            let checked = payload
                .and_then(|p| p.get("checked"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!("- [{}] {text}", if checked { "x" } else { " " })
        }
        "quote" | "callout" => format!("> {text}"),
        "code" => {
            let language = payload
                .and_then(|p| p.get("language"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("```{language}\n{text}\n```")
        }
        "equation" => {
            let expr = payload
                .and_then(|p| p.get("expression"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("$${expr}$$")
        }
        "divider" => "---".to_string(),
        _ => return None,
    };

    Some(rendered)
}

/// Indent every line of a rendered child body.
pub fn indent(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{CHILD_INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join rendered blocks: list items on consecutive lines, everything else
/// separated by a blank line.
pub fn join_blocks(blocks: &[(String, String)]) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;

    for (kind, text) in blocks {
        if let Some(prev) = previous {
            if is_list_like(prev) && is_list_like(kind) {
                out.push('\n');
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(text);
        previous = Some(kind);
    }

    out
}
