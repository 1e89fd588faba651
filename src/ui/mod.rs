//! Terminal output
//!
//! Plain-text rendering of responses, presets and saved prompts.

use std::fmt::Write;

use crate::format::{self, Segment, SegmentKind};
use crate::types::{EnhancedPromptRecord, ModelPreset};

const CODE_INDENT: &str = "    ";

/// Render model output: paragraphs separated by blank lines, code indented
pub fn render_segments(segments: &[Segment]) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for segment in segments {
        match segment.kind {
            SegmentKind::Text => {
                blocks.extend(segment.paragraphs().into_iter().map(str::to_string));
            }
            SegmentKind::Code => {
                let mut block = String::new();
                if let Some(language) = &segment.language {
                    let _ = writeln!(block, "[{}]", language);
                }
                let body: Vec<String> = segment
                    .content
                    .lines()
                    .map(|line| format!("{}{}", CODE_INDENT, line).trim_end().to_string())
                    .collect();
                block.push_str(&body.join("\n"));
                blocks.push(block);
            }
        }
    }

    blocks.join("\n\n")
}

/// Format and render raw model output
pub fn render_response(text: &str) -> String {
    render_segments(&format::format(text))
}

fn max_tokens_label(max_tokens: i32) -> String {
    if max_tokens < 0 {
        "unlimited".to_string()
    } else {
        max_tokens.to_string()
    }
}

pub fn render_preset(preset: &ModelPreset, active: bool) -> String {
    format!(
        "{} {}  {}  (model: {}, temperature: {:.2}, max tokens: {})",
        if active { "*" } else { " " },
        preset.id,
        preset.name,
        preset.model,
        preset.temperature,
        max_tokens_label(preset.max_tokens)
    )
}

/// One-line summary for library listings
pub fn render_record_line(record: &EnhancedPromptRecord) -> String {
    let mut preview: String = record.original_prompt.chars().take(60).collect();
    if record.original_prompt.chars().count() > 60 {
        preview.push_str("...");
    }
    format!(
        "{} {}  [{}]  {}  {}",
        if record.favorite { "★" } else { " " },
        record.id,
        record.category,
        record.created_at.format("%Y-%m-%d %H:%M"),
        preview.replace('\n', " ")
    )
}

/// Full record, enhanced prompt rendered through the formatter
pub fn render_record(record: &EnhancedPromptRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", render_record_line(record));
    let _ = writeln!(out);
    let _ = writeln!(out, "Original:");
    let _ = writeln!(out, "{}", record.original_prompt.trim());
    let _ = writeln!(out);
    let _ = writeln!(out, "Enhanced:");
    out.push_str(&render_response(&record.enhanced_prompt));
    out
}
