//! Locally synthesized fallback images

use super::ImageHandle;
use base64::{engine::general_purpose::STANDARD, Engine as _};

const PALETTE: [&str; 5] = ["#FF6B9D", "#4ECDC4", "#FFE66D", "#A8DADC", "#F1A7FE"];
const CAPTION_WORDS: usize = 6;

/// Palette colour for a question; stable across calls
pub fn placeholder_color(question_id: u32) -> &'static str {
    PALETTE[question_id as usize % PALETTE.len()]
}

/// Build an SVG placeholder captioned with the first words of the prompt
pub fn placeholder_image(question_id: u32, prompt: &str) -> ImageHandle {
    let color = placeholder_color(question_id);
    let caption = caption(prompt);
    let svg = format!(
        concat!(
            r#"<svg width="600" height="400" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<rect width="600" height="400" fill="{color}" opacity="0.2"/>"#,
            r#"<circle cx="300" cy="180" r="80" fill="{color}" opacity="0.4"/>"#,
            r#"<text x="300" y="195" font-family="Arial, sans-serif" font-size="48" font-weight="bold" fill="{color}" text-anchor="middle">?</text>"#,
            r##"<text x="300" y="300" font-family="Arial, sans-serif" font-size="20" fill="#333" text-anchor="middle">{caption}</text>"##,
            r#"</svg>"#
        ),
        color = color,
        caption = caption,
    );
    ImageHandle::placeholder(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(svg.as_bytes())
    ))
}

fn caption(prompt: &str) -> String {
    let words: Vec<&str> = prompt.split_whitespace().take(CAPTION_WORDS).collect();
    if words.is_empty() {
        return "Image Preview".to_string();
    }
    let mut caption = words.join(" ");
    if prompt.split_whitespace().count() > CAPTION_WORDS {
        caption.push_str("...");
    }
    escape_xml(&caption)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
