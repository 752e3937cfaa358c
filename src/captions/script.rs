/// Topic used when the caller supplies nothing but whitespace.
pub const DEFAULT_TOPIC: &str = "3 fast tips to grow on TikTok";

const BODY_LINES: [&str; 5] = [
    "Tip 1: Keep it short and punchy",
    "Tip 2: Use bold on-screen captions",
    "Tip 3: Post consistently at peak times",
    "Bonus: Ask a question to boost comments",
    "CTA: Follow for daily growth hacks",
];

/// Number of lines [`generate_script`] always returns.
pub const SCRIPT_LEN: usize = BODY_LINES.len() + 1;

/// Expand a free-text topic into the fixed six-line caption script.
///
/// Only the hook line carries the topic; the tips, bonus and call-to-action lines are constant.
pub fn generate_script(topic: &str) -> Vec<String> {
    let trimmed = topic.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_TOPIC
    } else {
        trimmed
    };

    let mut lines = Vec::with_capacity(SCRIPT_LEN);
    lines.push(format!("Hook: {base}"));
    lines.extend(BODY_LINES.iter().map(|l| (*l).to_string()));
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/captions/script.rs"]
mod tests;
