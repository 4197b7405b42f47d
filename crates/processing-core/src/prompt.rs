//! Visual prompt derivation for segment images.

/// Style suffix appended to every image prompt.
pub const PROMPT_STYLE_SUFFIX: &str = "vertical 9:16 aspect ratio, cinematic lighting, photorealistic, 4k, architectural detail, highly detailed";

/// Build an image prompt from narration text.
///
/// Keeps ASCII letters, digits and whitespace, trims, then appends the style suffix.
pub fn visual_prompt(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    format!("{}, {PROMPT_STYLE_SUFFIX}", cleaned.trim())
}
