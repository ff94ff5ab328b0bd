//! Attachment filename derivation.

/// Title used when the source reports none.
pub const DEFAULT_TITLE: &str = "audio";

/// Characters stripped from titles before use in a filename.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum sanitized title length in characters.
const MAX_TITLE_CHARS: usize = 200;

/// Sanitize a source title for use in a `Content-Disposition` filename.
///
/// Strips `< > : " / \ | ? *`, collapses whitespace runs to a single
/// underscore, and truncates to 200 characters. Idempotent.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_whitespace = false;

    for c in title.chars() {
        if FORBIDDEN.contains(&c) {
            continue;
        }
        if c.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace && !out.is_empty() {
            out.push('_');
        }
        in_whitespace = false;
        out.push(c);
    }

    out.chars().take(MAX_TITLE_CHARS).collect()
}

/// Build the full attachment filename for a clip:
/// `<sanitized-title>_<start>-<end>[_loop].mp3`.
pub fn clip_filename(title: Option<&str>, start_secs: f64, end_secs: f64, looped: bool) -> String {
    let title = title
        .map(sanitize_title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let mut name = format!(
        "{}_{}-{}",
        title,
        format_secs(start_secs),
        format_secs(end_secs)
    );
    if looped {
        name.push_str("_loop");
    }
    name.push_str(".mp3");
    name
}

/// Render seconds without trailing zeros (`330`, `12.5`).
fn format_secs(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{}", secs as i64)
    } else {
        format!("{secs}")
    }
}
