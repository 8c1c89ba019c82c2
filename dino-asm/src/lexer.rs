//! Assembler for the dino virtual machine
//!
//! Line normalizer for the assembly syntax.
//!
//! The language is strictly line-oriented: one instruction or label per
//! line, `;` starts a comment, commas between operands are optional noise.

/// Normalize a single source line into its tokens.
///
/// Strips everything from the first `;`, removes literal commas, and splits
/// the rest on whitespace. Returns `None` for a line that is empty once
/// normalized (blank or comment-only), which the caller skips entirely.
pub fn normalize_line(line: &str) -> Option<Vec<String>> {
    let code = line.split(';').next().unwrap_or("");
    let code = code.replace(',', "");
    let code = code.trim();

    if code.is_empty() {
        return None;
    }

    Some(code.split_whitespace().map(str::to_owned).collect())
}
