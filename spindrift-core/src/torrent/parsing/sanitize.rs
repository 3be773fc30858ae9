//! Path component sanitization
//!
//! Torrent files carry attacker-controlled path names. Components are
//! rewritten so they are safe to create on every supported filesystem,
//! following the Windows naming rules (the strictest of the set):
//! <https://docs.microsoft.com/en-us/windows/desktop/FileIO/naming-a-file>

/// Characters that cannot appear in a file name on Windows.
const BANNED_CHARS: &str = "<>:\"/\\|?*";

/// Device names that Windows reserves regardless of extension.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Rewrites one untrusted path component into a filesystem-safe form.
///
/// Leading whitespace and trailing whitespace/`.` are trimmed, banned
/// characters and control characters become `_`, and a reserved device name
/// (matched case-insensitively up to a `.` or the end) gets a `_` inserted
/// after it, so `con.txt` becomes `con_.txt`.
///
/// Returns the rewritten component and whether it differs from the input.
/// An empty result means the component was unusable; callers must reject
/// the path rather than create a file with no name.
pub fn sanitize_component(component: &str) -> (String, bool) {
    let trimmed = component.trim_start();
    let trimmed = trimmed.trim_end_matches(|ch: char| ch.is_whitespace() || ch == '.');

    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if BANNED_CHARS.contains(ch) || (ch as u32) < 0x20 {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    for name in RESERVED_NAMES {
        let len = name.len();
        if out.len() < len
            || !out.as_bytes()[..len].eq_ignore_ascii_case(name.as_bytes())
            || (out.len() > len && out.as_bytes()[len] != b'.')
        {
            continue;
        }
        // Matched bytes are ASCII, so `len` is a char boundary.
        out.insert(len, '_');
        break;
    }

    let was_adjusted = out != component;
    (out, was_adjusted)
}
