//! Windows PowerShell quoting and `-EncodedCommand` payloads.
//!
//! Everything PowerShell-specific about embedding strings lives here so the
//! command builder never does its own quoting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Fixed arguments put before the encoded script.
pub const FIXED_ARGS: [&str; 5] = [
    "-NoProfile",
    "-NonInteractive",
    "-ExecutionPolicy",
    "Bypass",
    "-EncodedCommand",
];

/// Silences progress output so the shell never waits on the console.
pub const PREAMBLE: &str = "$ProgressPreference = 'SilentlyContinue';";

/// Escape characters that are special inside a PowerShell double-quoted string.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '`' | '"' | '$') {
            escaped.push('`');
        }
        escaped.push(ch);
    }
    escaped
}

/// `"value"` as a PowerShell string literal.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

/// `"`"value`""`: a string literal whose value keeps its own double quotes,
/// so `Start-Process` receives it as one argument even with spaces.
pub fn quote_nested(value: &str) -> String {
    format!("\"`\"{}`\"\"", escape(value))
}

/// `&` terminates a command for the Windows shell unless caret-escaped.
pub fn escape_ampersands(value: &str) -> String {
    value.replace('&', "^&")
}

/// Base64 of the UTF-16LE bytes of `script`, as `-EncodedCommand` expects.
pub fn encode_command(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a\"b"), "a`\"b");
        assert_eq!(escape("tick`"), "tick``");
        assert_eq!(escape("$env:PATH"), "`$env:PATH");
    }

    #[test]
    fn test_quote_forms() {
        assert_eq!(quote("C:\\a b.txt"), "\"C:\\a b.txt\"");
        assert_eq!(quote_nested("chrome"), "\"`\"chrome`\"\"");
        assert_eq!(quote_nested("say \"hi\""), "\"`\"say `\"hi`\"`\"\"");
    }

    #[test]
    fn test_escape_ampersands() {
        assert_eq!(
            escape_ampersands("https://x.test/?a=1&b=2"),
            "https://x.test/?a=1^&b=2"
        );
    }

    #[test]
    fn test_encode_command_is_utf16le_base64() {
        assert_eq!(encode_command("Start"), "UwB0AGEAcgB0AA==");
    }
}
