//! Human-readable error descriptions and structured JSON error formatting.

use walker_core::WalkerError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(we) = err.downcast_ref::<WalkerError>() {
        return match we {
            WalkerError::Selection(msg) => format!(
                "What happened: Program could not be selected ({msg}).\nLikely causes: The name does not match any `Name=` in the walk directory, or the file failed validation.\nHow to fix: Run `walker list` to see the registered programs."
            ),
            WalkerError::Validation(msg) => format!(
                "What happened: Walk file is not runnable ({msg}).\nLikely causes: Missing `Use=` in [info], or a mot program without functions for every servo.\nHow to fix: Run `walker check <FILE>` and fix the reported sections."
            ),
            WalkerError::Link(msg) | WalkerError::Io(msg) => format!(
                "What happened: Talking to the controller board failed ({msg}).\nLikely causes: Wrong serial.device, cable unplugged, or missing permissions on the device.\nHow to fix: Check [serial] in the config, or rerun with --dry-run."
            ),
            WalkerError::Range { field, value } => format!(
                "What happened: A {field} of {value} does not fit the wire protocol.\nLikely causes: A step or motion function produces values outside 0..=255.\nHow to fix: Clamp the walk file's positions to the servo range 35..=157."
            ),
            WalkerError::Parse { line, reason } => format!(
                "What happened: Line {line} of the walk file is malformed ({reason}).\nHow to fix: Correct the line; see `walker check` output."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("config") {
        let mut cause = String::new();
        if let Some(src) = err.chain().nth(1) {
            cause = format!(" ({src})");
        }
        return format!(
            "What happened: Configuration is invalid or unreadable{cause}.\nLikely causes: {msg}.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("hardware feature") {
        return format!(
            "What happened: {msg}.\nHow to fix: Rebuild with `--features hardware` or pass --dry-run."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<WalkerError>() {
        Some(WalkerError::Selection(_)) => 3,
        Some(WalkerError::Validation(_) | WalkerError::Parse { .. }) => 4,
        Some(WalkerError::Link(_) | WalkerError::Io(_)) => 5,
        Some(WalkerError::Range { .. }) => 6,
        None => 1,
    }
}

/// Stable name of the error kind for JSON output.
fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<WalkerError>() {
        Some(WalkerError::Selection(_)) => "Selection",
        Some(WalkerError::Validation(_)) => "Validation",
        Some(WalkerError::Parse { .. }) => "Parse",
        Some(WalkerError::Link(_)) => "Link",
        Some(WalkerError::Io(_)) => "Io",
        Some(WalkerError::Range { .. }) => "Range",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
