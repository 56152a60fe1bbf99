use std::time::Duration;

/// `10 seconds` for whole-second windows, otherwise the Debug form (`250ms`).
pub fn describe_window(window: Duration) -> String {
    if window.subsec_nanos() == 0 {
        let secs = window.as_secs();
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{} seconds", secs)
        }
    } else {
        format!("{:?}", window)
    }
}

/// One-line rendering of an error and its causes.
pub fn describe_error(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
