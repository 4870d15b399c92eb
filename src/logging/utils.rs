//! Shared helpers for the log sinks: cache paths, timestamps, terminal width
//! and ANSI removal.
use std::path::PathBuf;

/// `chrono` format of the run header.
pub(super) const STAMP_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
/// `chrono` format of per-line log file timestamps.
pub(super) const STAMP_TIME: &str = "%H:%M:%S";
/// `chrono` format of diagnostic timeline entries.
pub(super) const STAMP_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current UTC time rendered with `format`.
pub(super) fn utc_now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}

/// Remove ANSI escape sequences. A CSI sequence (`ESC [`) runs up to its
/// final byte in `@..=~`; any other escape drops only the next character.
pub(super) fn strip_ansi(s: &str) -> String {
    #[derive(Clone, Copy)]
    enum State {
        Text,
        Escape,
        Csi,
    }

    let mut state = State::Text;
    s.chars()
        .filter(|&c| match state {
            State::Text if c == '\x1b' => {
                state = State::Escape;
                false
            }
            State::Text => true,
            State::Escape => {
                state = if c == '[' { State::Csi } else { State::Text };
                false
            }
            State::Csi => {
                if ('@'..='~').contains(&c) {
                    state = State::Text;
                }
                false
            }
        })
        .collect()
}

/// Terminal width in columns: the attached terminal, then `$COLUMNS`, then 80.
pub(super) fn terminal_columns() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| usize::from(w))
        .filter(|&w| w > 0)
        .or_else(|| {
            std::env::var("COLUMNS")
                .ok()?
                .parse::<usize>()
                .ok()
                .filter(|&w| w > 0)
        })
        .unwrap_or(80)
}

/// `<file>` inside `$XDG_CACHE_HOME/shop-build/` (default
/// `~/.cache/shop-build/`). The directory is created on demand; `None` if
/// that fails.
pub(super) fn cache_file(file: &str) -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CACHE_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".cache"),
    };
    let dir = base.join("shop-build");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(file))
}

/// Persistent log for `command`.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    cache_file(&format!("{command}.log"))
}

/// Diagnostic timeline for `command`.
pub(super) fn diag_log_file_path(command: &str) -> Option<PathBuf> {
    cache_file(&format!("{command}.diag.log"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn colours_and_headers_are_removed() {
        assert_eq!(strip_ansi("\x1b[33mWARN\x1b[0m  no scripts"), "WARN  no scripts");
        assert_eq!(
            strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mstyle-dev\x1b[0m"),
            "==> style-dev"
        );
    }

    #[test]
    fn cursor_sequences_and_lone_escapes_are_removed() {
        assert_eq!(strip_ansi("\r\x1b[Kscript-dev"), "\rscript-dev");
        assert_eq!(strip_ansi("a\x1b7b"), "ab");
        assert_eq!(strip_ansi("trailing\x1b"), "trailing");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_ansi(""), "");
        assert_eq!(strip_ansi("@import \"../a.less\";"), "@import \"../a.less\";");
    }

    #[test]
    fn width_is_never_zero() {
        assert!(terminal_columns() > 0);
    }

    #[test]
    fn stamps_have_expected_shape() {
        assert_eq!(utc_now(STAMP_TIME).len(), "12:34:56".len());
        assert_eq!(utc_now(STAMP_DATETIME).len(), "2026-01-01 12:34:56".len());
        let micros = utc_now(STAMP_MICROS);
        let (_, fraction) = micros.rsplit_once('.').expect("fraction");
        assert_eq!(fraction.len(), "123456Z".len());
    }

    #[test]
    fn cache_files_share_a_directory() {
        let ((log, diag), _tmp) = crate::logging::with_temp_cache(|| {
            (log_file_path("dist"), diag_log_file_path("dist"))
        });
        let (log, diag) = (log.unwrap(), diag.unwrap());
        assert_eq!(log.parent(), diag.parent());
        assert!(log.ends_with("shop-build/dist.log"));
        assert!(diag.ends_with("shop-build/dist.diag.log"));
    }
}
