//! Desktop notifications for task failures.
//!
//! Failures are always logged; the desktop popup is best effort and only
//! sent when enabled and a notifier program exists on this platform.
use std::path::Path;
use std::sync::Arc;

use crate::exec::Executor;
use crate::logging::Log;

/// Longest message body passed to the notifier.
const MAX_MESSAGE_CHARS: usize = 240;

/// Sends failure alerts through `notify-send` or `osascript`.
#[derive(Debug, Clone)]
pub struct Notifier {
    executor: Arc<dyn Executor>,
    enabled: bool,
}

impl Notifier {
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, enabled: bool) -> Self {
        Self { executor, enabled }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log `message` as an error under `title` and raise a desktop alert.
    pub fn failure(&self, log: &dyn Log, title: &str, message: &str) {
        log.error(&format!("{title}: {message}"));
        if !self.enabled {
            return;
        }
        let body = summarize(message);
        let Some((program, args)) = notifier_command(title, &body) else {
            return;
        };
        if self.executor.which(program).is_none() {
            log.debug(&format!("{program} not available, notification not shown"));
            return;
        }
        if let Err(e) = self
            .executor
            .run_unchecked_in(Path::new("."), program, &args)
        {
            log.debug(&format!("notification failed: {e:#}"));
        }
    }
}

/// First non-empty line of `message`, shortened for a popup.
fn summarize(message: &str) -> String {
    let line = message
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if line.chars().count() > MAX_MESSAGE_CHARS {
        let cut: String = line.chars().take(MAX_MESSAGE_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

/// The platform notifier invocation, if there is one.
fn notifier_command(title: &str, body: &str) -> Option<(&'static str, Vec<String>)> {
    if cfg!(target_os = "macos") {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            applescript_escape(body),
            applescript_escape(title)
        );
        Some(("osascript", vec!["-e".to_string(), script]))
    } else if cfg!(unix) {
        Some((
            "notify-send",
            vec![
                "--app-name=shop-build".to_string(),
                title.to_string(),
                body.to_string(),
            ],
        ))
    } else {
        None
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
