use log::info;
use presencecore::dispatch::NotificationSink;
use presencecore::prelude::NotifyError;
use std::process::{Command, Stdio};

/// Notification sink that only writes the alert to the log.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!("[ALERT] {}", message);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Runs an external text-to-speech program with the message as last argument.
///
/// `program` is split on whitespace, so `"espeak -s 150"` works as expected.
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(command_line: &str) -> Result<Self, NotifyError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| NotifyError::Rejected("empty speech command".into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl NotificationSink for CommandNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}
