//! Notifier that hands the message to an external command

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use crate::Error;
use crate::config::NotifierConfig;
use crate::traits::Notifier;

/// Runs `program args... <message>` and waits for it to exit
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, Error> {
        config.validate()?;
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| Error::config("Notifier command cannot be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn send(&self, message: &str) -> Result<(), Error> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| {
                Error::notification(format!(
                    "{} did not finish within {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| Error::notification(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(Error::notification(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tracing::debug!(program = %self.program, "notification delivered");
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "command"
    }
}
