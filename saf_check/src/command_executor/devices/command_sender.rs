use saf_devices::CheckResult;

use crate::command_executor::{
    Command as _, CommandSender, ExecutorError,
    devices::commands::{CheckOutcome, CommandResponse, DeviceSnapshot, SessionCommand},
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("unexpected response type to {command}")]
    UnexpectedResponse { command: &'static str },
}

#[derive(Clone)]
pub struct SessionCommandSender {
    sender: CommandSender<SessionCommand>,
}

impl SessionCommandSender {
    pub fn new(sender: CommandSender<SessionCommand>) -> Self {
        Self { sender }
    }

    async fn checked(&self, command: SessionCommand) -> Result<Vec<CheckOutcome>, SessionError> {
        let name = command.name();

        match self.sender.send_command(command).await? {
            CommandResponse::Checked(outcomes) => Ok(outcomes),
            _ => Err(SessionError::UnexpectedResponse { command: name }),
        }
    }

    pub async fn check_filter_wheels(&self) -> Result<Vec<CheckOutcome>, SessionError> {
        self.checked(SessionCommand::CheckFilterWheels).await
    }

    pub async fn check_focuser(&self) -> Result<Vec<CheckOutcome>, SessionError> {
        self.checked(SessionCommand::CheckFocuser).await
    }

    pub async fn check_camera(&self) -> Result<Vec<CheckOutcome>, SessionError> {
        self.checked(SessionCommand::CheckCamera).await
    }

    pub async fn write_focus_default(
        &self,
        target: Option<i64>,
    ) -> Result<CheckResult<i64>, SessionError> {
        let response = self
            .sender
            .send_command(SessionCommand::WriteFocusDefault { target })
            .await?;

        match response {
            CommandResponse::FocusDefault(result) => Ok(result),
            _ => Err(SessionError::UnexpectedResponse {
                command: "WriteFocusDefault",
            }),
        }
    }

    pub async fn snapshot(&self) -> Result<DeviceSnapshot, SessionError> {
        match self.sender.send_command(SessionCommand::Snapshot).await? {
            CommandResponse::Snapshot(snapshot) => Ok(snapshot),
            _ => Err(SessionError::UnexpectedResponse {
                command: "Snapshot",
            }),
        }
    }
}
