use saf_devices::CheckResult;

use crate::command_executor::{Command, devices::SessionHandler};

#[derive(Clone, Debug)]
pub enum SessionCommand {
    CheckFilterWheels,
    CheckFocuser,
    CheckCamera,
    WriteFocusDefault { target: Option<i64> },
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub device: String,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelSlots {
    pub wheel: String,
    pub empty_slots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub focus_min: i64,
    pub focus_max: i64,
    pub focus_default: Option<i64>,
    pub wheels: Vec<WheelSlots>,
}

#[derive(Debug)]
pub enum CommandResponse {
    Checked(Vec<CheckOutcome>),
    FocusDefault(CheckResult<i64>),
    Snapshot(DeviceSnapshot),
}

impl Command for SessionCommand {
    type Response = CommandResponse;
    type Handler = SessionHandler;

    fn name(&self) -> &'static str {
        match self {
            SessionCommand::CheckFilterWheels => "CheckFilterWheels",
            SessionCommand::CheckFocuser => "CheckFocuser",
            SessionCommand::CheckCamera => "CheckCamera",
            SessionCommand::WriteFocusDefault { .. } => "WriteFocusDefault",
            SessionCommand::Snapshot => "Snapshot",
        }
    }

    fn execute(self, handler: &mut Self::Handler) -> Self::Response {
        match self {
            SessionCommand::CheckFilterWheels => {
                CommandResponse::Checked(handler.check_filter_wheels())
            }
            SessionCommand::CheckFocuser => CommandResponse::Checked(vec![handler.check_focuser()]),
            SessionCommand::CheckCamera => CommandResponse::Checked(vec![handler.check_camera()]),
            SessionCommand::WriteFocusDefault { target } => {
                CommandResponse::FocusDefault(handler.write_focus_default(target))
            }
            SessionCommand::Snapshot => CommandResponse::Snapshot(handler.snapshot()),
        }
    }
}
