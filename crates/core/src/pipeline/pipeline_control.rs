use std::ops::ControlFlow;
use std::str::FromStr;

use thiserror::Error;

use crate::filtering::filter_operation::{FilterOperation, UnknownFilterError};
use crate::pipeline::pipeline_driver::PipelineDriver;

/// A host request applied to the driver between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    SetCameraEnabled(bool),
    SetFilter(FilterOperation, bool),
    SetBlurSize(u32),
    SetErodeIterations(u32),
    SetDilateIterations(u32),
    SetThresholdLevel(u8),
    Stop,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("expected 'on' or 'off', got '{0}'")]
    InvalidSwitch(String),
    #[error("invalid value '{value}' for {parameter}")]
    InvalidValue {
        parameter: &'static str,
        value: String,
    },
    #[error(transparent)]
    UnknownFilter(#[from] UnknownFilterError),
}

impl ControlCommand {
    /// Parses one textual command.
    ///
    /// Accepted forms: `camera on|off`, `filter <name> on|off`,
    /// `<name> on|off`, `blur|erode|dilate|threshold <n>`, `stop`/`quit`.
    pub fn parse(input: &str) -> Result<Self, CommandParseError> {
        let lowered = input.trim().to_ascii_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        match tokens.as_slice() {
            [] => Err(CommandParseError::Empty),
            ["stop" | "quit" | "exit"] => Ok(ControlCommand::Stop),
            ["camera", switch] => Ok(ControlCommand::SetCameraEnabled(parse_switch(switch)?)),
            ["filter", name, switch] => Ok(ControlCommand::SetFilter(
                name.parse()?,
                parse_switch(switch)?,
            )),
            [name, value] if is_switch(value) => Ok(ControlCommand::SetFilter(
                name.parse()?,
                parse_switch(value)?,
            )),
            ["blur", value] => Ok(ControlCommand::SetBlurSize(parse_value("blur size", value)?)),
            ["erode", value] => Ok(ControlCommand::SetErodeIterations(parse_value(
                "erode iterations",
                value,
            )?)),
            ["dilate", value] => Ok(ControlCommand::SetDilateIterations(parse_value(
                "dilate iterations",
                value,
            )?)),
            ["threshold", value] => Ok(ControlCommand::SetThresholdLevel(parse_value(
                "threshold level",
                value,
            )?)),
            [first, ..] => Err(CommandParseError::UnknownCommand(first.to_string())),
        }
    }

    /// Applies the command. `Break` asks the caller to stop ticking.
    pub fn apply(self, driver: &mut PipelineDriver) -> ControlFlow<()> {
        log::debug!("Applying {self:?}");
        match self {
            ControlCommand::SetCameraEnabled(enabled) => driver.set_camera_enabled(enabled),
            ControlCommand::SetFilter(op, enabled) => {
                driver.set_filter_enabled(op, enabled);
            }
            ControlCommand::SetBlurSize(size) => driver.filter_settings().set_blur_size(size),
            ControlCommand::SetErodeIterations(n) => {
                driver.filter_settings().set_erode_iterations(n)
            }
            ControlCommand::SetDilateIterations(n) => {
                driver.filter_settings().set_dilate_iterations(n)
            }
            ControlCommand::SetThresholdLevel(level) => {
                driver.filter_settings().set_threshold_level(level)
            }
            ControlCommand::Stop => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

impl FromStr for ControlCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_switch(token: &str) -> bool {
    matches!(token, "on" | "off" | "enable" | "disable")
}

fn parse_switch(token: &str) -> Result<bool, CommandParseError> {
    match token {
        "on" | "enable" => Ok(true),
        "off" | "disable" => Ok(false),
        other => Err(CommandParseError::InvalidSwitch(other.to_string())),
    }
}

fn parse_value<T: FromStr>(parameter: &'static str, token: &str) -> Result<T, CommandParseError> {
    token.parse().map_err(|_| CommandParseError::InvalidValue {
        parameter,
        value: token.to_string(),
    })
}
