use serde_json::{json, Value};

use crate::error::EngineError;
use crate::snapshot::{build_locals_summary, LocalValue, LocalsSnapshot};
use crate::tracer::FrameReport;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Step,
    StepOver,
    InspectValue { name: String },
}

impl Command {
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let command = value
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::UnknownCommand(value.to_string()))?;

        match command {
            "step" => Ok(Command::Step),
            "step-over" => Ok(Command::StepOver),
            "inspect-value" => {
                let name = value
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| EngineError::UnknownCommand(command.to_string()))?;
                Ok(Command::InspectValue {
                    name: name.to_string(),
                })
            }
            other => Err(EngineError::UnknownCommand(other.to_string())),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|_| EngineError::UnknownCommand(text.trim().to_string()))?;
        Self::from_value(&value)
    }
}

pub fn attach_message(code_lines: &[String]) -> Value {
    json!({ "code_lines": code_lines })
}

pub fn stop_message(frame: &FrameReport, locals: &LocalsSnapshot) -> Value {
    let mut message = serde_json::to_value(frame).expect("frame report serializes");
    message["locals_summary"] = serde_json::to_value(build_locals_summary(locals))
        .expect("locals summary serializes");
    message
}

pub fn terminated_message(step_count: u64) -> Value {
    json!({ "event": "terminated", "step_count": step_count })
}

/// Tensors carry their full payload; everything else is a formatted string.
pub fn value_message(name: &str, value: &LocalValue) -> Value {
    match value {
        LocalValue::Tensor {
            dtype,
            shape,
            values,
        } => json!({
            "name": name,
            "type": value.type_tag(),
            "dtype": dtype,
            "shape": shape,
            "values": values,
        }),
        other => json!({
            "name": name,
            "type": other.type_tag(),
            "value": other.formatted(),
        }),
    }
}

/// `None` for fatal errors, which have no wire shape.
pub fn error_message(error: &EngineError) -> Option<Value> {
    match error {
        EngineError::UnknownCommand(command) => Some(json!({
            "error": "UnknownCommand",
            "command": command,
        })),
        EngineError::NameNotFound(name) => Some(json!({
            "error": "NameNotFound",
            "name": name,
        })),
        _ => None,
    }
}
