use std::fmt;

use crate::proxy::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    FilterWheel,
    Focuser,
    Camera,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::FilterWheel => write!(f, "filter wheel"),
            DeviceKind::Focuser => write!(f, "focuser"),
            DeviceKind::Camera => write!(f, "camera"),
        }
    }
}

/// Failures reported by a [`DeviceProxy`](crate::proxy::DeviceProxy) implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProxyError {
    #[error("device {device} not present")]
    DeviceNotFound { device: String },

    #[error("device {device} has no property {property}")]
    PropertyNotFound { device: String, property: String },

    #[error("property {device}.{property} holds unusable value {value:?}")]
    InvalidValue {
        device: String,
        property: String,
        value: Value,
    },

    #[error("proxy transport failed: {message}")]
    Transport { message: String },
}

/// Why a presence check or a focus write did not succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    #[error("{kind} device {device} not present")]
    DeviceNotFound { kind: DeviceKind, device: String },

    #[error("device {device} has no {property} property")]
    PropertyNotFound { device: String, property: String },

    #[error("{device}: missing {argument}")]
    MissingArgument {
        device: String,
        argument: &'static str,
    },

    #[error(
        "{device}.{property} did not settle at {target} after {polls} polls (last readback {last:?})"
    )]
    SettleTimeout {
        device: String,
        property: String,
        target: i64,
        last: Option<f64>,
        polls: u32,
    },

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

pub type CheckResult<T = ()> = Result<T, CheckError>;
