pub mod ccd;
pub mod error;
pub mod filter;
pub mod filter_wheel;
pub mod focuser;
pub mod proxy;
pub mod simulated;

pub use ccd::Ccd;
pub use error::{CheckError, CheckResult, DeviceKind, ProxyError};
pub use filter::Filter;
pub use filter_wheel::{FilterWheel, WheelDevice};
pub use focuser::{Focuser, LimitSource, SettlePolicy};
pub use proxy::{Device, DeviceProxy, Property, Value};
pub use simulated::{SimulatedProxy, SimulatorConfig};
