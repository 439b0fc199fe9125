use thiserror::Error;
use crate::bus::gpio::GpioError;
use crate::bus::i2c::I2CError;
use crate::v4l2::BufType;

/// Failures of a single bus transfer
#[derive(Error, Debug)]
pub enum BusError {
    #[error("I2C communication failed: {0}")]
    I2c(#[from] I2CError),

    #[error("I2C communication failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Master clock errors
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Clock '{clock}' runs at a fixed {fixed_hz} Hz, cannot set {requested_hz} Hz")]
    FixedRate { clock: String, requested_hz: u32, fixed_hz: u32 },
}

/// Camera sensor errors, covering both hardware access and the
/// validation done by the subdevice callbacks
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Sensor '{sensor}' register {reg:#04x} access failed: {source}")]
    RegisterAccess {
        sensor: String,
        reg: u8,
        #[source]
        source: BusError,
    },

    #[error("Register table download to '{sensor}' aborted at entry {index} (reg {reg:#04x}): {source}")]
    TableDownload {
        sensor: String,
        index: usize,
        reg: u8,
        #[source]
        source: BusError,
    },

    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),

    #[error("Sensor '{sensor}' {pin} pin could not be driven: {reason}")]
    PinError { sensor: String, pin: &'static str, reason: String },

    #[error("Invalid sensor configuration for '{sensor}': {reason}")]
    ConfigError { sensor: String, reason: String },

    #[error("Unsupported sensor driver: '{driver}'")]
    UnsupportedDriver { driver: String },

    #[error("Bus '{bus}' not found or unavailable")]
    BusNotFound { bus: String },

    #[error("Bus '{bus}' could not be opened: {source}")]
    BusOpen {
        bus: String,
        #[source]
        source: BusError,
    },

    #[error("Sensor '{sensor}' wrong chip ID: expected {expected:#04x}, got {actual:#04x}")]
    WrongChipId { sensor: String, expected: u8, actual: u8 },

    #[error("Unknown {kind} value {value}")]
    UnknownValue { kind: &'static str, value: u32 },

    #[error("Sensor '{sensor}' does not handle buffer type {buf_type:?}")]
    UnsupportedBufType { sensor: String, buf_type: BufType },

    #[error("Sensor '{sensor}' does not support {fps} fps")]
    UnsupportedFrameRate { sensor: String, fps: u32 },

    #[error("Sensor '{sensor}' does not support media bus code {code:#06x}")]
    UnsupportedFormat { sensor: String, code: u32 },

    #[error("Sensor '{sensor}' has no {what} at index {index}")]
    IndexOutOfRange { sensor: String, what: &'static str, index: u32 },

    #[error("Frame interval query for '{sensor}' must set pixel format, width and height")]
    IncompleteQuery { sensor: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Control service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("gRPC server failed: {0}")]
    ServerError(#[from] tonic::transport::Error),

    #[error("Invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Subdevice '{id}' is already registered")]
    AlreadyRegistered { id: String },

    #[error("Subdevice '{id}' is not registered")]
    SubdevNotFound { id: String },

    #[error("Invalid gRPC request: {reason}")]
    InvalidRequest { reason: String },
}

/// Registry and initialization errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Sensor probe failed: {0}")]
    ProbeError(#[source] SensorError),

    #[error("Configuration failed: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Failed to create sensor driver: {0}")]
    DriverCreationError(#[source] SensorError),

    #[error("Subdevice registration failed: {0}")]
    RegistrationError(#[from] ServiceError),
}

/// Result type aliases for convenience
pub type BusResult<T> = Result<T, BusError>;
pub type SensorResult<T> = Result<T, SensorError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ServiceResult<T> = Result<T, ServiceError>;
pub type RegistryResult<T> = Result<T, RegistryError>;

impl From<SensorError> for tonic::Status {
    fn from(error: SensorError) -> Self {
        let message = error.to_string();
        match error {
            SensorError::UnknownValue { .. }
            | SensorError::UnsupportedBufType { .. }
            | SensorError::UnsupportedFrameRate { .. }
            | SensorError::UnsupportedFormat { .. }
            | SensorError::IndexOutOfRange { .. }
            | SensorError::IncompleteQuery { .. } => tonic::Status::invalid_argument(message),
            SensorError::RegisterAccess { .. }
            | SensorError::TableDownload { .. }
            | SensorError::Gpio(_)
            | SensorError::PinError { .. }
            | SensorError::BusNotFound { .. }
            | SensorError::BusOpen { .. } => tonic::Status::unavailable(message),
            _ => tonic::Status::internal(message),
        }
    }
}

impl From<ServiceError> for tonic::Status {
    fn from(error: ServiceError) -> Self {
        let message = error.to_string();
        match error {
            ServiceError::SubdevNotFound { .. } => tonic::Status::not_found(message),
            ServiceError::AlreadyRegistered { .. } => tonic::Status::already_exists(message),
            ServiceError::InvalidRequest { .. } => tonic::Status::invalid_argument(message),
            _ => tonic::Status::internal(message),
        }
    }
}
