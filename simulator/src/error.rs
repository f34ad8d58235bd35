use std::{error::Error, fmt};

#[derive(Debug)]
pub enum SimulatorError {
    ConfigError(String),
    NetworkError(String),
    RequestError(String),
    UnsupportedMethod(String),
    OutputError(String),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SimulatorError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SimulatorError::RequestError(msg) => write!(f, "Request error: {}", msg),
            SimulatorError::UnsupportedMethod(method) => {
                write!(f, "Unhandled method '{}'", method)
            }
            SimulatorError::OutputError(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl Error for SimulatorError {}
