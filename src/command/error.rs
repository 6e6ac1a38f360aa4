#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownCommand { token: String },
    Usage(&'static str),
    InvalidKeyValue { input: String },
}

impl CommandError {
    /// Usage errors are hints rather than failures and only replace the status.
    pub fn is_usage(&self) -> bool {
        matches!(self, CommandError::Usage(_))
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::UnknownCommand { token } => write!(f, "unknown command: {token}"),
            CommandError::Usage(usage) => f.write_str(usage),
            CommandError::InvalidKeyValue { input } => {
                write!(f, "invalid key=value format: {input}")
            }
        }
    }
}

impl std::error::Error for CommandError {}
