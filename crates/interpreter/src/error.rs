#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpreterError {
    #[error("missing arguments: {}", .0.join(", "))]
    MissingArguments(Vec<String>),

    #[error("argument `{name}` expected {expected}")]
    ArgumentType {
        name: String,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, InterpreterError>;
