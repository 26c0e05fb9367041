//! Error taxonomy for evaluation requests.

use crate::binder::BindingError;
use crate::generation::GenerationError;

/// Why an evaluation did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No compiled form was supplied for the request.
    #[error("unresolved compilation issue{}", format_messages(.messages))]
    UnresolvedCompilation { messages: Vec<String> },

    #[error(transparent)]
    MissingArgument(#[from] BindingError),

    #[error(
        "undefined operation '{operation}({})' on {operand_type}",
        .argument_types.join(", ")
    )]
    UndefinedOperation {
        operation: String,
        argument_types: Vec<String>,
        operand_type: String,
    },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("no element '{name}' taking {arity} argument(s) in module '{module}'")]
    UnknownElement {
        module: String,
        name: String,
        arity: usize,
    },

    #[error("module '{module}' declares no main template")]
    NoMainTemplate { module: String },

    #[error("{construct} expects a Boolean, got {actual}")]
    TypeMismatch { construct: String, actual: String },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("traceability error: {0}")]
    Trace(#[from] tracegen_trace::TraceError),

    /// Cooperative cancellation observed at an invocation boundary.
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn undefined(
        operation: impl Into<String>,
        argument_types: Vec<String>,
        operand_type: impl Into<String>,
    ) -> Self {
        Self::UndefinedOperation {
            operation: operation.into(),
            argument_types,
            operand_type: operand_type.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn format_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join("; "))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
