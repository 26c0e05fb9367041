//! Template body statements.

use serde::{Deserialize, Serialize};

use super::Expression;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Static text.
    Text { value: String },
    /// Evaluate and emit the text form of the result.
    Expression { expression: Expression },
    If {
        condition: Expression,
        #[serde(default)]
        then_branch: Vec<Statement>,
        #[serde(default)]
        else_branch: Vec<Statement>,
    },
    For {
        variable: String,
        source: Expression,
        #[serde(default)]
        body: Vec<Statement>,
        /// Emitted between iterations.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
    },
    Let {
        variable: String,
        value: Expression,
        #[serde(default)]
        body: Vec<Statement>,
    },
    /// Redirect the body's text into the output resource named by `url`.
    File {
        url: Expression,
        #[serde(default)]
        body: Vec<Statement>,
    },
    /// A region whose content survives regeneration under the merge strategy.
    Protected {
        id: Expression,
        /// Written before each marker, usually a line comment such as `// `.
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn expr(expression: Expression) -> Self {
        Self::Expression { expression }
    }
}
