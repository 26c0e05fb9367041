//! Expression trees.

use serde::{Deserialize, Serialize};

use crate::model::Value;

/// A constant in compiled code. Object references cannot be literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Real(r) => Value::Real(*r),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

/// Collection iterators with a bound iterator variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IteratorKind {
    Select,
    Reject,
    Collect,
    Exists,
    ForAll,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Literal {
        value: Literal,
    },
    Variable {
        name: String,
    },
    /// Navigation of a structural feature; on collections, collects over the items.
    Feature {
        source: Box<Expression>,
        feature: String,
    },
    /// Built-in operation applied to a receiver.
    Call {
        source: Box<Expression>,
        operation: String,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
    Iterate {
        source: Box<Expression>,
        iterator: IteratorKind,
        variable: String,
        body: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    Let {
        variable: String,
        value: Box<Expression>,
        body: Box<Expression>,
    },
    Sequence {
        #[serde(default)]
        items: Vec<Expression>,
    },
    /// Invocation of a template or query of the enclosing module.
    Invoke {
        element: String,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::Literal {
            value: value.into().0,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    pub fn feature(self, feature: impl Into<String>) -> Self {
        Self::Feature {
            source: Box::new(self),
            feature: feature.into(),
        }
    }

    pub fn call(self, operation: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::Call {
            source: Box::new(self),
            operation: operation.into(),
            arguments,
        }
    }

    pub fn iterate(
        self,
        iterator: IteratorKind,
        variable: impl Into<String>,
        body: Expression,
    ) -> Self {
        Self::Iterate {
            source: Box::new(self),
            iterator,
            variable: variable.into(),
            body: Box::new(body),
        }
    }

    pub fn invoke(element: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::Invoke {
            element: element.into(),
            arguments,
        }
    }
}

/// Conversion helper for [`Expression::literal`].
#[derive(Debug)]
pub struct LiteralValue(Literal);

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self(Literal::String(value.to_string()))
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self(Literal::Integer(value))
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self(Literal::Real(value))
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self(Literal::Bool(value))
    }
}

impl From<Literal> for LiteralValue {
    fn from(value: Literal) -> Self {
        Self(value)
    }
}
