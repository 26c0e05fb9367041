//! Matching of formal parameters against named variables and positional targets.
//!
//! For each parameter in declaration order:
//!
//! 1. a named variable with exactly the parameter's name is bound and removed from
//!    the pool, so it cannot satisfy a later parameter;
//! 2. otherwise the next target object is bound and the cursor advances;
//! 3. otherwise the parameter is unresolved and the [`MissingArgumentPolicy`]
//!    decides between failing and binding `Null`.
//!
//! Binding takes exactly one step per parameter and never revisits consumed input.

use crate::compiled::Parameter;
use crate::config::MissingArgumentPolicy;
use crate::model::Value;

/// A caller-supplied `(name, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedVariable {
    pub name: String,
    pub value: Value,
}

impl NamedVariable {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("missing argument for parameter '{parameter}' of '{element}'")]
    MissingArgument { parameter: String, element: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentBinder {
    policy: MissingArgumentPolicy,
}

impl ArgumentBinder {
    pub fn new(policy: MissingArgumentPolicy) -> Self {
        Self { policy }
    }

    /// Produce one argument per parameter of `element`.
    ///
    /// Matched variables are removed from `variables`; `targets` is advanced past
    /// every object bound positionally. Leftover targets are not consumed.
    pub fn bind<I>(
        &self,
        element: &str,
        parameters: &[Parameter],
        variables: &mut Vec<NamedVariable>,
        targets: &mut I,
    ) -> Result<Vec<Value>, BindingError>
    where
        I: Iterator<Item = Value>,
    {
        let mut arguments = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            if let Some(pos) = variables.iter().position(|v| v.name == parameter.name) {
                arguments.push(variables.remove(pos).value);
                continue;
            }

            if let Some(target) = targets.next() {
                arguments.push(target);
                continue;
            }

            match self.policy {
                MissingArgumentPolicy::Fail => {
                    return Err(BindingError::MissingArgument {
                        parameter: parameter.name.clone(),
                        element: element.to_string(),
                    });
                }
                MissingArgumentPolicy::SubstituteNull => {
                    tracing::warn!(
                        element = %element,
                        parameter = %parameter.name,
                        "No argument for parameter, binding null"
                    );
                    arguments.push(Value::Null);
                }
            }
        }

        Ok(arguments)
    }
}
