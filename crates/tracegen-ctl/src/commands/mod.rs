//! Command handlers for tracegen-ctl.
//!
//! Each module handles one subcommand. Inputs are loaded once per invocation
//! into a [`Session`].

pub(crate) mod elements;
pub(crate) mod eval;
pub(crate) mod generate;
pub(crate) mod trace;

pub(crate) use elements::handle_elements_command;
pub(crate) use eval::handle_eval_command;
pub(crate) use generate::handle_generate_command;
pub(crate) use trace::handle_trace_command;

use std::sync::Arc;

use tracegen_engine::{ModelSet, Module, NamedVariable, ObjectId};

use crate::loader;
use crate::InputArgs;

/// A compiled module plus the models, targets and variables it runs against.
#[derive(Debug)]
pub(crate) struct Session {
    pub module: Arc<Module>,
    pub models: Arc<ModelSet>,
    pub targets: Vec<ObjectId>,
    pub variables: Vec<NamedVariable>,
}

impl Session {
    pub(crate) fn load(input: &InputArgs) -> anyhow::Result<Self> {
        let module = loader::load_module(&input.module)?;
        let models = loader::load_models(&input.models)?;
        let targets = loader::resolve_targets(&models, &input.targets)?;
        let variables = loader::parse_variables(&models, &input.variables)?;
        Ok(Self {
            module: Arc::new(module),
            models: Arc::new(models),
            targets,
            variables,
        })
    }
}
