//! Tree-walking evaluation of templates, queries and expressions.
//!
//! Every module-element invocation pushes a [`Frame`]; text emitted while a frame
//! is innermost is attributed to that frame's element. Feature navigations made
//! while an `expression` statement evaluates are collected by an input recorder
//! and attached to the span that statement emits.

pub(crate) mod operations;

use std::collections::HashMap;
use std::sync::Arc;

use tracegen_trace::{InputElementId, ModuleElementId};

use crate::binder::ArgumentBinder;
use crate::cancel::CancellationFlag;
use crate::compiled::{Expression, IteratorKind, Module, ModuleElement, Statement, Template};
use crate::error::{EngineError, EngineResult};
use crate::generation::{protected, Emitter};
use crate::model::{ModelSet, ObjectId, Value};

#[derive(Debug)]
struct Frame {
    module: Arc<Module>,
    /// `None` for a free-standing expression.
    element: Option<ModuleElementId>,
    scopes: Vec<HashMap<String, Value>>,
    context: Vec<ObjectId>,
}

impl Frame {
    fn new(
        module: Arc<Module>,
        element: Option<ModuleElementId>,
        bindings: HashMap<String, Value>,
        context: Option<ObjectId>,
    ) -> Self {
        Self {
            module,
            element,
            scopes: vec![bindings],
            context: context.into_iter().collect(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

#[derive(Debug)]
pub(crate) struct Interpreter<'a> {
    models: &'a ModelSet,
    binder: ArgumentBinder,
    cancel: &'a CancellationFlag,
    emitter: Emitter,
    frames: Vec<Frame>,
    recorders: Vec<Vec<InputElementId>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        models: &'a ModelSet,
        binder: ArgumentBinder,
        cancel: &'a CancellationFlag,
        emitter: Emitter,
    ) -> Self {
        Self {
            models,
            binder,
            cancel,
            emitter,
            frames: Vec::new(),
            recorders: Vec::new(),
        }
    }

    pub fn binder(&self) -> ArgumentBinder {
        self.binder
    }

    pub fn into_emitter(self) -> Emitter {
        self.emitter
    }

    /// Run element `index` of `module` with already-bound arguments.
    ///
    /// Templates evaluate to `Null`; queries to their body's value.
    pub fn invoke(
        &mut self,
        module: Arc<Module>,
        index: usize,
        arguments: Vec<Value>,
    ) -> EngineResult<Value> {
        if self.cancel.is_cancelled() {
            tracing::debug!(module = %module.name, "Cancellation observed at invocation boundary");
            return Err(EngineError::Cancelled);
        }
        let Some(element) = module.elements.get(index) else {
            return Err(EngineError::UnknownElement {
                module: module.name.clone(),
                name: format!("#{index}"),
                arity: arguments.len(),
            });
        };

        let parameters: Vec<&str> = element
            .parameters()
            .iter()
            .map(|p| p.type_name.as_str())
            .collect();
        let trace = self.emitter.trace_mut();
        let trace_id = trace.module_element(
            &module.location,
            element.name(),
            &parameters,
            element.kind(),
        );
        tracing::debug!(
            module = %module.name,
            element = %element.name(),
            arguments = arguments.len(),
            "Invoking module element"
        );

        let context = arguments.iter().find_map(Value::as_object);
        let bindings = element
            .parameters()
            .iter()
            .map(|p| p.name.clone())
            .zip(arguments)
            .collect();
        let frame = Frame::new(Arc::clone(&module), Some(trace_id), bindings, context);
        self.frames.push(frame);

        let result = match element {
            ModuleElement::Template(template) => {
                self.run_template(template).map(|()| Value::Null)
            }
            ModuleElement::Query(query) => self.eval(&query.body),
        };
        self.frames.pop();
        result
    }

    /// Evaluate a free-standing expression in a fresh frame holding `bindings`.
    pub fn evaluate_in(
        &mut self,
        module: Arc<Module>,
        bindings: HashMap<String, Value>,
        expression: &Expression,
    ) -> EngineResult<Value> {
        let context = bindings.get("self").and_then(Value::as_object);
        let frame = Frame::new(module, None, bindings, context);
        self.frames.push(frame);
        let result = self.eval(expression);
        self.frames.pop();
        result
    }

    fn run_template(&mut self, template: &Template) -> EngineResult<()> {
        if let Some(guard) = &template.guard {
            if !self.condition(guard, "template guard")? {
                tracing::debug!(template = %template.name, "Guard not satisfied, nothing emitted");
                return Ok(());
            }
        }
        self.exec_block(&template.body)
    }

    fn exec_block(&mut self, statements: &[Statement]) -> EngineResult<()> {
        for statement in statements {
            self.exec(statement)?;
        }
        Ok(())
    }

    fn exec(&mut self, statement: &Statement) -> EngineResult<()> {
        match statement {
            Statement::Text { value } => self.emit_in_context(value),
            Statement::Expression { expression } => {
                self.recorders.push(Vec::new());
                let value = self.eval(expression);
                let inputs = self.recorders.pop().unwrap_or_default();
                let text = value?.to_text(self.models);
                if inputs.is_empty() {
                    self.emit_in_context(&text)
                } else {
                    self.emit(&text, &inputs)
                }
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition, "if")? {
                    self.exec_block(then_branch)
                } else {
                    self.exec_block(else_branch)
                }
            }
            Statement::For {
                variable,
                source,
                body,
                separator,
            } => {
                let items = self.eval(source)?.into_items();
                for (i, item) in items.into_iter().enumerate() {
                    if i > 0 {
                        if let Some(separator) = separator {
                            self.emit_in_context(separator)?;
                        }
                    }
                    let context = item.as_object();
                    self.with_scope(variable, item, context, |this| this.exec_block(body))?;
                }
                Ok(())
            }
            Statement::Let {
                variable,
                value,
                body,
            } => {
                let value = self.eval(value)?;
                self.with_scope(variable, value, None, |this| this.exec_block(body))
            }
            Statement::File { url, body } => {
                let location = self.eval(url)?.to_text(self.models);
                self.emitter.open_file(&location)?;
                self.exec_block(body)?;
                self.emitter.close_file()
            }
            Statement::Protected { id, prefix, body } => self.exec_protected(id, prefix, body),
        }
    }

    fn exec_protected(
        &mut self,
        id: &Expression,
        prefix: &str,
        body: &[Statement],
    ) -> EngineResult<()> {
        let id = self.eval(id)?.to_text(self.models);
        let markers = self.emitter.markers().clone();

        self.emit_in_context(&protected::start_line(prefix, &markers, &id))?;
        match self.emitter.preserved_region(&id) {
            Some(preserved) => {
                tracing::debug!(id = %id, "Preserved protected region");
                self.emit(&preserved, &[])?;
            }
            None => self.exec_block(body)?,
        }
        if !self.emitter.at_line_start() {
            self.emit_in_context("\n")?;
        }
        self.emit_in_context(&protected::end_line(prefix, &markers))
    }

    fn eval(&mut self, expression: &Expression) -> EngineResult<Value> {
        match expression {
            Expression::Literal { value } => Ok(Value::from(value)),
            Expression::Variable { name } => self.lookup(name),
            Expression::Feature { source, feature } => {
                let source = self.eval(source)?;
                self.navigate(source, feature)
            }
            Expression::Call {
                source,
                operation,
                arguments,
            } => {
                let receiver = self.eval(source)?;
                let arguments = self.eval_all(arguments)?;
                operations::apply(self.models, operation, receiver, arguments)
            }
            Expression::Iterate {
                source,
                iterator,
                variable,
                body,
            } => {
                let items = self.eval(source)?.into_items();
                self.iterate(items, *iterator, variable, body)
            }
            Expression::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition, "if")? {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
            Expression::Let {
                variable,
                value,
                body,
            } => {
                let value = self.eval(value)?;
                self.with_scope(variable, value, None, |this| this.eval(body))
            }
            Expression::Sequence { items } => Ok(Value::Collection(self.eval_all(items)?)),
            Expression::Invoke { element, arguments } => {
                let arguments = self.eval_all(arguments)?;
                self.invoke_by_name(element, arguments)
            }
        }
    }

    fn eval_all(&mut self, expressions: &[Expression]) -> EngineResult<Vec<Value>> {
        expressions.iter().map(|e| self.eval(e)).collect()
    }

    fn condition(&mut self, expression: &Expression, construct: &str) -> EngineResult<bool> {
        match self.eval(expression)? {
            Value::Bool(b) => Ok(b),
            other => Err(EngineError::TypeMismatch {
                construct: construct.to_string(),
                actual: other.type_name(self.models),
            }),
        }
    }

    fn lookup(&self, name: &str) -> EngineResult<Value> {
        self.frames
            .last()
            .and_then(|frame| frame.lookup(name))
            .cloned()
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
    }

    fn with_scope<T>(
        &mut self,
        name: &str,
        value: Value,
        context: Option<ObjectId>,
        body: impl FnOnce(&mut Self) -> EngineResult<T>,
    ) -> EngineResult<T> {
        if let Some(frame) = self.frames.last_mut() {
            let scope = HashMap::from([(name.to_string(), value)]);
            frame.scopes.push(scope);
            frame.context.extend(context);
        }
        let result = body(self);
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.pop();
            if context.is_some() {
                frame.context.pop();
            }
        }
        result
    }

    fn navigate(&mut self, source: Value, feature: &str) -> EngineResult<Value> {
        match source {
            Value::Object(id) => {
                let Some(value) = self.models.feature(id, feature).cloned() else {
                    return Err(EngineError::undefined(
                        feature,
                        Vec::new(),
                        Value::Object(id).type_name(self.models),
                    ));
                };
                self.record(id, feature);
                Ok(value)
            }
            Value::Collection(items) => {
                let mut collected = Vec::new();
                for item in items {
                    match self.navigate(item, feature)? {
                        Value::Collection(inner) => collected.extend(inner),
                        Value::Null => {}
                        other => collected.push(other),
                    }
                }
                Ok(Value::Collection(collected))
            }
            Value::Null => Ok(Value::Null),
            other => {
                let actual = other.type_name(self.models);
                Err(EngineError::undefined(feature, Vec::new(), actual))
            }
        }
    }

    fn iterate(
        &mut self,
        items: Vec<Value>,
        kind: IteratorKind,
        variable: &str,
        body: &Expression,
    ) -> EngineResult<Value> {
        let mut kept = Vec::new();
        for item in items {
            if kind == IteratorKind::Collect {
                match self.with_scope(variable, item, None, |this| this.eval(body))? {
                    Value::Collection(inner) => kept.extend(inner),
                    Value::Null => {}
                    other => kept.push(other),
                }
                continue;
            }

            let matched = self.with_scope(variable, item.clone(), None, |this| {
                this.condition(body, "iterator body")
            })?;
            match kind {
                IteratorKind::Select if matched => kept.push(item),
                IteratorKind::Reject if !matched => kept.push(item),
                IteratorKind::Exists if matched => return Ok(Value::Bool(true)),
                IteratorKind::ForAll if !matched => return Ok(Value::Bool(false)),
                IteratorKind::Any if matched => return Ok(item),
                _ => {}
            }
        }

        Ok(match kind {
            IteratorKind::Exists => Value::Bool(false),
            IteratorKind::ForAll => Value::Bool(true),
            IteratorKind::Any => Value::Null,
            IteratorKind::Select | IteratorKind::Reject | IteratorKind::Collect => {
                Value::Collection(kept)
            }
        })
    }

    fn invoke_by_name(&mut self, name: &str, arguments: Vec<Value>) -> EngineResult<Value> {
        let arity = arguments.len();
        let module = self
            .frames
            .last()
            .map(|frame| Arc::clone(&frame.module))
            .ok_or_else(|| EngineError::UnknownElement {
                module: String::new(),
                name: name.to_string(),
                arity,
            })?;
        let unknown = || EngineError::UnknownElement {
            module: module.name.clone(),
            name: name.to_string(),
            arity,
        };
        let index = module.resolve(name, arity).ok_or_else(unknown)?;
        let element = module.elements.get(index).ok_or_else(unknown)?;

        let mut targets = arguments.into_iter();
        let parameters = element.parameters();
        let binder = self.binder;
        let bound = binder.bind(name, parameters, &mut Vec::new(), &mut targets)?;
        self.invoke(Arc::clone(&module), index, bound)
    }

    /// Register `(object, feature)` with the innermost input recorder, if any.
    fn record(&mut self, object: ObjectId, feature: &str) {
        if self.recorders.is_empty() {
            return;
        }
        let input = self.register_input(object, Some(feature));
        if let Some(recorder) = self.recorders.last_mut() {
            recorder.push(input);
        }
    }

    fn register_input(&mut self, object: ObjectId, feature: Option<&str>) -> InputElementId {
        let uri = self.models.uri_of(object);
        self.emitter
            .trace_mut()
            .input_element(self.models.location_of(object), &uri, feature)
    }

    fn current_element(&self) -> Option<ModuleElementId> {
        self.frames.iter().rev().find_map(|frame| frame.element)
    }

    fn emit(&mut self, text: &str, inputs: &[InputElementId]) -> EngineResult<()> {
        let Some(element) = self.current_element() else {
            tracing::debug!("Text emitted outside any module element, discarded");
            return Ok(());
        };
        self.emitter.emit(text, element, inputs)
    }

    /// Emit `text` attributed to the frame's current context object.
    fn emit_in_context(&mut self, text: &str) -> EngineResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let context = self
            .frames
            .last()
            .and_then(|frame| frame.context.last().copied());
        let inputs: Vec<InputElementId> = context
            .map(|object| self.register_input(object, None))
            .into_iter()
            .collect();
        self.emit(text, &inputs)
    }
}
