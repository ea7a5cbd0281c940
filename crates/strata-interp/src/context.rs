//! Execution context: variable frames and the current-object stack.
//!
//! A frame is pushed for every scope-introducing node and sized from the
//! node's declared locals. Method frames are lookup boundaries: an
//! unqualified variable lookup stops at the innermost one unless it asks
//! for a global lookup.

use smallvec::SmallVec;
use strata_solver::{TypeDatabase, TypeId, is_subtype_of};
use tracing::trace;

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::Value;

#[derive(Debug, Default)]
struct Frame {
    vars: SmallVec<[(String, Value); 4]>,
    method_frame: bool,
}

impl Frame {
    fn with_capacity(size: usize, method_frame: bool) -> Self {
        Frame {
            vars: SmallVec::with_capacity(size),
            method_frame,
        }
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|(n, _)| n == name)
    }
}

#[derive(Debug, Default)]
pub struct ExecutionContext {
    frames: Vec<Frame>,
    /// `this` of every active call, innermost last. Static calls push the
    /// type they run in.
    current_objects: Vec<Value>,
    /// Set by `return` before the `Return` result propagates.
    pub current_return_value: Option<Value>,
    /// Target label of the propagating `break`/`continue`.
    pub current_label: Option<String>,
    output: String,
}

impl ExecutionContext {
    pub fn new() -> Self {
        ExecutionContext::default()
    }

    pub fn push_frame(&mut self, size: usize, method_frame: bool) {
        self.frames.push(Frame::with_capacity(size, method_frame));
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Define `name` in the innermost frame. Shadowing an outer frame is
    /// allowed; redefining within the same frame is not. The caller owns the
    /// frame: defining with no frame pushed is an error.
    pub fn define_variable(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(RuntimeError::NoFrame {
                name: name.to_string(),
            });
        };
        if frame.slot(name).is_some() {
            return Err(RuntimeError::DuplicateDefinition {
                name: name.to_string(),
            });
        }
        frame.vars.push((name.to_string(), value));
        Ok(())
    }

    fn locate(&self, name: &str, global: bool) -> Option<(usize, usize)> {
        for (depth, frame) in self.frames.iter().enumerate().rev() {
            if let Some(slot) = frame.slot(name) {
                return Some((depth, slot));
            }
            if frame.method_frame && !global {
                break;
            }
        }
        None
    }

    pub fn get_variable(&self, name: &str, global: bool) -> Option<&Value> {
        self.locate(name, global)
            .map(|(depth, slot)| &self.frames[depth].vars[slot].1)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let Some((depth, slot)) = self.locate(name, false) else {
            return Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
            });
        };
        self.frames[depth].vars[slot].1 = value;
        Ok(())
    }

    /// Every variable visible from the innermost frame, innermost binding
    /// winning. Lambdas capture these.
    pub fn visible_variables(&self) -> Vec<(String, Value)> {
        let mut out: Vec<(String, Value)> = Vec::new();
        for frame in self.frames.iter().rev() {
            for (name, value) in &frame.vars {
                if !out.iter().any(|(n, _)| n == name) {
                    out.push((name.clone(), value.clone()));
                }
            }
            if frame.method_frame {
                break;
            }
        }
        out
    }

    pub fn push_current_object(&mut self, value: Value) {
        self.current_objects.push(value);
    }

    pub fn pop_current_object(&mut self) {
        self.current_objects.pop();
    }

    pub fn current_object(&self) -> Option<&Value> {
        self.current_objects.last()
    }

    /// `this` of the current call followed `hops` enclosing-instance links
    /// outward.
    pub fn this_at(&self, hops: u32) -> RuntimeResult<Value> {
        let mut current = match self.current_object() {
            Some(Value::Type(_)) | None => {
                return Err(RuntimeError::NoEnclosingInstance {
                    wanted: "this".to_string(),
                    visible: "static context".to_string(),
                });
            }
            Some(value) => value.clone(),
        };
        for _ in 0..hops {
            let outer = match &current {
                Value::Object(obj) => obj.borrow().outer.clone(),
                _ => None,
            };
            current = outer.ok_or_else(|| RuntimeError::NoEnclosingInstance {
                wanted: format!("this ({hops} levels out)"),
                visible: "no enclosing instance".to_string(),
            })?;
        }
        Ok(current)
    }

    /// Innermost object, searching the current objects and their enclosing
    /// instances, whose class is `wanted` or a subclass of it.
    pub fn find_this_type(&self, db: &dyn TypeDatabase, wanted: TypeId) -> RuntimeResult<Value> {
        let mut visible: Vec<String> = Vec::new();
        for start in self.current_objects.iter().rev() {
            let mut current = Some(start.clone());
            while let Some(value) = current {
                let class = value.runtime_type(db).class_id();
                if let Some(class) = class {
                    if !matches!(value, Value::Type(_)) && is_subtype_of(db, class, wanted) {
                        trace!(wanted = db.type_name(wanted), "find_this_type");
                        return Ok(value);
                    }
                    let name = db.type_name(class).to_string();
                    if !visible.contains(&name) {
                        visible.push(name);
                    }
                }
                current = match &value {
                    Value::Object(obj) => obj.borrow().outer.clone(),
                    _ => None,
                };
            }
        }
        Err(RuntimeError::NoEnclosingInstance {
            wanted: db.type_name(wanted).to_string(),
            visible: visible.join(", "),
        })
    }

    pub fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Text written by `System.out`.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod tests;
