//! Named per-node scripts
//!
//! Scripts are plain functions registered under a name. Scene files bind them to
//! nodes with `@name`; the update pass runs a node's script before the node's own
//! `update`.

use std::collections::HashMap;

use log::warn;

use super::context::UpdateContext;
use super::node::NodeId;
use super::tree::SceneTree;

pub type ScriptFn = fn(&mut SceneTree, NodeId, &mut UpdateContext<'_>);

/// Typed parameter slot a script can keep state in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptParam {
    Int(i32),
    Float(f32),
    Node(Option<NodeId>),
}

/// A script attached to a node
#[derive(Clone)]
pub struct ScriptBinding {
    pub name: String,
    pub func: ScriptFn,
    pub params: Vec<ScriptParam>,
}

impl ScriptBinding {
    pub fn new(name: impl Into<String>, func: ScriptFn) -> Self {
        Self {
            name: name.into(),
            func,
            params: Vec::new(),
        }
    }

    /// Grows the parameter list to `count` slots, zero-initialised
    pub fn ensure_params(&mut self, count: usize) -> &mut [ScriptParam] {
        if self.params.len() < count {
            self.params.resize(count, ScriptParam::Int(0));
        }
        &mut self.params
    }
}

impl std::fmt::Debug for ScriptBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptBinding")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Script functions by name
#[derive(Default, Clone)]
pub struct ScriptRegistry {
    scripts: HashMap<String, ScriptFn>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, func: ScriptFn) {
        self.scripts.insert(name.into(), func);
    }

    pub fn get(&self, name: &str) -> Option<ScriptFn> {
        self.scripts.get(name).copied()
    }

    /// Binding for `name`, or `None` with a warning when nothing is registered
    pub fn bind(&self, name: &str) -> Option<ScriptBinding> {
        match self.get(name) {
            Some(func) => Some(ScriptBinding::new(name, func)),
            None => {
                warn!("No script registered as '{}'", name);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_tree: &mut SceneTree, _id: NodeId, _ctx: &mut UpdateContext<'_>) {}

    #[test]
    fn test_bind_known_and_unknown() {
        let mut registry = ScriptRegistry::new();
        registry.register("spin", noop);
        assert_eq!(registry.bind("spin").map(|b| b.name), Some("spin".to_owned()));
        assert!(registry.bind("missing").is_none());
    }

    #[test]
    fn test_params_are_zero_initialised() {
        let mut binding = ScriptBinding::new("spin", noop);
        let params = binding.ensure_params(3);
        assert_eq!(params.len(), 3);
        assert!(params.iter().all(|p| *p == ScriptParam::Int(0)));
    }
}
