use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::value::Value;

pub struct EnvironmentCore {
    store: HashMap<Rc<str>, Rc<Value>>,
    outer: Option<Environment>,
}

/// A lexical scope. Closures hold their defining scope strongly, so a closure
/// stored in its own scope forms a cycle; `ScopeTracker` reclaims those.
#[derive(Clone)]
pub struct Environment {
    environment: Rc<RefCell<EnvironmentCore>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            environment: Rc::new(RefCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: None,
            })),
        }
    }

    pub fn new_enclosed(outer: &Environment) -> Environment {
        Environment {
            environment: Rc::new(RefCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: Some(outer.clone()),
            })),
        }
    }

    /// Looks `key` up through the enclosing scopes, then among the builtins.
    pub fn get(&self, key: &str) -> Option<Rc<Value>> {
        self.lookup(key)
            .or_else(|| crate::builtins::map_builtins(key).map(Value::builtin))
    }

    fn lookup(&self, key: &str) -> Option<Rc<Value>> {
        let env = self.environment.borrow();
        env.store
            .get(key)
            .cloned()
            .or_else(|| env.outer.as_ref().and_then(|outer| outer.lookup(key)))
    }

    /// Binds `key` in this scope, shadowing any outer binding.
    pub fn set(&self, key: Rc<str>, value: Rc<Value>) {
        self.environment.borrow_mut().store.insert(key, value);
    }

    /// Replaces the nearest existing binding of `key`. Returns `false` when no
    /// scope binds it.
    pub fn update(&self, key: &str, value: Rc<Value>) -> bool {
        let mut env = self.environment.borrow_mut();
        if let Some(slot) = env.store.get_mut(key) {
            *slot = value;
            return true;
        }
        match &env.outer {
            Some(outer) => outer.update(key, value),
            None => false,
        }
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.environment, &other.environment)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<EnvironmentCore>> {
        Rc::downgrade(&self.environment)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env = self.environment.borrow();
        let mut names: Vec<&str> = env.store.keys().map(|key| key.as_ref()).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("enclosed", &env.outer.is_some())
            .finish()
    }
}

const INITIAL_COLLECTION_THRESHOLD: usize = 1024;

/// Every scope the evaluator creates, so that scopes kept alive only by
/// reference cycles can be found and emptied.
///
/// Collection is trial deletion over the reference counts. Starting from the
/// tracked scopes, the graph of scopes and the values that can hold scopes is
/// walked and every reference found inside it is counted. A node with more
/// strong references than that is held from outside the graph, by the
/// evaluator or the host, and keeps everything it reaches alive. Scopes left
/// unreached are garbage: their bindings are dropped, which breaks the cycles.
pub(crate) struct ScopeTracker {
    scopes: Vec<Weak<RefCell<EnvironmentCore>>>,
    threshold: usize,
}

impl ScopeTracker {
    pub fn new() -> Self {
        ScopeTracker {
            scopes: Vec::new(),
            threshold: INITIAL_COLLECTION_THRESHOLD,
        }
    }

    pub fn track(&mut self, environment: &Environment) {
        self.scopes.push(environment.downgrade());
    }

    /// Number of tracked scopes still alive.
    pub fn live(&mut self) -> usize {
        self.scopes.retain(|scope| scope.strong_count() > 0);
        self.scopes.len()
    }

    /// Collects once the number of tracked scopes doubled since the last
    /// collection.
    pub fn maybe_collect(&mut self) {
        if self.scopes.len() >= self.threshold {
            self.collect();
        }
    }

    /// Empties every tracked scope that is only reachable through cycles and
    /// returns how many there were.
    pub fn collect(&mut self) -> usize {
        let mut graph = Graph::default();
        for scope in &self.scopes {
            if let Some(scope) = scope.upgrade() {
                graph.insert(Node::Scope(scope));
            }
        }
        graph.scan();
        let garbage = graph.garbage_scopes();
        drop(graph);

        let freed = garbage.len();
        for scope in garbage {
            let (store, outer) = match scope.try_borrow_mut() {
                Ok(mut core) => (std::mem::take(&mut core.store), core.outer.take()),
                Err(_) => continue,
            };
            drop(store);
            drop(outer);
        }

        let live = self.live();
        self.threshold = (live * 2).max(INITIAL_COLLECTION_THRESHOLD);
        debug!(freed, live, "collected scopes");
        freed
    }
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Values that can reach a scope. Everything else is a leaf and is skipped.
fn holds_references(value: &Value) -> bool {
    matches!(
        value,
        Value::List(_) | Value::Tuple(_) | Value::Closure(_) | Value::Builtin(_)
    )
}

fn value_nodes(values: &[Rc<Value>]) -> Vec<Node> {
    values
        .iter()
        .filter(|value| holds_references(value))
        .map(|value| Node::Value(value.clone()))
        .collect()
}

enum Node {
    Scope(Rc<RefCell<EnvironmentCore>>),
    Value(Rc<Value>),
}

impl Node {
    fn key(&self) -> *const () {
        match self {
            Node::Scope(scope) => Rc::as_ptr(scope) as *const (),
            Node::Value(value) => Rc::as_ptr(value) as *const (),
        }
    }

    fn strong_count(&self) -> usize {
        match self {
            Node::Scope(scope) => Rc::strong_count(scope),
            Node::Value(value) => Rc::strong_count(value),
        }
    }

    /// Strong references owned by this node, or `None` when the scope is
    /// borrowed and cannot be inspected.
    fn children(&self) -> Option<Vec<Node>> {
        match self {
            Node::Scope(scope) => {
                let core = scope.try_borrow().ok()?;
                let mut children: Vec<Node> = core
                    .store
                    .values()
                    .filter(|value| holds_references(value))
                    .map(|value| Node::Value(value.clone()))
                    .collect();
                if let Some(outer) = &core.outer {
                    children.push(Node::Scope(outer.environment.clone()));
                }
                Some(children)
            }
            Node::Value(value) => Some(match value.as_ref() {
                Value::List(values) | Value::Tuple(values) => value_nodes(values),
                Value::Closure(closure) => {
                    let mut children = value_nodes(&closure.bound);
                    children.push(Node::Scope(closure.env.environment.clone()));
                    children
                }
                Value::Builtin(builtin) => value_nodes(&builtin.bound),
                _ => Vec::new(),
            }),
        }
    }
}

/// The scanned graph. Holds exactly one strong reference to every node.
#[derive(Default)]
struct Graph {
    nodes: Vec<Node>,
    index: HashMap<*const (), usize>,
    internal: Vec<usize>,
    edges: Vec<Vec<usize>>,
    pinned: Vec<bool>,
}

impl Graph {
    fn insert(&mut self, node: Node) -> usize {
        let key = node.key();
        if let Some(&index) = self.index.get(&key) {
            return index;
        }
        let index = self.nodes.len();
        self.index.insert(key, index);
        self.nodes.push(node);
        self.internal.push(0);
        self.edges.push(Vec::new());
        self.pinned.push(false);
        index
    }

    fn scan(&mut self) {
        let mut next = 0;
        while next < self.nodes.len() {
            match self.nodes[next].children() {
                Some(children) => {
                    for child in children {
                        let index = self.insert(child);
                        self.internal[index] += 1;
                        self.edges[next].push(index);
                    }
                }
                None => self.pinned[next] = true,
            }
            next += 1;
        }
    }

    fn garbage_scopes(&self) -> Vec<Rc<RefCell<EnvironmentCore>>> {
        let mut live = vec![false; self.nodes.len()];
        let mut pending: Vec<usize> = (0..self.nodes.len())
            .filter(|&index| {
                self.pinned[index] || self.nodes[index].strong_count() - 1 > self.internal[index]
            })
            .collect();

        while let Some(index) = pending.pop() {
            if live[index] {
                continue;
            }
            live[index] = true;
            pending.extend(self.edges[index].iter().filter(|&&child| !live[child]));
        }

        self.nodes
            .iter()
            .zip(live)
            .filter_map(|(node, live)| match node {
                Node::Scope(scope) if !live => Some(scope.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use curry_lang_core::ast::Pattern;

    use super::{Environment, ScopeTracker};
    use crate::value::Value;

    fn constant_closure(env: &Environment) -> Rc<Value> {
        Value::closure(Vec::<Pattern>::new().into(), Default::default(), env.clone())
    }

    #[test]
    fn test_lookup_walks_outward() {
        let outer = Environment::new();
        outer.set("a".into(), Value::number(1));
        let inner = Environment::new_enclosed(&outer);
        inner.set("b".into(), Value::number(2));

        assert_eq!(inner.get("a"), Some(Value::number(1)));
        assert_eq!(inner.get("b"), Some(Value::number(2)));
        assert_eq!(outer.get("b"), None);
    }

    #[test]
    fn test_set_shadows_and_update_mutates_nearest() {
        let outer = Environment::new();
        outer.set("x".into(), Value::number(1));
        let inner = Environment::new_enclosed(&outer);

        assert!(inner.update("x", Value::number(2)));
        assert_eq!(outer.get("x"), Some(Value::number(2)));

        inner.set("x".into(), Value::number(3));
        assert!(inner.update("x", Value::number(4)));
        assert_eq!(inner.get("x"), Some(Value::number(4)));
        assert_eq!(outer.get("x"), Some(Value::number(2)));

        assert!(!inner.update("missing", Value::unit()));
    }

    #[test]
    fn test_builtins_are_visible_but_shadowable() {
        let env = Environment::new();
        assert!(matches!(
            env.get("map").as_deref(),
            Some(Value::Builtin(_))
        ));

        env.set("map".into(), Value::number(0));
        assert_eq!(env.get("map"), Some(Value::number(0)));
    }

    #[test]
    fn test_collect_frees_self_referencing_scopes() {
        let mut tracker = ScopeTracker::new();
        let globals = Environment::new();
        tracker.track(&globals);

        let scope = Environment::new_enclosed(&globals);
        tracker.track(&scope);
        let closure = constant_closure(&scope);
        scope.set("f".into(), closure);
        let weak = scope.downgrade();
        drop(scope);

        assert!(weak.upgrade().is_some());
        assert_eq!(tracker.collect(), 1);
        assert!(weak.upgrade().is_none());
        assert_eq!(tracker.live(), 1);
    }

    #[test]
    fn test_collect_keeps_scopes_held_from_outside() {
        let mut tracker = ScopeTracker::new();
        let scope = Environment::new();
        tracker.track(&scope);
        let closure = constant_closure(&scope);
        scope.set("f".into(), closure.clone());
        drop(scope);

        assert_eq!(tracker.collect(), 0);
        assert_eq!(tracker.live(), 1);

        drop(closure);
        assert_eq!(tracker.collect(), 1);
        assert_eq!(tracker.live(), 0);
    }
}
