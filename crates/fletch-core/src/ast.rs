//! The grammar AST handed to this crate by a front end.
//!
//! A [`Grammar`] owns a flat table of [`Rule`]s. Everything else
//! (`Name` targets, the global action list) refers back into that table
//! by index rather than by pointer, so the tree is plain data: cheap to
//! clone, trivial to serialize, and safe to walk without lifetimes.

use std::collections::HashMap;

/// Index into [`Grammar::rules`]. Stable for the lifetime of a `Grammar`.
pub type RuleId = usize;

/// A reference to a rule from a `Name` node. `Undefined` is kept (rather
/// than rejected at construction) so that codegen can proceed and report
/// the dangling reference as a diagnostic, per the "rule used but not
/// defined" failure mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleRef {
    Resolved(RuleId),
    Undefined(String),
}

/// `used` marks rules reachable from the start rule; `reached` is a
/// transient marker used only during left-recursion analysis: it must be
/// `false` on every rule before and after a full `analyze()` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleFlags {
    pub used: bool,
    pub reached: bool,
}

/// A declared local semantic variable, e.g. the `x` in `x:some_rule`.
/// `offset` is assigned by the rule emitter (negative, stack-relative)
/// and is meaningless before emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub offset: i32,
}

/// One node of a grammar expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Match any one input symbol.
    Dot,
    /// Invoke another rule. `variable` is an index into the *owning
    /// rule's* `variables` list, set when the front end saw `x:name`.
    Name { target: RuleRef, variable: Option<usize> },
    /// Match one literal symbol.
    Character(char),
    /// Match a literal sequence, optionally case-folded.
    Str { value: String, case_fold: bool },
    /// Match one symbol against a character class. `raw` is the class
    /// body exactly as written (minus the enclosing brackets), handed to
    /// [`crate::charclass`] at emission time.
    Class { raw: String },
    /// Register a deferred action. `id` indexes [`Grammar::actions`].
    Action { id: usize },
    /// Evaluate action text unconditionally, inline, during matching.
    Inline(String),
    /// Guard: fail to the caller's label if this boolean expression text
    /// evaluates false at runtime.
    Predicate(String),
    /// Recovery: if `element` fails, run `handler` before failing onward.
    Error { element: Box<Node>, handler: String },
    /// Ordered choice. Never empty.
    Alternate(Vec<Node>),
    /// Concatenation. Never empty.
    Sequence(Vec<Node>),
    /// `&e` — succeed iff `e` would succeed; consumes nothing.
    PeekFor(Box<Node>),
    /// `!e` — succeed iff `e` would fail; consumes nothing.
    PeekNot(Box<Node>),
    /// `e?`
    Query(Box<Node>),
    /// `e*`
    Star(Box<Node>),
    /// `e+`
    Plus(Box<Node>),
}

/// A single semantic action, indexed from [`Grammar::actions`] and
/// referenced by [`Node::Action`]. Kept in discovery order so the driver
/// can emit one trampoline per action, in that order (4.6 step 6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDef {
    pub text: String,
    pub owner: RuleId,
    pub line: u32,
}

/// A named production.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub id: RuleId,
    pub expression: Option<Node>,
    pub flags: RuleFlags,
    pub variables: Vec<Variable>,
}

/// The rule table: owns every `Rule` (and, through them, every
/// expression subtree), plus the grammar-wide action list and the start
/// rule.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub rules: Vec<Rule>,
    pub actions: Vec<ActionDef>,
    pub start: Option<RuleId>,
    by_name: HashMap<String, RuleId>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a rule by name, returning its id. Declaring the same
    /// name twice returns the existing id without creating a new rule;
    /// callers that need redefinition diagnostics must check for that
    /// themselves before calling this (the front end does).
    pub fn declare_rule(&mut self, name: &str) -> RuleId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.rules.len();
        self.rules.push(Rule { name: name.to_string(), id, expression: None, flags: RuleFlags::default(), variables: Vec::new() });
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id]
    }

    pub fn set_start(&mut self, id: RuleId) {
        self.start = Some(id);
    }

    /// Appends an action to the global list and returns its id.
    pub fn push_action(&mut self, text: String, owner: RuleId, line: u32) -> usize {
        let id = self.actions.len();
        self.actions.push(ActionDef { text, owner, line });
        id
    }
}
