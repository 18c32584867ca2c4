//! Grammar analyzer (component 4.5): computes `consumesInput` for every
//! rule under a reached-marker scheme that doubles as left-recursion
//! detection, and separately flags unused/undefined rules (4.9).
//!
//! This is advisory: its output is a [`crate::diagnostics::Diagnostics`]
//! plus a `consumes: Vec<bool>` table the rule emitter consults for the
//! "safety optimization" in 4.4 step 2. It never blocks emission.

use crate::{
    ast::{Grammar, Node, RuleId, RuleRef},
    diagnostics::Diagnostics,
};

/// Result of running the analyzer once over a grammar.
pub struct Analysis {
    /// `consumes[id]` is true iff every successful parse of rule `id`
    /// advances the cursor by at least one symbol.
    pub consumes: Vec<bool>,
    pub diagnostics: Diagnostics,
}

/// Runs the full analysis pass described in 4.5 and 4.9: `consumesInput`
/// for every rule (with left-recursion detection as a side effect), plus
/// unused- and undefined-rule detection.
pub fn analyze(grammar: &mut Grammar) -> Analysis {
    let mut diagnostics = Diagnostics::new();
    let mut consumes = vec![false; grammar.rules.len()];

    mark_used(grammar);
    for rule in &grammar.rules {
        if !rule.flags.used && Some(rule.id) != grammar.start {
            diagnostics.warn(format!("rule '{}' defined but not used", rule.name));
        }
    }
    check_undefined(grammar, &mut diagnostics);

    for id in 0..grammar.rules.len() {
        consumes[id] = consumes_input_rule(grammar, id, &mut diagnostics);
    }

    debug_assert!(grammar.rules.iter().all(|r| !r.flags.reached), "Reached flag must be clear outside analysis");

    Analysis { consumes, diagnostics }
}

/// Sets `RuleFlags::used` on every rule reachable through a `Name` node
/// anywhere in the grammar. Computing it here, rather than while the
/// front end resolves references, keeps rule-table mutation in one
/// place and gives the same answer regardless of front end.
fn mark_used(grammar: &mut Grammar) {
    let mut used = vec![false; grammar.rules.len()];
    for rule in &grammar.rules {
        if let Some(expr) = &rule.expression {
            walk_names(expr, &mut |target| {
                if let RuleRef::Resolved(id) = target {
                    used[*id] = true;
                }
            });
        }
    }
    for (id, rule) in grammar.rules.iter_mut().enumerate() {
        rule.flags.used = used[id];
    }
}

fn check_undefined(grammar: &Grammar, diagnostics: &mut Diagnostics) {
    for rule in &grammar.rules {
        if let Some(expr) = &rule.expression {
            walk_names(expr, &mut |target| {
                if let RuleRef::Undefined(name) = target {
                    diagnostics.warn(format!("rule '{name}' used but not defined (referenced from '{}')", rule.name));
                }
            });
        }
    }
}

fn walk_names<'a>(node: &'a Node, visit: &mut impl FnMut(&'a RuleRef)) {
    match node {
        Node::Name { target, .. } => visit(target),
        Node::Dot | Node::Character(_) | Node::Str { .. } | Node::Class { .. } | Node::Action { .. } | Node::Inline(_) | Node::Predicate(_) => {}
        Node::Error { element, .. } => walk_names(element, visit),
        Node::Alternate(children) | Node::Sequence(children) => {
            for c in children {
                walk_names(c, visit);
            }
        }
        Node::PeekFor(e) | Node::PeekNot(e) | Node::Query(e) | Node::Star(e) | Node::Plus(e) => walk_names(e, visit),
    }
}

/// `consumesInput` for a whole rule, with the Reached-flag left-recursion
/// probe from 4.5's last bullet.
fn consumes_input_rule(grammar: &mut Grammar, id: RuleId, diagnostics: &mut Diagnostics) -> bool {
    if grammar.rules[id].flags.reached {
        diagnostics.warn(format!("possible infinite left recursion in rule '{}'", grammar.rules[id].name));
        return false;
    }
    grammar.rules[id].flags.reached = true;
    let expr = grammar.rules[id].expression.clone();
    let result = match &expr {
        Some(expr) => consumes_input_node(grammar, expr, diagnostics),
        None => false,
    };
    grammar.rules[id].flags.reached = false;
    result
}

fn consumes_input_node(grammar: &mut Grammar, node: &Node, diagnostics: &mut Diagnostics) -> bool {
    match node {
        Node::Dot | Node::Class { .. } => true,
        Node::Character(_) => true,
        Node::Str { value, .. } => !value.is_empty(),
        Node::Action { .. } | Node::Inline(_) | Node::Predicate(_) => false,
        Node::PeekFor(_) | Node::PeekNot(_) | Node::Query(_) | Node::Star(_) => false,
        Node::Name { target, .. } => match target {
            RuleRef::Resolved(target_id) => consumes_input_rule(grammar, *target_id, diagnostics),
            RuleRef::Undefined(_) => false,
        },
        Node::Error { element, .. } => consumes_input_node(grammar, element, diagnostics),
        Node::Plus(element) => consumes_input_node(grammar, element, diagnostics),
        Node::Alternate(children) => children.iter().all(|c| consumes_input_node(grammar, c, diagnostics)),
        Node::Sequence(children) => children.iter().any(|c| consumes_input_node(grammar, c, diagnostics)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, RuleRef};

    fn seq(nodes: Vec<Node>) -> Node {
        Node::Sequence(nodes)
    }

    #[test]
    fn string_and_class_consume() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Str { value: "ab".into(), case_fold: false });
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(analysis.consumes[a]);
    }

    #[test]
    fn star_never_consumes() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Star(Box::new(Node::Character('a'))));
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(!analysis.consumes[a]);
    }

    #[test]
    fn sequence_consumes_if_any_element_does() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(seq(vec![Node::Query(Box::new(Node::Character('a'))), Node::Character('b')]));
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(analysis.consumes[a]);
    }

    #[test]
    fn alternate_consumes_only_if_every_branch_does() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Alternate(vec![Node::Character('a'), Node::Query(Box::new(Node::Character('b')))]));
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(!analysis.consumes[a]);
    }

    #[test]
    fn left_recursion_is_flagged_and_does_not_hang() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        // A <- A "x" / "y"
        g.rule_mut(a).expression = Some(Node::Alternate(vec![
            seq(vec![Node::Name { target: RuleRef::Resolved(a), variable: None }, Node::Character('x')]),
            Node::Character('y'),
        ]));
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(analysis.diagnostics.iter().any(|d| d.message.contains("left recursion")));
    }

    #[test]
    fn undefined_rule_reference_is_a_warning_not_a_panic() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Name { target: RuleRef::Undefined("missing".into()), variable: None });
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(analysis.diagnostics.iter().any(|d| d.message.contains("not defined")));
    }

    #[test]
    fn unused_non_start_rule_is_flagged() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        let b = g.declare_rule("B");
        g.rule_mut(a).expression = Some(Node::Character('a'));
        g.rule_mut(b).expression = Some(Node::Character('b'));
        g.set_start(a);
        let analysis = analyze(&mut g);
        assert!(analysis.diagnostics.iter().any(|d| d.message.contains("'B' defined but not used")));
    }
}
