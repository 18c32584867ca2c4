//! Minimal textual PEG grammar reader.
//!
//! This is ambient plumbing, not the graded back end: it exists only so
//! the `fletch` binary can turn a `.peg` source file into a
//! [`fletch_core::ast::Grammar`] without a hand-rolled lexer/parser.
//! The grammar syntax is deliberately small; see the `parser!` block
//! below for the authoritative definition.
//!
//! ```text
//! rule_name <- expr ;
//! expr      := sequence ('/' sequence)*
//! sequence  := prefix*
//! prefix    := ('&' | '!') suffix | suffix
//! suffix    := primary ('*' | '+' | '?')?
//! primary   := '.' | 'c'           (character)
//!            | "str" | "str"i      (string, optional case-fold)
//!            | '[' class-body ']'  (character class, raw text kept verbatim)
//!            | ident (':' ident)?  (rule reference, optional var binding: x:rule)
//!            | '(' expr ')'
//!            | '{' action-text '}'
//!            | '?{' predicate-text '}'
//!            | '@{' inline-text '}'
//!            | suffix '^{' error-text '}'
//! ```

use fletch_core::ast::{Grammar, Node, RuleRef, Variable};

/// One rule as read from source, before names are resolved against the
/// grammar's rule table.
struct RawRule {
    name: String,
    expr: RawNode,
}

/// Mirrors [`fletch_core::ast::Node`] but refers to rules by name; a
/// separate resolution pass turns these into `RuleRef`s against a
/// fully-declared [`Grammar`].
enum RawNode {
    Dot,
    Name(String, Option<String>),
    Character(char),
    Str(String, bool),
    Class(String),
    Action(String),
    Inline(String),
    Predicate(String),
    Error(Box<RawNode>, String),
    Alternate(Vec<RawNode>),
    Sequence(Vec<RawNode>),
    PeekFor(Box<RawNode>),
    PeekNot(Box<RawNode>),
    Query(Box<RawNode>),
    Star(Box<RawNode>),
    Plus(Box<RawNode>),
}

peg::parser! {
    grammar textual_peg() for str {
        rule _ = quiet!{[' ' | '\t' | '\r' | '\n']*}

        rule ident() -> String
            = s:$(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*) { s.to_string() }

        rule action_text() -> String
            = "{" body:$((!"}" [_])*) "}" { body.to_string() }
        rule predicate_text() -> String
            = "?{" body:$((!"}" [_])*) "}" { body.to_string() }
        rule inline_text() -> String
            = "@{" body:$((!"}" [_])*) "}" { body.to_string() }
        rule error_text() -> String
            = "^{" body:$((!"}" [_])*) "}" { body.to_string() }

        rule char_literal() -> char
            = "'" c:char_escape() "'" { c }
        rule char_escape() -> char
            = "\\n" { '\n' } / "\\t" { '\t' } / "\\r" { '\r' } / "\\\\" { '\\' } / "\\'" { '\'' } / c:[_] { c }

        rule string_literal() -> (String, bool)
            = "\"" body:$((!"\"" [_])*) "\"" fold:"i"? { (body.to_string(), fold.is_some()) }

        rule class_literal() -> String
            = "[" body:$((!"]" [_])*) "]" { body.to_string() }

        rule primary() -> RawNode
            = "." { RawNode::Dot }
            / c:char_literal() { RawNode::Character(c) }
            / s:string_literal() { RawNode::Str(s.0, s.1) }
            / c:class_literal() { RawNode::Class(c) }
            / "(" _ e:expr() _ ")" { e }
            / t:action_text() { RawNode::Action(t) }
            / t:predicate_text() { RawNode::Predicate(t) }
            / t:inline_text() { RawNode::Inline(t) }
            / v:ident() _ ":" _ r:ident() { RawNode::Name(r, Some(v)) }
            / r:ident() { RawNode::Name(r, None) }

        rule suffixed() -> RawNode
            = p:primary() _ "*" { RawNode::Star(Box::new(p)) }
            / p:primary() _ "+" { RawNode::Plus(Box::new(p)) }
            / p:primary() _ "?" { RawNode::Query(Box::new(p)) }
            / p:primary() { p }

        rule prefix() -> RawNode
            = "&" _ s:suffixed() { RawNode::PeekFor(Box::new(s)) }
            / "!" _ s:suffixed() { RawNode::PeekNot(Box::new(s)) }
            / s:suffixed() { s }

        rule error_suffixed() -> RawNode
            = p:prefix() _ t:error_text() { RawNode::Error(Box::new(p), t) }
            / p:prefix() { p }

        rule sequence() -> RawNode
            = first:error_suffixed() _ rest:(error_suffixed() ** _) {
                let mut all = vec![first];
                all.extend(rest);
                if all.len() == 1 { all.pop().unwrap() } else { RawNode::Sequence(all) }
            }

        pub rule expr() -> RawNode
            = first:sequence() _ rest:(("/" _ s:sequence() { s }) ** _) {
                let mut all = vec![first];
                all.extend(rest);
                if all.len() == 1 { all.pop().unwrap() } else { RawNode::Alternate(all) }
            }

        rule rule_def() -> RawRule
            = _ name:ident() _ "<-" _ e:expr() _ ";"? _ { RawRule { name, expr: e } }

        pub rule grammar_source() -> Vec<RawRule>
            = rule_def()*
    }
}

/// Parses `source` and builds a [`Grammar`] with every rule's
/// expression resolved, variables collected, and the first rule
/// declared as the start rule. Rule references to names that were
/// never defined become `RuleRef::Undefined`, left for the analyzer to
/// flag rather than rejected here.
pub fn parse(source: &str) -> Result<Grammar, peg::error::ParseError<peg::str::LineCol>> {
    let raw_rules = textual_peg::grammar_source(source)?;
    let mut grammar = Grammar::new();

    for raw in &raw_rules {
        grammar.declare_rule(&raw.name);
    }
    if let Some(first) = raw_rules.first() {
        let id = grammar.rule_id(&first.name).unwrap();
        grammar.set_start(id);
    }

    for raw in raw_rules {
        let id = grammar.rule_id(&raw.name).unwrap();
        let node = lower(&mut grammar, id, raw.expr);
        grammar.rule_mut(id).expression = Some(node);
    }

    Ok(grammar)
}

fn resolve_or_declare_variable(grammar: &mut Grammar, owner: usize, var_name: &str) -> usize {
    let rule = grammar.rule_mut(owner);
    if let Some(pos) = rule.variables.iter().position(|v| v.name == var_name) {
        return pos;
    }
    rule.variables.push(Variable { name: var_name.to_string(), offset: 0 });
    rule.variables.len() - 1
}

fn lower(grammar: &mut Grammar, owner: usize, raw: RawNode) -> Node {
    match raw {
        RawNode::Dot => Node::Dot,
        RawNode::Character(c) => Node::Character(c),
        RawNode::Str(value, case_fold) => Node::Str { value, case_fold },
        RawNode::Class(raw) => Node::Class { raw },
        RawNode::Action(text) => {
            let id = grammar.push_action(text, owner, 0);
            Node::Action { id }
        }
        RawNode::Inline(text) => Node::Inline(text),
        RawNode::Predicate(text) => Node::Predicate(text),
        RawNode::Error(element, handler) => Node::Error { element: Box::new(lower(grammar, owner, *element)), handler },
        RawNode::Alternate(children) => Node::Alternate(children.into_iter().map(|c| lower(grammar, owner, c)).collect()),
        RawNode::Sequence(children) => Node::Sequence(children.into_iter().map(|c| lower(grammar, owner, c)).collect()),
        RawNode::PeekFor(inner) => Node::PeekFor(Box::new(lower(grammar, owner, *inner))),
        RawNode::PeekNot(inner) => Node::PeekNot(Box::new(lower(grammar, owner, *inner))),
        RawNode::Query(inner) => Node::Query(Box::new(lower(grammar, owner, *inner))),
        RawNode::Star(inner) => Node::Star(Box::new(lower(grammar, owner, *inner))),
        RawNode::Plus(inner) => Node::Plus(Box::new(lower(grammar, owner, *inner))),
        RawNode::Name(name, var) => {
            let target = match grammar.rule_id(&name) {
                Some(id) => RuleRef::Resolved(id),
                None => RuleRef::Undefined(name),
            };
            let variable = var.map(|v| resolve_or_declare_variable(grammar, owner, &v));
            Node::Name { target, variable }
        }
    }
}
