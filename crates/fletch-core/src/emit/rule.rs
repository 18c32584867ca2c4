//! Rule emitter (component 4.4): wraps one rule's expression translation
//! in a `YY_RULE` function, and renders the action trampolines the
//! driver stitches in separately.
//!
//! Per-rule codegen saves `_pos`/`_thunkpos` on entry, restores and
//! returns 0 on the fail path, returns 1 otherwise -- except when the
//! top-level expression is a `Query` or `Star`, which can never reach
//! that fail path, so the save/restore and the label are dead weight
//! this crate's 4.4 notes call the "safety optimization". A rule that
//! binds variables also brackets its body with a deferred
//! `yyDo(yy, yyPush, ...)`/`yyDo(yy, yyPop, ...)` pair so the value
//! stack only grows for the duration of that rule's live invocation.

use std::io::Write;

use crate::{
    ast::{ActionDef, Grammar, Node, RuleId},
    emit::{action_fn_name, expr, rule_fn_name, CompileCtx},
    error::FletchResult,
    variables,
    writer::CodeWriter,
};

/// Emits the `YY_RULE(int) yy_<name>(yycontext *yy) { ... }` definition
/// for one rule.
pub fn emit_rule<W: Write>(ctx: &mut CompileCtx<'_>, w: &mut CodeWriter<W>, rule_id: RuleId) -> FletchResult<()> {
    let rule = ctx.grammar.rule(rule_id);
    let name = rule.name.clone();
    let variables = rule.variables.clone();
    let expr_node = rule.expression.clone();

    w.wrtln(&format!("YY_RULE(int) {}(yycontext *yy)", rule_fn_name(&name)))?;
    w.wrtln("{")?;
    w.indent();
    w.wrtln("int yybegin = yy->_pos;")?;

    let ko = ctx.labels.fresh();
    let skip_save = matches!(&expr_node, Some(Node::Query(_)) | Some(Node::Star(_)));

    if !skip_save {
        w.wrtln("int yypos0 = yy->_pos, yythunkpos0 = yy->_thunkpos;")?;
    }
    if !variables.is_empty() {
        w.wrtln(&format!("yyDo(yy, yyPush, {}, 0);", variables.len()))?;
    }
    if ctx.trace {
        w.wrtln(&format!("yyprintf((stderr, \"%s\\n\", \"{name}\"));"))?;
    }

    match &expr_node {
        Some(node) => expr::emit(ctx, w, &name, &variables, node, ko)?,
        // Declared but never given a production: vacuously fails every time.
        None => {
            w.wrtln(&format!("goto {ko};"))?;
        }
    }

    if !variables.is_empty() {
        w.wrtln(&format!("yyDo(yy, yyPop, {}, 0);", variables.len()))?;
    }
    w.wrtln("return 1;")?;
    if !skip_save {
        w.wrtln(&format!("{ko}:;"))?;
        w.wrtln("yy->_pos = yypos0; yy->_thunkpos = yythunkpos0;")?;
        w.wrtln("return 0;")?;
    }
    w.dedent();
    w.wrtln("}")?;
    w.newline()?;
    Ok(())
}

/// Emits a forward declaration (`YY_RULE(int) yy_<name>(yycontext *);`),
/// needed because rules can call each other regardless of definition
/// order (4.6 step 5).
pub fn emit_forward_decl<W: Write>(w: &mut CodeWriter<W>, rule_name: &str) -> FletchResult<()> {
    w.wrtln(&format!("YY_RULE(int) {}(yycontext *yy);", rule_fn_name(rule_name)))?;
    Ok(())
}

/// Emits one action's `YY_ACTION` trampoline, its body wrapped in the
/// owning rule's variable `#define`/`#undef` pair so the action text
/// can refer to bound variables by name.
pub fn emit_action<W: Write>(w: &mut CodeWriter<W>, grammar: &Grammar, action_id: usize, action: &ActionDef, emit_line_directives: bool, source_file: &str) -> FletchResult<()> {
    let owner_name = grammar.rule(action.owner).name.clone();
    w.wrtln(&format!(
        "YY_ACTION(void) {}(yycontext *yy, char *yytext, int yyleng)",
        action_fn_name(&owner_name, action_id)
    ))?;
    w.wrtln("{")?;
    w.indent();
    w.wrtln("(void)yytext; (void)yyleng;")?;
    variables::write_defines(w, grammar, action.owner)?;
    if emit_line_directives {
        w.wrtln(&format!("#line {} \"{source_file}\"", action.line))?;
    }
    w.wrtln(&format!("{}", action.text))?;
    variables::write_undefs(w, grammar, action.owner)?;
    w.dedent();
    w.wrtln("}")?;
    w.newline()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Grammar, Node};

    #[test]
    fn star_rule_skips_save_and_restore() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Star(Box::new(Node::Character('x'))));
        g.set_start(a);
        let mut ctx = CompileCtx::new(&g);
        let mut buf = Vec::new();
        {
            let mut w = CodeWriter::new(&mut buf);
            emit_rule(&mut ctx, &mut w, a).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("yypos0"));
        assert!(text.contains("return 1;"));
    }

    #[test]
    fn rule_with_variables_pushes_on_entry_and_pops_before_success_only() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).variables.push(crate::ast::Variable { name: "x".into(), offset: -1 });
        g.rule_mut(a).expression = Some(Node::Character('x'));
        g.set_start(a);
        let mut ctx = CompileCtx::new(&g);
        let mut buf = Vec::new();
        {
            let mut w = CodeWriter::new(&mut buf);
            emit_rule(&mut ctx, &mut w, a).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let push = text.find("yyDo(yy, yyPush, 1, 0);").unwrap();
        let pop = text.find("yyDo(yy, yyPop, 1, 0);").unwrap();
        let return1 = text.find("return 1;").unwrap();
        assert!(push < pop && pop < return1, "expected push, then pop, then success return");
    }

    #[test]
    fn rule_without_variables_emits_no_push_or_pop() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Character('x'));
        g.set_start(a);
        let mut ctx = CompileCtx::new(&g);
        let mut buf = Vec::new();
        {
            let mut w = CodeWriter::new(&mut buf);
            emit_rule(&mut ctx, &mut w, a).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("yyPush"));
        assert!(!text.contains("yyPop"));
    }

    #[test]
    fn ordinary_rule_saves_and_restores_on_failure() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).expression = Some(Node::Character('x'));
        g.set_start(a);
        let mut ctx = CompileCtx::new(&g);
        let mut buf = Vec::new();
        {
            let mut w = CodeWriter::new(&mut buf);
            emit_rule(&mut ctx, &mut w, a).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("yypos0"));
        assert!(text.contains("return 0;"));
    }

    #[test]
    fn action_body_is_bracketed_by_variable_defines() {
        let mut g = Grammar::new();
        let a = g.declare_rule("A");
        g.rule_mut(a).variables.push(crate::ast::Variable { name: "v".into(), offset: -1 });
        let action = ActionDef { text: "x = v;".into(), owner: a, line: 3 };
        let mut buf = Vec::new();
        {
            let mut w = CodeWriter::new(&mut buf);
            emit_action(&mut w, &g, 0, &action, false, "g.peg").unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("#define v yy->_val[-1]"));
        assert!(text.contains("x = v;"));
        assert!(text.contains("#undef v"));
    }
}
