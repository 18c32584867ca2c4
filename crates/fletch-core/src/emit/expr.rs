//! Expression emitter (component 4.3): translates one [`Node`] into C
//! statements that either fall through on success or `goto ko` on
//! failure.
//!
//! The two backtracking primitives every composite node needs -- "save
//! position and thunk depth", "restore them" -- are written out at each
//! use site instead of factored into a shared helper, keeping each
//! node's translation self-contained and easy to read in isolation.

use std::io::Write;

use crate::{
    ast::{Node, RuleRef, Variable},
    emit::{action_fn_name, c_char_literal, c_string_literal, rule_fn_name, CompileCtx},
    error::FletchResult,
    label::Label,
    writer::CodeWriter,
};

/// Emits `node`, branching to `ko` on failure and falling through to the
/// next statement on success. `rule_name` and `variables` identify the
/// rule currently being compiled, needed to resolve `Name` variable
/// bindings and to name `Action` trampolines.
pub fn emit<W: Write>(
    ctx: &mut CompileCtx<'_>,
    w: &mut CodeWriter<W>,
    rule_name: &str,
    variables: &[Variable],
    node: &Node,
    ko: Label,
) -> FletchResult<()> {
    match node {
        Node::Dot => {
            w.wrtln(&format!("if (!yymatchDot(yy)) goto {ko};"))?;
        }
        Node::Character(c) => {
            w.wrtln(&format!("if (!yymatchChar(yy, {})) goto {ko};", c_char_literal(*c)))?;
        }
        Node::Str { value, case_fold } => {
            if *case_fold {
                w.wrtln(&format!(
                    "if (!yymatchIString(yy, {})) goto {ko};",
                    c_string_literal(&super::ascii_lower(value))
                ))?;
            } else if value.chars().count() == 1 {
                w.wrtln(&format!("if (!yymatchChar(yy, {})) goto {ko};", c_char_literal(value.chars().next().unwrap())))?;
            } else {
                w.wrtln(&format!("if (!yymatchString(yy, {})) goto {ko};", c_string_literal(value)))?;
            }
        }
        Node::Class { raw } => {
            let literal = crate::charclass::compile_class_literal(raw);
            w.wrtln(&format!("if (!yymatchClass(yy, (unsigned char *)\"{literal}\")) goto {ko};"))?;
        }
        Node::Name { target, variable } => {
            let target_name = match target {
                RuleRef::Resolved(id) => ctx.grammar.rule(*id).name.clone(),
                RuleRef::Undefined(name) => name.clone(),
            };
            w.wrtln(&format!("if (!{}(yy)) goto {ko};", rule_fn_name(&target_name)))?;
            if let Some(idx) = variable {
                let offset = variables[*idx].offset;
                w.wrtln(&format!("yyDo(yy, yySet, {offset}, 0);"))?;
            }
        }
        Node::Action { id } => {
            let action = &ctx.grammar.actions[*id];
            let owner_name = ctx.grammar.rule(action.owner).name.clone();
            w.wrtln(&format!("yyDo(yy, {}, yybegin, yy->_pos);", action_fn_name(&owner_name, *id)))?;
        }
        Node::Inline(text) => {
            w.wrtln("yy->_textlen = yyText(yy, yybegin, yy->_pos);")?;
            w.wrtln("#define yytext yy->_text")?;
            w.wrtln("#define yyleng yy->_textlen")?;
            w.wrtln(&format!("{text};"))?;
            w.wrtln("#undef yytext")?;
            w.wrtln("#undef yyleng")?;
        }
        Node::Predicate(text) => {
            w.wrtln("yy->_textlen = yyText(yy, yybegin, yy->_pos);")?;
            w.wrtln("#define yytext yy->_text")?;
            w.wrtln("#define yyleng yy->_textlen")?;
            w.wrtln(&format!("if (!({text})) goto {ko};"))?;
            w.wrtln("#undef yytext")?;
            w.wrtln("#undef yyleng")?;
        }
        Node::Error { element, handler } => {
            let eko = ctx.labels.fresh();
            let eok = ctx.labels.fresh();
            emit(ctx, w, rule_name, variables, element, eko)?;
            w.wrtln(&format!("goto {eok};"))?;
            w.wrtln(&format!("{eko}:;"))?;
            w.wrtln("yy->_textlen = yyText(yy, yybegin, yy->_pos);")?;
            w.wrtln("#define yytext yy->_text")?;
            w.wrtln("#define yyleng yy->_textlen")?;
            w.wrtln(&format!("{handler};"))?;
            w.wrtln("#undef yytext")?;
            w.wrtln("#undef yyleng")?;
            w.wrtln(&format!("goto {ko};"))?;
            w.wrtln(&format!("{eok}:;"))?;
        }
        Node::Alternate(branches) => emit_alternate(ctx, w, rule_name, variables, branches, ko)?,
        Node::Sequence(children) => {
            for child in children {
                emit(ctx, w, rule_name, variables, child, ko)?;
            }
        }
        Node::PeekFor(inner) => {
            let (pos0, thunkpos0) = save_names(ctx);
            let lko = ctx.labels.fresh();
            let lok = ctx.labels.fresh();
            w.wrtln(&format!("int {pos0} = yy->_pos, {thunkpos0} = yy->_thunkpos;"))?;
            emit(ctx, w, rule_name, variables, inner, lko)?;
            w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
            w.wrtln(&format!("goto {lok};"))?;
            w.wrtln(&format!("{lko}:;"))?;
            w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
            w.wrtln(&format!("goto {ko};"))?;
            w.wrtln(&format!("{lok}:;"))?;
        }
        Node::PeekNot(inner) => {
            // The high-water mark (`_maxpos`, used for failure-location
            // reporting) must not be contaminated by the element this
            // predicate probes: restore it alongside `_pos`/`_thunkpos`
            // on both the "element matched" (predicate fails) and
            // "element failed" (predicate succeeds) paths.
            let (pos0, thunkpos0, maxpos0) = save_names_with_maxpos(ctx);
            let lko = ctx.labels.fresh();
            w.wrtln(&format!("int {pos0} = yy->_pos, {thunkpos0} = yy->_thunkpos;"))?;
            w.wrtln(&format!("int {maxpos0} = yy->_maxpos;"))?;
            emit(ctx, w, rule_name, variables, inner, lko)?;
            w.wrtln(&format!("yy->_maxpos = {maxpos0};"))?;
            w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
            w.wrtln(&format!("goto {ko};"))?;
            w.wrtln(&format!("{lko}:;"))?;
            w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
            w.wrtln(&format!("yy->_maxpos = {maxpos0};"))?;
        }
        Node::Query(inner) => {
            let (pos0, thunkpos0) = save_names(ctx);
            let lko = ctx.labels.fresh();
            let lok = ctx.labels.fresh();
            w.wrtln(&format!("int {pos0} = yy->_pos, {thunkpos0} = yy->_thunkpos;"))?;
            emit(ctx, w, rule_name, variables, inner, lko)?;
            w.wrtln(&format!("goto {lok};"))?;
            w.wrtln(&format!("{lko}:;"))?;
            w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
            w.wrtln(&format!("{lok}:;"))?;
        }
        Node::Star(inner) => emit_star(ctx, w, rule_name, variables, inner)?,
        Node::Plus(inner) => {
            emit(ctx, w, rule_name, variables, inner, ko)?;
            emit_star(ctx, w, rule_name, variables, inner)?;
        }
    }
    Ok(())
}

fn save_names(ctx: &mut CompileCtx<'_>) -> (String, String) {
    let n = ctx.labels.fresh().0;
    (format!("yypos{n}"), format!("yythunkpos{n}"))
}

fn save_names_with_maxpos(ctx: &mut CompileCtx<'_>) -> (String, String, String) {
    let n = ctx.labels.fresh().0;
    (format!("yypos{n}"), format!("yythunkpos{n}"), format!("yymaxpos{n}"))
}

fn emit_alternate<W: Write>(
    ctx: &mut CompileCtx<'_>,
    w: &mut CodeWriter<W>,
    rule_name: &str,
    variables: &[Variable],
    branches: &[Node],
    ko: Label,
) -> FletchResult<()> {
    let (pos0, thunkpos0) = save_names(ctx);
    let ok = ctx.labels.fresh();
    w.wrtln(&format!("int {pos0} = yy->_pos, {thunkpos0} = yy->_thunkpos;"))?;
    let last = branches.len() - 1;
    for (i, branch) in branches.iter().enumerate() {
        if i == last {
            emit(ctx, w, rule_name, variables, branch, ko)?;
        } else {
            let next = ctx.labels.fresh();
            emit(ctx, w, rule_name, variables, branch, next)?;
            w.wrtln(&format!("goto {ok};"))?;
            w.wrtln(&format!("{next}:;"))?;
            w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
        }
    }
    w.wrtln(&format!("{ok}:;"))?;
    Ok(())
}

fn emit_star<W: Write>(ctx: &mut CompileCtx<'_>, w: &mut CodeWriter<W>, rule_name: &str, variables: &[Variable], inner: &Node) -> FletchResult<()> {
    let (pos0, thunkpos0) = save_names(ctx);
    let again = ctx.labels.fresh();
    let out = ctx.labels.fresh();
    w.wrtln(&format!("int {pos0} = yy->_pos, {thunkpos0} = yy->_thunkpos;"))?;
    w.wrtln(&format!("{again}:;"))?;
    w.wrtln(&format!("{pos0} = yy->_pos; {thunkpos0} = yy->_thunkpos;"))?;
    emit(ctx, w, rule_name, variables, inner, out)?;
    w.wrtln(&format!("goto {again};"))?;
    w.wrtln(&format!("{out}:;"))?;
    w.wrtln(&format!("yy->_pos = {pos0}; yy->_thunkpos = {thunkpos0};"))?;
    Ok(())
}
