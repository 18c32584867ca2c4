//! Driver / orchestrator (component 4.6): the eight emission steps that
//! turn an analyzed [`Grammar`] into one C translation unit.
//!
//! 1. Banner + fixed includes ([`crate::runtime::header`])
//! 2. `YYRULECOUNT` constant
//! 3. Fixed preamble: macros, `yycontext`, every match/thunk primitive
//! 4. Forward declaration for every rule (order-independent calls)
//! 5. One `YY_ACTION` trampoline per action, in discovery order
//! 6. One `YY_RULE` function body per rule
//! 7. Footer: `yyparse`/`yyparsefrom`/`yyrelease`, dispatching to the
//!    start rule
//!
//! (Step numbering above matches 4.6's own list; the analyzer pass and
//! variable-offset assignment that must run first aren't separately
//! numbered there since they mutate the grammar rather than emit text.)

use std::io::Write;

use crate::{
    analyzer::{self, Analysis},
    ast::Grammar,
    diagnostics::Diagnostics,
    emit::{rule, CompileCtx},
    error::{FletchError, FletchResult},
    runtime::{self, RuntimeOptions},
    variables,
    writer::CodeWriter,
};

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub tool_version: String,
    pub runtime: RuntimeOptions,
    pub trace: bool,
    /// Emit `#line` directives pointing action bodies back at the
    /// source grammar file, so a C debugger steps through the original
    /// `.peg` source rather than the generated file.
    pub line_directives: bool,
    pub source_file: String,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            runtime: RuntimeOptions::default(),
            trace: false,
            line_directives: true,
            source_file: "<grammar>".to_string(),
        }
    }
}

/// Runs analysis, assigns variable offsets, then emits the full C
/// translation unit to `out`. Returns the diagnostics collected along
/// the way (possibly non-empty on a still-successful build: unused
/// rules and the like are warnings, not failures).
///
/// Fails with [`FletchError`] only for conditions 4.9 calls fatal -- at
/// present, a grammar with no start rule set.
pub fn compile<W: Write>(grammar: &mut Grammar, out: W, options: &DriverOptions) -> FletchResult<Diagnostics> {
    let start = grammar.start.ok_or_else(|| FletchError::Io("grammar has no start rule".to_string()))?;

    let Analysis { diagnostics, .. } = analyzer::analyze(grammar);
    variables::assign_offsets(grammar);

    let mut w = CodeWriter::new(out);
    w.wrt(&runtime::header(&options.tool_version))?;
    w.newline()?;
    w.wrt(&runtime::rule_count_constant(grammar.rules.len()))?;
    w.wrt(&runtime::preamble(&options.runtime))?;
    w.newline()?;

    for r in &grammar.rules {
        rule::emit_forward_decl(&mut w, &r.name)?;
    }
    w.newline()?;

    for (id, action) in grammar.actions.iter().enumerate() {
        rule::emit_action(&mut w, grammar, id, action, options.line_directives, &options.source_file)?;
    }

    let mut ctx = CompileCtx::new(&*grammar).with_trace(options.trace);
    for r in &grammar.rules {
        rule::emit_rule(&mut ctx, &mut w, r.id)?;
    }

    let start_name = grammar.rule(start).name.clone();
    w.wrt(&runtime::footer(&start_name))?;

    Ok(diagnostics)
}
