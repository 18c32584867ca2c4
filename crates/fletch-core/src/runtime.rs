//! Runtime template (component 4.7): the fixed C boilerplate the driver
//! stitches the per-rule bodies into.
//!
//! The primitives below (`yyrefill`, `yymatchDot`/`yymatchChar`/
//! `yymatchString`/`yymatchIString`/`yymatchClass`, `yyDo`/`yyText`/
//! `yyDone`/`yyCommit`, `yyPush`/`yyPop`/`yySet`) are the exact contract
//! 4.7 and 6.3 promise the emitted parser provides; their growth
//! strategy (geometric doubling, released only at `yyrelease`) and
//! customization points (`YY_MALLOC`/`YY_REALLOC`/`YY_FREE`, `YY_RULE`/
//! `YY_ACTION`/`YY_PARSE`, `YYSTYPE`, `YY_STACK_SIZE`, `YY_BUFFER_SIZE`,
//! `YY_INPUT`, `yyprintf`) follow the same `header`/`preamble`/`footer`
//! contract the `peg`/`leg` family of C parser generators expose.

/// Overridable knobs for the emitted runtime, corresponding to the
/// "Customization points" bullet in 6.3.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// C type used for semantic values (`YYSTYPE`). Defaults to `int`.
    pub value_type: String,
    /// Initial depth of the thunk log / value stack (`YY_STACK_SIZE`).
    pub stack_size: u32,
    /// Initial size of the input and text buffers (`YY_BUFFER_SIZE`).
    pub buffer_size: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { value_type: "int".to_string(), stack_size: 128, buffer_size: 1024 }
    }
}

/// The generated-by banner plus fixed includes (4.6 steps 1-2).
pub fn header(tool_version: &str) -> String {
    format!(
        "/* A recursive-descent parser generated by fletch {tool_version} */\n\n\
#include <ctype.h>\n\
#include <stdio.h>\n\
#include <stdlib.h>\n\
#include <string.h>\n"
    )
}

/// `YYRULECOUNT` constant (4.6 step 3).
pub fn rule_count_constant(rule_count: usize) -> String {
    format!("#define YYRULECOUNT {rule_count}\n")
}

/// The fixed preamble: overridable macros, the `yycontext` struct, and
/// every runtime primitive from 4.7 (4.6 step 4).
pub fn preamble(opts: &RuntimeOptions) -> String {
    let RuntimeOptions { value_type, stack_size, buffer_size } = opts;
    format!(
        r#"
#ifndef YY_MALLOC
#define YY_MALLOC(C, N)   malloc(N)
#endif
#ifndef YY_REALLOC
#define YY_REALLOC(C, P, N) realloc(P, N)
#endif
#ifndef YY_FREE
#define YY_FREE(C, P)     free(P)
#endif
#ifndef YY_LOCAL
#define YY_LOCAL(T) static T
#endif
#ifndef YY_ACTION
#define YY_ACTION(T) static T
#endif
#ifndef YY_RULE
#define YY_RULE(T) static T
#endif
#ifndef YY_PARSE
#define YY_PARSE(T) T
#endif
#ifndef YYPARSE
#define YYPARSE yyparse
#endif
#ifndef YYPARSEFROM
#define YYPARSEFROM yyparsefrom
#endif
#ifndef YYRELEASE
#define YYRELEASE yyrelease
#endif
#ifdef YY_DEBUG
# define yyprintf(args) fprintf args
#else
# define yyprintf(args)
#endif
#ifndef YYSTYPE
#define YYSTYPE {value_type}
#endif
#ifndef YY_STACK_SIZE
#define YY_STACK_SIZE {stack_size}
#endif
#ifndef YY_BUFFER_SIZE
#define YY_BUFFER_SIZE {buffer_size}
#endif
#ifndef YY_INPUT
#define YY_INPUT(buf, result, max_size) \
  {{ int yyc = getchar(); result = (EOF == yyc) ? 0 : (*(buf) = yyc, 1); }}
#endif

typedef struct _yycontext yycontext;
typedef void (*yyaction)(yycontext *yy, char *yytext, int yyleng);
typedef struct _yythunk {{ int begin, end; yyaction action; }} yythunk;

struct _yycontext {{
  char    *_buf;
  int      _buflen;
  int      _pos;
  int      _limit;
  int      _maxpos;
  char    *_text;
  int      _textlen;
  int      _begin;
  int      _end;
  yythunk *_thunks;
  int      _thunkslen;
  int      _thunkpos;
  YYSTYPE  _;
  YYSTYPE *_val;
  YYSTYPE *_vals;
  int      _valslen;
}};

/* Ensures at least YY_BUFFER_SIZE/2 bytes are readable beyond the
 * cursor, growing the input buffer geometrically. Returns 0 if the
 * input source is exhausted. NOTE: this may be called from inside a
 * multi-symbol string match (yymatchString/yymatchIString); on
 * exhaustion the match fails without restoring bytes already compared,
 * which is harmless (those bytes are still in the buffer) but means a
 * long literal can observably fail mid-match rather than atomically --
 * a known limitation carried over from the reference implementation. */
YY_LOCAL(int) yyrefill(yycontext *yy)
{{
  int yyn;
  while (yy->_buflen - yy->_pos < 512)
  {{
    yy->_buflen *= 2;
    yy->_buf = (char *)YY_REALLOC(yy, yy->_buf, yy->_buflen);
  }}
  YY_INPUT((yy->_buf + yy->_pos), yyn, (yy->_buflen - yy->_pos));
  if (!yyn) return 0;
  yy->_limit += yyn;
  return 1;
}}

YY_LOCAL(void) yyrecordMaxPos(yycontext *yy)
{{
  if (yy->_pos > yy->_maxpos) yy->_maxpos = yy->_pos;
}}

YY_LOCAL(int) yymatchDot(yycontext *yy)
{{
  if (yy->_pos >= yy->_limit && !yyrefill(yy)) return 0;
  ++yy->_pos;
  yyrecordMaxPos(yy);
  return 1;
}}

YY_LOCAL(int) yymatchChar(yycontext *yy, int c)
{{
  if (yy->_pos >= yy->_limit && !yyrefill(yy)) return 0;
  if ((unsigned char)yy->_buf[yy->_pos] == c)
  {{
    ++yy->_pos;
    yyrecordMaxPos(yy);
    return 1;
  }}
  return 0;
}}

YY_LOCAL(int) yymatchString(yycontext *yy, const char *s)
{{
  int yysav = yy->_pos;
  while (*s)
  {{
    if (yy->_pos >= yy->_limit && !yyrefill(yy)) return 0;
    if (yy->_buf[yy->_pos] != *s) {{ yy->_pos = yysav; return 0; }}
    ++s;
    ++yy->_pos;
  }}
  yyrecordMaxPos(yy);
  return 1;
}}

YY_LOCAL(int) yymatchIString(yycontext *yy, const char *s)
{{
  int yysav = yy->_pos;
  while (*s)
  {{
    if (yy->_pos >= yy->_limit && !yyrefill(yy)) return 0;
    if (tolower((unsigned char)yy->_buf[yy->_pos]) != *s) {{ yy->_pos = yysav; return 0; }}
    ++s;
    ++yy->_pos;
  }}
  yyrecordMaxPos(yy);
  return 1;
}}

YY_LOCAL(int) yymatchClass(yycontext *yy, unsigned char *bits)
{{
  int c;
  if (yy->_pos >= yy->_limit && !yyrefill(yy)) return 0;
  c = (unsigned char)yy->_buf[yy->_pos];
  if (bits[c >> 3] & (1 << (c & 7)))
  {{
    ++yy->_pos;
    yyrecordMaxPos(yy);
    return 1;
  }}
  return 0;
}}

/* Appends a deferred action to the thunk log, growing it geometrically.
 * The log is an append-only sequence truncated back to a saved depth on
 * backtrack, never a linked list -- see yyDone/yyCommit below. */
YY_LOCAL(void) yyDo(yycontext *yy, yyaction action, int begin, int end)
{{
  while (yy->_thunkpos >= yy->_thunkslen)
  {{
    yy->_thunkslen *= 2;
    yy->_thunks = (yythunk *)YY_REALLOC(yy, yy->_thunks, sizeof(yythunk) * yy->_thunkslen);
  }}
  yy->_thunks[yy->_thunkpos].begin = begin;
  yy->_thunks[yy->_thunkpos].end = end;
  yy->_thunks[yy->_thunkpos].action = action;
  ++yy->_thunkpos;
}}

YY_LOCAL(int) yyText(yycontext *yy, int begin, int end)
{{
  int yyleng = end - begin;
  if (yyleng <= 0) yyleng = 0;
  else
  {{
    while (yy->_textlen < yyleng + 1)
    {{
      yy->_textlen *= 2;
      yy->_text = (char *)YY_REALLOC(yy, yy->_text, yy->_textlen);
    }}
    memcpy(yy->_text, yy->_buf + begin, yyleng);
  }}
  yy->_text[yyleng] = '\0';
  return yyleng;
}}

/* Flushes the thunk log in insertion order, invoking each action with
 * its captured text span, then resets the log to empty. */
YY_LOCAL(void) yyDone(yycontext *yy)
{{
  int pos;
  for (pos = 0; pos < yy->_thunkpos; ++pos)
  {{
    yythunk *thunk = &yy->_thunks[pos];
    int yyleng = thunk->end ? yyText(yy, thunk->begin, thunk->end) : thunk->begin;
    thunk->action(yy, yy->_text, yyleng);
  }}
  yy->_thunkpos = 0;
}}

/* Shifts unread input to the buffer start and resets cursor + thunk log
 * depth to zero. Called once a top-level parse has succeeded. */
YY_LOCAL(void) yyCommit(yycontext *yy)
{{
  if ((yy->_limit -= yy->_pos)) memmove(yy->_buf, yy->_buf + yy->_pos, yy->_limit);
  yy->_begin -= yy->_pos;
  yy->_end -= yy->_pos;
  yy->_pos = yy->_thunkpos = 0;
}}

YY_LOCAL(int) yyAccept(yycontext *yy, int thunkpos0)
{{
  if (thunkpos0)
  {{
    fprintf(stderr, "accept denied at %d\n", thunkpos0);
    return 0;
  }}
  yyDone(yy);
  yyCommit(yy);
  return 1;
}}

/* Variable bindings are replayed from the thunk log in the order the
 * matching rule invocations actually nested (a failed/backtracked call
 * never appends its Push/Pop/Set thunks in the first place), so moving
 * a stack-top pointer here -- rather than indexing a fixed slot -- is
 * what keeps two live invocations of the same rule, recursive or not,
 * from clobbering each other's bound variable. */
YY_LOCAL(void) yyPush(yycontext *yy, char *text, int count)
{{
  (void)text;
  yy->_val += count;
  while (yy->_valslen <= yy->_val - yy->_vals)
  {{
    long offset = yy->_val - yy->_vals;
    int oldlen = yy->_valslen;
    yy->_valslen *= 2;
    yy->_vals = (YYSTYPE *)YY_REALLOC(yy, yy->_vals, sizeof(YYSTYPE) * yy->_valslen);
    memset(&yy->_vals[oldlen], 0, sizeof(YYSTYPE) * oldlen);
    yy->_val = yy->_vals + offset;
  }}
}}
YY_LOCAL(void) yyPop(yycontext *yy, char *text, int count)
{{
  (void)text;
  yy->_val -= count;
}}
/* `count` is the negative stack-relative offset assigned by the
 * variable-binding emitter (-1 for the first bound variable in a rule,
 * -2 for the second, ...), indexed from the current stack top. */
YY_LOCAL(void) yySet(yycontext *yy, char *text, int count)
{{
  (void)text;
  yy->_val[count] = yy->_;
}}

#define YYACCEPT yyAccept(yy, yythunkpos0)
"#
    )
}

/// Footer defining `yyparse`, `yyparsefrom`, `yyrelease`, initializing
/// the context lazily on first entry, and dispatching to `start_rule`
/// (4.6 step 8).
pub fn footer(start_rule: &str) -> String {
    format!(
        r#"
typedef int (*yyrule)(yycontext *yy);

YY_PARSE(int) yyparsefrom(yycontext *yyctx, yyrule yystart)
{{
  int yyok;
  if (!yyctx->_buflen)
  {{
    yyctx->_buflen = YY_BUFFER_SIZE;
    yyctx->_buf = (char *)YY_MALLOC(yyctx, yyctx->_buflen);
    yyctx->_textlen = YY_BUFFER_SIZE;
    yyctx->_text = (char *)YY_MALLOC(yyctx, yyctx->_textlen);
    yyctx->_thunkslen = YY_STACK_SIZE;
    yyctx->_thunks = (yythunk *)YY_MALLOC(yyctx, sizeof(yythunk) * yyctx->_thunkslen);
    yyctx->_valslen = YY_STACK_SIZE;
    yyctx->_vals = (YYSTYPE *)YY_MALLOC(yyctx, sizeof(YYSTYPE) * yyctx->_valslen);
    memset(yyctx->_vals, 0, sizeof(YYSTYPE) * yyctx->_valslen);
    yyctx->_begin = yyctx->_end = yyctx->_pos = yyctx->_limit = yyctx->_maxpos = yyctx->_thunkpos = 0;
  }}
  yyctx->_begin = yyctx->_end = yyctx->_pos;
  yyctx->_thunkpos = 0;
  yyctx->_val = yyctx->_vals;
  yyok = yystart(yyctx);
  if (yyok) yyDone(yyctx);
  yyCommit(yyctx);
  return yyok;
}}

YY_PARSE(int) yyparse(yycontext *yyctx)
{{
  return yyparsefrom(yyctx, yy_{start_rule});
}}

YY_PARSE(void) yyrelease(yycontext *yyctx)
{{
  if (yyctx->_buflen)
  {{
    yyctx->_buflen = 0;
    YY_FREE(yyctx, yyctx->_buf);
    YY_FREE(yyctx, yyctx->_text);
    YY_FREE(yyctx, yyctx->_thunks);
    YY_FREE(yyctx, yyctx->_vals);
  }}
}}
"#
    )
}
