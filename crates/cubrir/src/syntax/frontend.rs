//! Bundled statement front end for `function … end` block-structured sources.
//!
//! This is a line-oriented front end: it tracks strings, comments, bracket
//! nesting, and `end`-terminated block keywords, and produces the tagged
//! [`SyntaxNode`] tree the amendment engine consumes. It recognizes long-form
//! `function`/`macro` definitions, short-form `name(args) = rhs` definitions
//! (including `where`-qualified signatures), `->` lambdas, and `do` blocks.
//! Locally recovered problems (stray `end`, unmatched closing brackets) become
//! embedded [`NodeKind::Error`] nodes rather than aborting the fragment.

use super::{NodeKind, ParseStep, Parsed, StatementParser, SyntaxNode, SyntaxVersion};
use tracing::debug;

/// Keywords that open an `end`-terminated block.
const BLOCK_OPENERS: &[&str] = &[
    "if",
    "for",
    "while",
    "begin",
    "let",
    "try",
    "quote",
    "struct",
    "module",
    "baremodule",
];

/// Keywords that neither open nor close a block.
const STRUCTURAL: &[&str] = &["else", "elseif", "catch", "finally", "mutable", "abstract", "primitive"];

/// Characters that, when ending a code line, continue the statement.
const CONTINUATION_CHARS: &str = "=+-*/\\%^&|<>~!?:,.";

/// Lexer mode carried across lines within one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    /// Nested block comment depth.
    Comment(u32),
    /// String literal; `triple` for `"""` strings.
    Str { triple: bool },
}

/// Persistent lexer state for one `parse_next` call.
#[derive(Debug)]
struct LexState {
    mode: Mode,
    bracket_depth: u32,
}

/// Structural tokens of one scanned line, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineTok {
    /// Opens an `end`-terminated block of the given node kind.
    Open(NodeKind),
    /// An `end` at bracket depth zero.
    Close,
    /// An unmatched `)`, `]`, or `}`.
    StrayCloser,
}

/// Everything the structure pass needs to know about one line.
#[derive(Debug, Default)]
struct LineScan {
    toks: Vec<LineTok>,
    arrow: bool,
    short_def: bool,
    /// Any code content beyond structural keywords and closers.
    has_other_code: bool,
    /// Any non-comment, non-whitespace content at all.
    had_code: bool,
    last_code_char: Option<char>,
}

/// One frame of the container stack during tree building.
#[derive(Debug)]
struct Entry {
    node: SyntaxNode,
    /// Pops at statement end instead of at an `end` keyword.
    auto_stmt: bool,
    /// Suppress markers while a multi-line signature is still open.
    header_pending: bool,
}

impl Entry {
    fn new(node: SyntaxNode, auto_stmt: bool) -> Self {
        Self {
            node,
            auto_stmt,
            header_pending: false,
        }
    }
}

/// Bundled block-syntax front end implementing [`StatementParser`].
#[derive(Debug, Clone)]
pub struct BlockFrontend {
    version: SyntaxVersion,
}

impl BlockFrontend {
    /// Create a front end for the given syntax version.
    #[must_use]
    pub fn new(version: SyntaxVersion) -> Self {
        debug!(%version, "block front end initialized");
        Self { version }
    }

    /// The syntax version this front end was configured with.
    #[must_use]
    pub fn version(&self) -> SyntaxVersion {
        self.version
    }
}

impl Default for BlockFrontend {
    fn default() -> Self {
        Self::new(SyntaxVersion::default())
    }
}

impl StatementParser for BlockFrontend {
    fn parse_next(&self, source: &str, pos: usize) -> ParseStep {
        let len = source.len();
        if pos >= len {
            return ParseStep {
                parsed: Parsed::Failed(String::new()),
                next_pos: len,
            };
        }

        let mut lex = LexState {
            mode: Mode::Code,
            bracket_depth: 0,
        };
        let mut stack = vec![Entry::new(SyntaxNode::new(NodeKind::Block), false)];
        let mut started = false;
        let mut stmt_continues = false;
        let mut rel: u32 = 1;
        let mut cursor = pos;

        while cursor < len {
            let line_end = source[cursor..]
                .find('\n')
                .map_or(len, |i| cursor + i);
            let line = &source[cursor..line_end];

            let at_stmt_start = lex.mode == Mode::Code
                && lex.bracket_depth == 0
                && !stmt_continues
                && stack.last().map_or(true, |e| !e.header_pending);
            let scan = scan_line(&mut lex, line, at_stmt_start);

            if scan.had_code {
                started = true;
            }

            if started && scan.had_code {
                process_line(&mut stack, &scan, rel, lex.bracket_depth);
            }

            // Continuation state only changes on lines that carry code.
            if lex.mode != Mode::Code {
                stmt_continues = true;
            } else if scan.had_code {
                stmt_continues = lex.bracket_depth > 0
                    || scan
                        .last_code_char
                        .is_some_and(|c| CONTINUATION_CHARS.contains(c));
            }

            if lex.mode == Mode::Code && lex.bracket_depth == 0 {
                if let Some(top) = stack.last_mut() {
                    top.header_pending = false;
                }
                if !stmt_continues {
                    while stack.len() > 1 && stack.last().is_some_and(|e| e.auto_stmt) {
                        pop_entry(&mut stack);
                    }
                }
            }

            let next_pos = (line_end + 1).min(len);
            if started
                && stack.len() == 1
                && !stmt_continues
                && lex.mode == Mode::Code
                && lex.bracket_depth == 0
            {
                let root = stack.remove(0).node;
                return ParseStep {
                    parsed: Parsed::Fragment(root),
                    next_pos,
                };
            }

            cursor = next_pos;
            rel += 1;
        }

        if !started {
            return ParseStep {
                parsed: Parsed::Failed(String::new()),
                next_pos: len,
            };
        }
        let message = match lex.mode {
            Mode::Comment(_) => "premature end of input in comment",
            Mode::Str { .. } => "premature end of input in string",
            Mode::Code => "premature end of input",
        };
        ParseStep {
            parsed: Parsed::Incomplete(message.to_string()),
            next_pos: len,
        }
    }
}

/// Apply one scanned line to the container stack.
fn process_line(stack: &mut Vec<Entry>, scan: &LineScan, rel: u32, bracket_depth: u32) {
    let mut pushed_block = false;

    // Short-form definitions and lambdas adopt their own line as body.
    if scan.short_def {
        let mut node = SyntaxNode::new(NodeKind::Function);
        node.line = Some(rel);
        stack.push(Entry::new(node, true));
    } else if scan.arrow {
        let mut node = SyntaxNode::new(NodeKind::Lambda);
        node.line = Some(rel);
        stack.push(Entry::new(node, true));
    }

    let suppress = stack.last().is_some_and(|e| e.header_pending);
    if (scan.has_other_code || scan.short_def || scan.arrow) && !suppress {
        if let Some(top) = stack.last_mut() {
            top.node.children.push(SyntaxNode::at_line(NodeKind::Line, rel));
        }
    }

    for tok in &scan.toks {
        match tok {
            LineTok::Open(kind) => {
                stack.push(Entry::new(SyntaxNode::new(*kind), false));
                pushed_block = true;
            }
            LineTok::Close => {
                if stack.len() > 1 && stack.last().is_some_and(|e| !e.auto_stmt) {
                    pop_entry(stack);
                } else if let Some(top) = stack.last_mut() {
                    top.node
                        .children
                        .push(SyntaxNode::at_line(NodeKind::Error, rel));
                }
            }
            LineTok::StrayCloser => {
                if let Some(top) = stack.last_mut() {
                    top.node
                        .children
                        .push(SyntaxNode::at_line(NodeKind::Error, rel));
                }
            }
        }
    }

    if pushed_block && bracket_depth > 0 {
        if let Some(top) = stack.last_mut() {
            top.header_pending = true;
        }
    }
}

fn pop_entry(stack: &mut Vec<Entry>) {
    if let Some(entry) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.node.children.push(entry.node);
        }
    }
}

/// Scan one physical line, updating the lexer state.
fn scan_line(lex: &mut LexState, line: &str, at_stmt_start: bool) -> LineScan {
    let mut scan = LineScan::default();
    if at_stmt_start && detect_short_def(line) {
        scan.short_def = true;
    }

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    let mut prev_sig: Option<char> = None;
    let mut prev_word = String::new();

    while i < chars.len() {
        match lex.mode {
            Mode::Comment(depth) => {
                if chars[i] == '=' && chars.get(i + 1) == Some(&'#') {
                    i += 2;
                    lex.mode = if depth > 1 {
                        Mode::Comment(depth - 1)
                    } else {
                        Mode::Code
                    };
                } else if chars[i] == '#' && chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    lex.mode = Mode::Comment(depth + 1);
                } else {
                    i += 1;
                }
            }
            Mode::Str { triple } => {
                scan.had_code = true;
                if chars[i] == '\\' {
                    i += 2;
                } else if chars[i] == '"' {
                    if triple {
                        if chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"') {
                            i += 3;
                            lex.mode = Mode::Code;
                            set_code(&mut scan, '"');
                            prev_sig = Some('"');
                        } else {
                            i += 1;
                        }
                    } else {
                        i += 1;
                        lex.mode = Mode::Code;
                        set_code(&mut scan, '"');
                        prev_sig = Some('"');
                    }
                } else {
                    i += 1;
                }
            }
            Mode::Code => {
                let c = chars[i];
                if c.is_whitespace() {
                    i += 1;
                } else if c == '#' {
                    if chars.get(i + 1) == Some(&'=') {
                        lex.mode = Mode::Comment(1);
                        i += 2;
                    } else {
                        break; // line comment
                    }
                } else if c == '"' {
                    let triple =
                        chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"');
                    lex.mode = Mode::Str { triple };
                    i += if triple { 3 } else { 1 };
                    scan.had_code = true;
                    scan.has_other_code = true;
                } else if c == '\'' && is_char_literal_position(prev_sig) {
                    // char literal; an unclosed quote falls through as content
                    scan.had_code = true;
                    scan.has_other_code = true;
                    i += 1;
                    if chars.get(i) == Some(&'\\') {
                        i += 2;
                    } else {
                        i += 1;
                    }
                    if chars.get(i) == Some(&'\'') {
                        i += 1;
                    }
                    set_code(&mut scan, '\'');
                    prev_sig = Some('\'');
                } else if c == '-' && chars.get(i + 1) == Some(&'>') {
                    scan.arrow = true;
                    scan.had_code = true;
                    set_code(&mut scan, '>');
                    prev_sig = Some('>');
                    i += 2;
                } else if c == '(' || c == '[' || c == '{' {
                    lex.bracket_depth += 1;
                    scan.had_code = true;
                    scan.has_other_code = true;
                    scan.last_code_char = Some(c);
                    prev_sig = Some(c);
                    i += 1;
                } else if c == ')' || c == ']' || c == '}' {
                    if lex.bracket_depth == 0 {
                        scan.toks.push(LineTok::StrayCloser);
                    } else {
                        lex.bracket_depth -= 1;
                    }
                    scan.had_code = true;
                    scan.last_code_char = Some(c);
                    prev_sig = Some(c);
                    i += 1;
                } else if c.is_alphabetic() || c == '_' {
                    let start = i;
                    while i < chars.len() && is_word_char(chars[i]) {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    classify_word(lex, &mut scan, &word, prev_sig, &prev_word);
                    prev_sig = word.chars().last();
                    prev_word = word;
                } else {
                    scan.had_code = true;
                    set_code(&mut scan, c);
                    prev_sig = Some(c);
                    i += 1;
                }
            }
        }
    }

    scan
}

fn set_code(scan: &mut LineScan, c: char) {
    scan.has_other_code = true;
    scan.last_code_char = Some(c);
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '!'
}

/// Apostrophe starts a char literal only in operand position; elsewhere it is
/// the transpose operator.
fn is_char_literal_position(prev_sig: Option<char>) -> bool {
    match prev_sig {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '_' || c == ')' || c == ']' || c == '\''),
    }
}

fn classify_word(
    lex: &LexState,
    scan: &mut LineScan,
    word: &str,
    prev_sig: Option<char>,
    prev_word: &str,
) {
    scan.had_code = true;
    scan.last_code_char = word.chars().last();

    // `:for`, `obj.end`, `@function` are not keywords.
    let quoted = matches!(prev_sig, Some(':' | '.' | '@'));
    if quoted {
        scan.has_other_code = true;
        return;
    }

    match word {
        "function" | "macro" => scan.toks.push(LineTok::Open(NodeKind::Function)),
        "do" => scan.toks.push(LineTok::Open(NodeKind::Lambda)),
        "type" if prev_word == "abstract" || prev_word == "primitive" => {
            scan.toks.push(LineTok::Open(NodeKind::Block));
        }
        "end" => {
            if lex.bracket_depth == 0 {
                scan.toks.push(LineTok::Close);
            } else {
                // last-index keyword inside brackets
                scan.has_other_code = true;
            }
        }
        w if BLOCK_OPENERS.contains(&w) => scan.toks.push(LineTok::Open(NodeKind::Block)),
        w if STRUCTURAL.contains(&w) => {}
        _ => scan.has_other_code = true,
    }
}

/// Detect a short-form definition: `name(args) [:: T] [where …] = rhs`.
fn detect_short_def(line: &str) -> bool {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i >= chars.len() || !(chars[i].is_alphabetic() || chars[i] == '_') {
        return false;
    }
    // dotted identifier path
    let start = i;
    loop {
        while i < chars.len() && is_word_char(chars[i]) {
            i += 1;
        }
        if i < chars.len() && chars[i] == '.' && chars.get(i + 1).is_some_and(|c| c.is_alphabetic()) {
            i += 1;
        } else {
            break;
        }
    }
    let head: String = chars[start..i].iter().collect();
    let first = head.split('.').next().unwrap_or("");
    if first == "function"
        || first == "macro"
        || first == "do"
        || BLOCK_OPENERS.contains(&first)
        || STRUCTURAL.contains(&first)
        || first == "end"
        || first == "return"
    {
        return false;
    }
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if i >= chars.len() || chars[i] != '(' {
        return false;
    }
    // balanced argument list on the same line, skipping string content
    let mut depth = 0u32;
    let mut in_str = false;
    while i < chars.len() {
        let c = chars[i];
        if in_str {
            if c == '\\' {
                i += 1;
            } else if c == '"' {
                in_str = false;
            }
        } else if c == '"' {
            in_str = true;
        } else if c == '(' || c == '[' || c == '{' {
            depth += 1;
        } else if c == ')' || c == ']' || c == '}' {
            if depth == 0 {
                return false;
            }
            depth -= 1;
            if depth == 0 {
                i += 1;
                break;
            }
        }
        i += 1;
    }
    if depth != 0 {
        return false;
    }
    // between the signature and `=`: only return types and where clauses
    while i < chars.len() {
        let c = chars[i];
        if c == '=' {
            // plain assignment, not ==, !=, +=, etc.
            if chars.get(i + 1) == Some(&'=') {
                return false;
            }
            let before = chars[..i].iter().rev().find(|c| !c.is_whitespace());
            if before.is_some_and(|&b| "+-*/\\%^&|<>!~:=".contains(b)) {
                return false;
            }
            return true;
        }
        if c.is_whitespace() || is_word_char(c) || matches!(c, '.' | ',' | ':' | '{' | '}' | '<' | '>') {
            i += 1;
        } else {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{function_body_lines, LineIndex};

    fn parse_all(source: &str) -> Vec<(SyntaxNode, u32)> {
        let frontend = BlockFrontend::default();
        let index = LineIndex::new(source);
        let mut fragments = Vec::new();
        let mut pos = 0;
        loop {
            let lineoffset = index.line_at(pos) - 1;
            let step = frontend.parse_next(source, pos);
            match step.parsed {
                Parsed::Fragment(node) => fragments.push((node, lineoffset)),
                Parsed::Failed(msg) => {
                    assert!(msg.is_empty(), "unexpected failure: {msg}");
                    break;
                }
                Parsed::Incomplete(msg) => panic!("unexpected incomplete: {msg}"),
            }
            assert!(step.next_pos > pos, "parser failed to advance");
            pos = step.next_pos;
            if pos >= source.len() {
                break;
            }
        }
        fragments
    }

    fn body_lines(source: &str) -> Vec<u32> {
        let mut all = Vec::new();
        for (node, lineoffset) in parse_all(source) {
            for rel in function_body_lines(&node) {
                all.push(rel + lineoffset);
            }
        }
        all.sort_unstable();
        all
    }

    #[test]
    fn test_long_form_function() {
        let source = "function f(x)\n  return x+1\nend\n";
        assert_eq!(body_lines(source), vec![2]);
    }

    #[test]
    fn test_short_form_definition() {
        let source = "f(x) = x + 1\n";
        assert_eq!(body_lines(source), vec![1]);
    }

    #[test]
    fn test_where_qualified_short_form() {
        let source = "f(x::T) where T = x + one(T)\n";
        assert_eq!(body_lines(source), vec![1]);
    }

    #[test]
    fn test_lambda_body() {
        let source = "g = x -> x * 2\n";
        assert_eq!(body_lines(source), vec![1]);
    }

    #[test]
    fn test_do_block_is_lambda() {
        let source = "open(path) do io\n    write(io, 1)\nend\n";
        assert_eq!(body_lines(source), vec![2]);
    }

    #[test]
    fn test_nested_function() {
        let source = "function outer()\n    function inner()\n        1\n    end\n    inner()\nend\n";
        // inner header (2) sits in outer's body, 3 in inner's, 5 in outer's
        assert_eq!(body_lines(source), vec![2, 3, 5]);
    }

    #[test]
    fn test_struct_fields_not_body() {
        let source = "struct Point\n    x::Int\n    y::Int\nend\n";
        assert!(body_lines(source).is_empty());
    }

    #[test]
    fn test_top_level_statements_not_body() {
        let source = "x = 1\ny = x + 2\n";
        assert!(body_lines(source).is_empty());
    }

    #[test]
    fn test_two_fragments_advance() {
        let source = "x = 1\nfunction f()\n    2\nend\n";
        let fragments = parse_all(source);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].1, 1); // second fragment offset by one line
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let source = "# header comment\n\nfunction f()\n    1\nend\n";
        assert_eq!(body_lines(source), vec![4]);
    }

    #[test]
    fn test_block_comment_skipped() {
        let source = "#= multi\nline comment =#\nf(x) = x\n";
        assert_eq!(body_lines(source), vec![3]);
    }

    #[test]
    fn test_end_of_input_is_benign_failure() {
        let frontend = BlockFrontend::default();
        let source = "x = 1\n# trailing comment\n";
        let step = frontend.parse_next(source, 6);
        assert_eq!(step.parsed, Parsed::Failed(String::new()));
        assert_eq!(step.next_pos, source.len());
    }

    #[test]
    fn test_unterminated_function_is_incomplete() {
        let frontend = BlockFrontend::default();
        let step = frontend.parse_next("function f(x)\n    x\n", 0);
        assert!(matches!(step.parsed, Parsed::Incomplete(_)));
    }

    #[test]
    fn test_unterminated_string_is_incomplete() {
        let frontend = BlockFrontend::default();
        let step = frontend.parse_next("s = \"abc\n", 0);
        assert!(matches!(step.parsed, Parsed::Incomplete(_)));
    }

    #[test]
    fn test_stray_end_yields_error_node() {
        let frontend = BlockFrontend::default();
        let step = frontend.parse_next("end\n", 0);
        match step.parsed {
            Parsed::Fragment(node) => {
                assert!(crate::syntax::first_error_line(&node).is_some());
            }
            other => panic!("expected fragment, got {other:?}"),
        }
    }

    #[test]
    fn test_keyword_inside_string_ignored() {
        let source = "s = \"function f() end\"\n";
        let fragments = parse_all(source);
        assert_eq!(fragments.len(), 1);
        assert!(body_lines(source).is_empty());
    }

    #[test]
    fn test_end_inside_brackets_is_index() {
        let source = "last = xs[end]\n";
        let fragments = parse_all(source);
        assert_eq!(fragments.len(), 1);
    }

    #[test]
    fn test_continuation_line_joins_statement() {
        let source = "x = 1 +\n    2\ny = 3\n";
        let fragments = parse_all(source);
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn test_multiline_body_short_form() {
        let source = "f(x) =\n    x + 1\n";
        assert_eq!(body_lines(source), vec![1, 2]);
    }

    #[test]
    fn test_detect_short_def() {
        assert!(detect_short_def("f(x) = x + 1"));
        assert!(detect_short_def("Base.show(io, x) = print(io, x)"));
        assert!(detect_short_def("f(x)::Int = x"));
        assert!(detect_short_def("f(x) where T = x"));
        assert!(!detect_short_def("x = 1"));
        assert!(!detect_short_def("f(x) == y"));
        assert!(!detect_short_def("if (x) = weird"));
        assert!(!detect_short_def("f(x) >= 3"));
    }

    #[test]
    fn test_version_is_kept() {
        let frontend = BlockFrontend::new(SyntaxVersion { major: 1, minor: 6 });
        assert_eq!(frontend.version().minor, 6);
    }
}
