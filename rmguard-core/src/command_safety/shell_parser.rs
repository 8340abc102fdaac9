//! Shell command parser built on the tree-sitter bash grammar.
//!
//! Parses a raw command string into its simple-command nodes and extracts
//! their words in order:
//! ```text
//! Input:  "cd /tmp && sudo rm -rf build logs"
//! Output: [["cd", "/tmp"], ["sudo", "rm", "-rf", "build", "logs"]]
//! ```
//!
//! Words produced by substitution or expansion (`$VAR`, `$(...)`, `${...}`)
//! are extracted as opaque placeholders (`None`) and never resolved: a path
//! the guard cannot see literally is never treated as a deletion target.
//!
//! Unlike lenient safety scanners there is no tokenization fallback here.
//! A script the grammar cannot fully parse is a hard error; the caller
//! blocks the whole command. Silently ignoring unparseable input would let
//! an unprotected deletion through.

use std::sync::Mutex;
use std::sync::OnceLock;

use crate::error::GuardError;

/// A simple command's words in order. `None` marks a word whose value is
/// only known at execution time (substitution, expansion).
pub type CommandWords = Vec<Option<String>>;

/// Lazy-initialized tree-sitter bash parser (wrapped in Mutex for mutation)
static BASH_PARSER: OnceLock<Mutex<tree_sitter::Parser>> = OnceLock::new();

fn get_bash_parser() -> &'static Mutex<tree_sitter::Parser> {
    BASH_PARSER.get_or_init(|| {
        let mut parser = tree_sitter::Parser::new();
        let lang: tree_sitter::Language = tree_sitter_bash::LANGUAGE.into();
        parser
            .set_language(&lang)
            .expect("Failed to load bash grammar");
        Mutex::new(parser)
    })
}

/// Parse `script` and return the words of every simple command in it,
/// including commands nested in pipelines, lists, subshells, redirections,
/// and command substitutions.
///
/// Returns [`GuardError::ParseFailure`] when the grammar reports an error
/// anywhere in the tree.
pub fn parse_command_words(script: &str) -> Result<Vec<CommandWords>, GuardError> {
    let parser_guard = get_bash_parser();
    let mut parser = parser_guard
        .lock()
        .map_err(|e| GuardError::ParseFailure(format!("parser unavailable: {e}")))?;

    let tree = parser
        .parse(script, None)
        .ok_or_else(|| GuardError::ParseFailure("parser produced no syntax tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(GuardError::ParseFailure(
            "command contains shell syntax the guard cannot verify".to_string(),
        ));
    }

    let mut commands = Vec::new();
    collect_commands(root, script, &mut commands);
    Ok(commands)
}

/// Depth-first walk collecting every `command` node. Commands inside
/// substitutions are collected too; a deletion hidden in `$(...)` still
/// has to be seen.
fn collect_commands(node: tree_sitter::Node, source: &str, out: &mut Vec<CommandWords>) {
    if node.kind() == "command" {
        let words = extract_words(node, source);
        if !words.is_empty() {
            out.push(words);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_commands(child, source, out);
    }
}

/// Extract the argument words of one `command` node in order. Prefix
/// variable assignments and redirections are not words and are skipped.
fn extract_words(node: tree_sitter::Node, source: &str) -> CommandWords {
    let mut words = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "command_name" => {
                let mut inner = child.walk();
                for name_part in child.children(&mut inner) {
                    words.push(literal_word(name_part, source));
                }
            }
            "variable_assignment" | "file_redirect" | "heredoc_redirect"
            | "herestring_redirect" => {}
            kind if is_word_kind(kind) => {
                words.push(literal_word(child, source));
            }
            _ => {}
        }
    }

    words
}

fn is_word_kind(kind: &str) -> bool {
    matches!(
        kind,
        "word"
            | "number"
            | "string"
            | "raw_string"
            | "ansi_c_string"
            | "concatenation"
            | "simple_expansion"
            | "expansion"
            | "command_substitution"
            | "arithmetic_expansion"
            | "process_substitution"
    )
}

/// Literal text of a word node, or `None` when any part of it is produced
/// at execution time.
fn literal_word(node: tree_sitter::Node, source: &str) -> Option<String> {
    match node.kind() {
        "word" | "number" => node
            .utf8_text(source.as_bytes())
            .ok()
            .map(|text| text.to_string()),
        "raw_string" => node
            .utf8_text(source.as_bytes())
            .ok()
            .map(|text| strip_delimiters(text, "'", "'")),
        "ansi_c_string" => node
            .utf8_text(source.as_bytes())
            .ok()
            .map(|text| strip_delimiters(text, "$'", "'")),
        "string" => literal_string(node, source),
        "concatenation" => {
            let mut combined = String::new();
            let mut cursor = node.walk();
            for part in node.children(&mut cursor) {
                combined.push_str(&literal_word(part, source)?);
            }
            Some(combined)
        }
        // Substitutions and expansions are opaque until execution.
        _ => None,
    }
}

/// A double-quoted string is literal only when every named child is plain
/// string content.
fn literal_string(node: tree_sitter::Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let mut content = String::new();
    for part in node.named_children(&mut cursor) {
        if part.kind() != "string_content" {
            return None;
        }
        content.push_str(part.utf8_text(source.as_bytes()).ok()?);
    }
    Some(content)
}

fn strip_delimiters(text: &str, open: &str, close: &str) -> String {
    let inner = text.strip_prefix(open).unwrap_or(text);
    inner.strip_suffix(close).unwrap_or(inner).to_string()
}
