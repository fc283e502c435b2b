//! Heuristic extraction of imports and contract declarations
//!
//! This is a line-level scan, not a grammar: an `import` statement is any
//! trimmed line starting with the `import` keyword (continued until its `;`),
//! and a declaration is any trimmed line starting with `contract`,
//! `abstract contract`, `interface` or `library`.

use serde::{Deserialize, Serialize};

/// Lines scanned past a declaration keyword looking for its opening brace
const MAX_HEADER_LINES: usize = 8;

/// Kind of a declared contract-like unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Contract,
    Abstract,
    Interface,
    Library,
}

/// A contract, interface, abstract contract or library and what it inherits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDecl {
    pub name: String,
    pub kind: ContractKind,
    pub inherits: Vec<String>,
}

/// Imports and declarations found in one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub path: String,
    /// Raw import targets in declaration order
    pub imports: Vec<String>,
    pub contracts: Vec<ContractDecl>,
}

/// Scan a file's text for import targets and contract declarations
pub fn parse_source(path: &str, text: &str) -> ParsedFile {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut imports = Vec::new();
    let mut contracts = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if is_import_line(line) {
            let mut statement = line.to_string();
            while !statement.contains([';', '"', '\'']) && i + 1 < lines.len() {
                i += 1;
                statement.push(' ');
                statement.push_str(lines[i]);
            }
            match quoted_target(&statement) {
                Some(target) => imports.push(target),
                None => log::debug!("{}: import without a quoted target: {}", path, line),
            }
        } else if let Some((kind, rest)) = declaration_keyword(line) {
            let mut header = rest.to_string();
            let mut j = i;
            while !header.contains('{') && j + 1 < lines.len() && j - i < MAX_HEADER_LINES {
                j += 1;
                header.push(' ');
                header.push_str(lines[j]);
            }
            if let Some(decl) = parse_declaration(kind, &header) {
                contracts.push(decl);
            }
        }

        i += 1;
    }

    ParsedFile {
        path: path.to_string(),
        imports,
        contracts,
    }
}

fn is_import_line(line: &str) -> bool {
    line.strip_prefix("import").is_some_and(|rest| {
        rest.starts_with(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == '{' || c == '*')
    })
}

/// The first single- or double-quoted string in a statement
fn quoted_target(statement: &str) -> Option<String> {
    let start = statement.find(['"', '\''])?;
    let quote = statement[start..].chars().next()?;
    let rest = &statement[start + 1..];
    let end = rest.find(quote)?;
    let target = rest[..end].trim();
    (!target.is_empty()).then(|| target.to_string())
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim_start)
}

fn declaration_keyword(line: &str) -> Option<(ContractKind, &str)> {
    if let Some(rest) = strip_keyword(line, "abstract") {
        return strip_keyword(rest, "contract").map(|r| (ContractKind::Abstract, r));
    }
    if let Some(rest) = strip_keyword(line, "contract") {
        return Some((ContractKind::Contract, rest));
    }
    if let Some(rest) = strip_keyword(line, "interface") {
        return Some((ContractKind::Interface, rest));
    }
    strip_keyword(line, "library").map(|r| (ContractKind::Library, r))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn parse_declaration(kind: ContractKind, header: &str) -> Option<ContractDecl> {
    let name_len = header.find(|c: char| !is_ident_char(c)).unwrap_or(header.len());
    if name_len == 0 {
        return None;
    }
    let name = header[..name_len].to_string();

    let after_name = header[name_len..].trim_start();
    let inherits = match after_name.strip_prefix("is") {
        Some(list) if list.starts_with(|c: char| c.is_whitespace()) => {
            let list = list.split('{').next().unwrap_or_default();
            split_top_level(list)
                .into_iter()
                .filter_map(|entry| {
                    let entry = entry.trim();
                    let len = entry
                        .find(|c: char| !(is_ident_char(c) || c == '.'))
                        .unwrap_or(entry.len());
                    (len > 0).then(|| entry[..len].to_string())
                })
                .collect()
        }
        _ => Vec::new(),
    };

    Some(ContractDecl {
        name,
        kind,
        inherits,
    })
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

#[cfg(test)]
#[path = "imports_test.rs"]
mod tests;
