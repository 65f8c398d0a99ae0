//! Model-output parser
//!
//! Turns raw model text into a sequence of [`RawTuple`]s. The response is
//! requested as a literal list of tuples, but generative models routinely
//! return malformed quoting, truncated lists, or surrounding narration, so
//! parsing is total: a strict literal parse is attempted first and a
//! repairing fallback takes over when it fails. Unsalvageable input yields
//! an empty sequence, never an error.

use graphmill_core::RawTuple;

/// Parse raw model output into tuples.
///
/// Primary path: strict literal-list parse, returned verbatim on success.
/// Fallback path: bracket stripping, top-level comma splitting, and
/// unterminated-quote repair. Fallback output carries no arity guarantee;
/// the validator drops anything that is not the expected shape.
pub fn parse(raw: &str) -> Vec<RawTuple> {
    let stripped = strip_code_fences(raw);
    let stripped = stripped.trim();

    if stripped.is_empty() {
        return Vec::new();
    }

    if let Some(tuples) = parse_literal(stripped) {
        return tuples;
    }

    // Narration around an otherwise well-formed list is common; retry the
    // strict parse on the outermost bracketed slice before giving up on it.
    if let (Some(start), Some(end)) = (stripped.find('['), stripped.rfind(']')) {
        if start < end {
            let slice = &stripped[start..=end];
            if let Some(tuples) = parse_literal(slice) {
                return tuples;
            }
            return repair(slice);
        }
    }

    repair(stripped)
}

/// Unwrap a Markdown code fence if the whole response is inside one.
///
/// The prompts forbid fences, but models add them anyway.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return raw;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return raw;
    };

    // Skip a language tag on the fence line ("```python\n...")
    match body.find('\n') {
        Some(idx) => &body[idx + 1..],
        None => body,
    }
}

// ============================================================================
// Strict literal parser
// ============================================================================

/// Parse a well-formed literal list of string tuples:
/// `[("a", "b"), ("c", "d", "e")]`
///
/// Returns `None` on the first deviation from that grammar, handing off to
/// the repair path. Both quote styles and backslash escapes are accepted;
/// trailing commas are tolerated.
fn parse_literal(input: &str) -> Option<Vec<RawTuple>> {
    let mut scanner = Scanner::new(input);

    scanner.skip_whitespace();
    scanner.eat('[')?;

    let mut tuples = Vec::new();
    loop {
        scanner.skip_whitespace();
        if scanner.try_eat(']') {
            break;
        }

        tuples.push(scanner.parse_tuple()?);

        scanner.skip_whitespace();
        if scanner.try_eat(',') {
            continue;
        }
        scanner.eat(']')?;
        break;
    }

    scanner.skip_whitespace();
    if !scanner.at_end() {
        return None;
    }

    Some(tuples)
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume `expected` or fail the parse.
    fn eat(&mut self, expected: char) -> Option<()> {
        (self.bump()? == expected).then_some(())
    }

    /// Consume `expected` if it is next; never fails.
    fn try_eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `("field", "field", ...)` with at least one field.
    fn parse_tuple(&mut self) -> Option<RawTuple> {
        self.eat('(')?;

        let mut fields = Vec::new();
        loop {
            self.skip_whitespace();
            fields.push(self.parse_string()?);

            self.skip_whitespace();
            if self.try_eat(',') {
                self.skip_whitespace();
                // Trailing comma before the closing paren
                if self.try_eat(')') {
                    break;
                }
                continue;
            }
            self.eat(')')?;
            break;
        }

        Some(RawTuple::new(fields))
    }

    /// A quoted string with backslash escapes. Unterminated quotes fail the
    /// strict parse and route the whole response through repair.
    fn parse_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        if quote != '"' && quote != '\'' {
            return None;
        }

        let mut value = String::new();
        loop {
            match self.bump()? {
                c if c == quote => break,
                '\\' => {
                    let escaped = self.bump()?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        other => value.push(other),
                    }
                }
                c => value.push(c),
            }
        }

        Some(value)
    }
}

// ============================================================================
// Repair fallback
// ============================================================================

/// Salvage tuples from malformed output.
///
/// Strips outer brackets, splits on commas at parenthesis depth zero, then
/// splits each group into fields, appending a missing closing quote where a
/// field opens one and never closes it. Groups with neither parentheses nor
/// quoted fields are narration, not tuples, and are discarded here; every
/// other shape defect is left for the validator to drop.
fn repair(input: &str) -> Vec<RawTuple> {
    let mut body = input.trim();
    // Brackets are stripped independently so a truncated list (opened but
    // never closed) still repairs.
    body = body.strip_prefix('[').unwrap_or(body);
    body = body.strip_suffix(']').unwrap_or(body);
    let body = body.trim();

    split_top_level(body)
        .into_iter()
        .filter(|group| looks_like_tuple(group))
        .map(|group| repair_group(&group))
        .collect()
}

/// Split on commas outside parentheses. Quote state is deliberately ignored:
/// an unterminated quote is exactly the malformation this path exists for,
/// and honoring it would swallow the rest of the response into one group.
fn split_top_level(body: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;

    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    groups.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        groups.push(current.trim().to_string());
    }

    groups
}

fn looks_like_tuple(group: &str) -> bool {
    group.contains('(') || group.contains('"') || group.contains('\'')
}

fn repair_group(group: &str) -> RawTuple {
    let mut inner = group.trim();
    inner = inner.strip_prefix('(').unwrap_or(inner);
    inner = inner.strip_suffix(')').unwrap_or(inner);

    let fields = inner
        .split(',')
        .map(repair_field)
        .filter(|f| !f.is_empty())
        .collect();

    RawTuple::new(fields)
}

/// Close an unterminated quote, then strip the surrounding quote pair.
fn repair_field(field: &str) -> String {
    let mut repaired = field.trim().to_string();

    for quote in ['"', '\''] {
        if repaired.starts_with(quote) && (repaired.len() == 1 || !repaired.ends_with(quote)) {
            repaired.push(quote);
        }
    }

    for quote in ['"', '\''] {
        if repaired.len() >= 2 && repaired.starts_with(quote) && repaired.ends_with(quote) {
            repaired = repaired[1..repaired.len() - 1].to_string();
            break;
        }
    }

    repaired.trim().to_string()
}

// ============================================================================
// Tests
// ============================================================================
