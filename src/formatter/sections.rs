//! Line-level structure detection for recipe markdown.
//!
//! Everything here is heuristic: a line that does not look like a known
//! construct is reported as plain content and the caller decides what to do.

/// Which part of the recipe the current line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Ingredients,
    Instructions,
    Other,
}

/// A markdown ATX heading: level and text without the leading `#`s
pub(crate) fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some((level, rest.trim()))
    } else {
        None
    }
}

/// Section a heading opens, if it names one
pub(crate) fn section_for_heading(text: &str) -> Option<Section> {
    let name = text
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim_end_matches(':')
        .trim()
        .to_lowercase();

    if name.starts_with("ingredient") {
        Some(Section::Ingredients)
    } else if ["instruction", "direction", "step", "method", "preparation"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        Some(Section::Instructions)
    } else {
        None
    }
}

/// `---`, `***` or `___` on a line of its own
pub(crate) fn is_rule(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_')
        && trimmed.len() >= 3
        && trimmed.chars().all(|c| c == first)
}

pub(crate) fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

pub(crate) fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Nested content: two or more leading spaces, or a tab
pub(crate) fn is_indented(line: &str) -> bool {
    line.starts_with('\t') || line.starts_with("  ")
}

pub(crate) fn split_indent(line: &str) -> (&str, &str) {
    let body = line.trim_start();
    (&line[..line.len() - body.len()], body)
}

/// Leading list marker on a trimmed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Bullet,
    Ordered,
}

/// Strip a bullet (`-`, `*`, `+`, `•`) or ordered (`1.`, `2)`) marker.
pub(crate) fn strip_list_marker(text: &str) -> Option<(Marker, &str)> {
    if let Some(rest) = text.strip_prefix('•') {
        return Some((Marker::Bullet, rest.trim_start()));
    }
    if let Some(rest) = text.strip_prefix(['-', '*', '+']) {
        if rest.starts_with(char::is_whitespace) {
            return Some((Marker::Bullet, rest.trim_start()));
        }
        return None;
    }

    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = text[digits..].strip_prefix(['.', ')'])?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => Some((Marker::Ordered, rest.trim_start())),
        // "1.Mix" but not "1.5 cups"
        Some(c) if c.is_alphabetic() => Some((Marker::Ordered, rest)),
        _ => None,
    }
}

/// Strip any step prefix: list markers and "Step 3:" / "**Step 3.**" labels.
pub(crate) fn strip_step_marker(text: &str) -> Option<&str> {
    let after_marker = strip_list_marker(text).map(|(_, rest)| rest);
    let candidate = after_marker.unwrap_or(text);
    match strip_step_label(candidate) {
        Some(rest) => Some(rest),
        None => after_marker,
    }
}

fn strip_step_label(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("**").unwrap_or(text);
    if !rest
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("step"))
    {
        return None;
    }
    let rest = rest[4..].trim_start();
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = rest[digits..]
        .trim_start_matches(|c: char| matches!(c, ':' | '.' | ')' | '-' | '*'))
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Group labels such as "**For the sauce:**", "*Topping*" or "For the dough:"
pub(crate) fn is_label(text: &str) -> bool {
    let text = text.trim();
    if text.len() < 3 {
        return false;
    }

    let bold = text.starts_with("**") && (text.ends_with("**") || text.ends_with("**:"));
    let italic = (text.starts_with('*') && text.ends_with('*') && !text.starts_with("* "))
        || (text.starts_with('_') && text.ends_with('_'));
    if bold || italic {
        return true;
    }

    text.ends_with(':')
        && !text.chars().any(|c| c.is_ascii_digit())
        && text.split_whitespace().count() <= 6
}

/// Column positions of an ingredient table, read from its header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TableLayout {
    pub quantity: Option<usize>,
    pub unit: Option<usize>,
}

impl TableLayout {
    pub(crate) fn from_header(cells: &[&str]) -> Self {
        let find = |names: &[&str]| {
            cells.iter().position(|cell| {
                let cell = cell.trim().trim_matches('*').to_lowercase();
                names.iter().any(|name| cell == *name || cell.starts_with(name))
            })
        };

        Self {
            quantity: find(&["quantity", "amount", "qty"]),
            unit: find(&["unit"]),
        }
    }
}

pub(crate) fn table_cells(row: &str) -> Vec<&str> {
    let inner = row.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').collect()
}

/// `|---|:---:|` delimiter row
pub(crate) fn is_table_separator(cells: &[&str]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let cell = cell.trim();
            !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':') && cell.contains('-')
        })
}

pub(crate) fn render_table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}
