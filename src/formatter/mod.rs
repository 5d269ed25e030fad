//! Deterministic post-processing of extracted recipe markdown.
//!
//! [`RecipeFormatter`] walks the document line by line, tracking which
//! section it is in. Ingredient lines get unit and fraction normalization
//! and a consistent bullet, instruction steps are renumbered from 1, and
//! everything it does not recognize passes through untouched. Formatting
//! an already formatted document returns it unchanged.

mod fractions;
mod sections;
mod units;

use log::debug;

use crate::config::FormattingConfig;
use crate::error::RecipeDuckError;
use fractions::FractionNormalizer;
use sections::{Marker, Section, TableLayout};
use units::UnitNormalizer;

/// Rule-based formatter for recipe markdown.
///
/// # Example
///
/// ```
/// use recipe_duck::{FormattingConfig, RecipeFormatter};
///
/// let formatter = RecipeFormatter::new(FormattingConfig::default()).unwrap();
/// let markdown = formatter.format("## Ingredients\n* ½ c sugar\n\n## Instructions\n3. Mix\n3. Bake");
/// assert_eq!(
///     markdown,
///     "## Ingredients\n- 1/2 cup sugar\n\n## Instructions\n1. Mix\n2. Bake"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RecipeFormatter {
    config: FormattingConfig,
    fractions: FractionNormalizer,
    units: UnitNormalizer,
}

impl RecipeFormatter {
    /// Build a formatter, validating `config` first.
    pub fn new(config: FormattingConfig) -> Result<Self, RecipeDuckError> {
        config.validate()?;
        let fractions = FractionNormalizer::new(&config);
        let units = UnitNormalizer::new(&config, &fractions)?;
        Ok(Self {
            config,
            fractions,
            units,
        })
    }

    pub fn config(&self) -> &FormattingConfig {
        &self.config
    }

    /// Format a whole recipe document. Never fails: anything that cannot be
    /// recognized is copied through.
    pub fn format(&self, markdown: &str) -> String {
        if !self.config.enabled {
            return markdown.to_string();
        }

        let lines: Vec<&str> = markdown.split('\n').collect();
        let mut walk = Walk::default();
        for (index, raw) in lines.iter().enumerate() {
            let (line, cr) = match raw.strip_suffix('\r') {
                Some(line) => (line, "\r"),
                None => (*raw, ""),
            };
            walk.ordered_follows = ordered_item_follows(&lines[index + 1..]);
            self.format_line(&mut walk, line, cr);
        }

        debug!(
            "Formatted recipe markdown: {} lines, {} steps",
            walk.out.len(),
            walk.step
        );
        walk.out.join("\n")
    }

    /// Fraction then unit normalization of a single piece of text.
    pub fn normalize_quantities(&self, text: &str) -> String {
        let text = self.normalize_fractions(text);
        self.units.normalize(&text)
    }

    fn normalize_fractions(&self, text: &str) -> String {
        if self.config.fraction_conversion {
            self.fractions.normalize(text)
        } else {
            text.to_string()
        }
    }

    fn format_line(&self, walk: &mut Walk, line: &str, cr: &str) {
        if walk.in_fence {
            if sections::is_fence(line) {
                walk.in_fence = false;
            }
            return walk.push(line, cr);
        }
        if sections::is_fence(line) {
            walk.in_fence = true;
            return walk.push(line, cr);
        }

        if line.trim().is_empty() {
            walk.table = None;
            return walk.push(line, cr);
        }

        if let Some((level, text)) = sections::heading(line) {
            walk.enter_heading(level, text);
            return walk.push(line, cr);
        }

        if sections::is_rule(line) {
            walk.leave_section();
            return walk.push(line, cr);
        }

        // "**Ingredients:**" written as a bold line instead of a heading
        if !sections::is_indented(line) && sections::is_label(line) {
            if let Some(section) = label_section(line) {
                walk.enter_section(section);
                return walk.push(line, cr);
            }
        }

        if !sections::is_table_row(line) {
            walk.table = None;
        }

        match walk.section {
            Section::Ingredients if sections::is_table_row(line) => {
                let row = self.format_table_row(walk, line);
                walk.push(&row, cr);
            }
            Section::Ingredients => {
                let formatted = self.format_ingredient(line);
                walk.push(&formatted, cr);
            }
            Section::Instructions if sections::is_table_row(line) => {
                let formatted = self.normalize_fractions(line);
                walk.push(&formatted, cr);
            }
            Section::Instructions => self.format_instruction(walk, line, cr),
            Section::Other => format_other(walk, line, cr),
        }
    }

    fn format_ingredient(&self, line: &str) -> String {
        let (indent, body) = sections::split_indent(line);

        let item = match sections::strip_list_marker(body) {
            Some((_, item)) => item,
            None if sections::is_label(body) => return line.to_string(),
            None => body,
        };
        let marker = &body[..body.len() - item.len()];

        let item = self.normalize_quantities(item);
        if self.config.enforce_ingredient_bullets {
            format!("{}{} {}", indent, self.config.ingredient_bullet, item)
        } else {
            format!("{}{}{}", indent, marker, item)
        }
    }

    fn format_instruction(&self, walk: &mut Walk, line: &str, cr: &str) {
        // Sub-bullets and continuation lines keep their structure
        if sections::is_indented(line) {
            let formatted = self.normalize_fractions(line);
            return walk.push(&formatted, cr);
        }

        let (indent, body) = sections::split_indent(line);
        let text = match sections::strip_step_marker(body) {
            Some(text) => text,
            None if sections::is_label(body) => return walk.push(line, cr),
            None if !self.config.enforce_numbered_steps => {
                let formatted = format!("{}{}", indent, self.normalize_fractions(body));
                return walk.push(&formatted, cr);
            }
            None => body,
        };

        walk.step += 1;
        if self.config.blank_line_between_steps && walk.step > 1 && !walk.last_is_blank() {
            walk.push("", cr);
        }
        let formatted = format!("{}. {}", walk.step, self.normalize_fractions(text));
        walk.push(&formatted, cr);
    }

    fn format_table_row(&self, walk: &mut Walk, line: &str) -> String {
        let cells = sections::table_cells(line);

        let Some(layout) = walk.table else {
            walk.table = Some(TableLayout::from_header(&cells));
            return line.to_string();
        };
        if sections::is_table_separator(&cells) {
            return line.to_string();
        }

        let quantity = layout
            .quantity
            .and_then(|index| cells.get(index))
            .map(|cell| self.normalize_fractions(cell.trim()));

        let original: Vec<&str> = cells.iter().map(|cell| cell.trim()).collect();
        let formatted: Vec<String> = original
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                if Some(index) == layout.unit {
                    self.units
                        .normalize_unit_cell(cell, quantity.as_deref())
                        .unwrap_or_else(|| cell.to_string())
                } else {
                    self.normalize_quantities(cell)
                }
            })
            .collect();

        if formatted.iter().zip(&original).all(|(new, old)| new == old) {
            line.to_string()
        } else {
            sections::render_table_row(&formatted)
        }
    }
}

/// Outside ingredients and instructions only ordered lists are touched:
/// each block of two or more items is renumbered from 1. A lone numbered
/// line ("2019. A vintage year") is prose and stays as written.
fn format_other(walk: &mut Walk, line: &str, cr: &str) {
    if sections::is_indented(line) {
        return walk.push(line, cr);
    }

    match sections::strip_list_marker(line.trim_start()) {
        Some((Marker::Ordered, text)) if walk.list_item > 0 || walk.ordered_follows => {
            walk.list_item += 1;
            let formatted = format!("{}. {}", walk.list_item, text);
            walk.push(&formatted, cr);
        }
        _ => {
            walk.list_item = 0;
            walk.push(line, cr);
        }
    }
}

/// Whether the next line that is neither blank nor indented is an ordered
/// list item, i.e. the current item has a successor in its block.
fn ordered_item_follows(rest: &[&str]) -> bool {
    rest.iter()
        .copied()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .find(|line| !line.trim().is_empty() && !sections::is_indented(line))
        .is_some_and(|line| {
            matches!(
                sections::strip_list_marker(line.trim_start()),
                Some((Marker::Ordered, _))
            )
        })
}

fn label_section(line: &str) -> Option<Section> {
    let text = line.trim().trim_matches(|c: char| c == '*' || c == '_');
    sections::section_for_heading(text)
}

/// Mutable state for one pass over a document
struct Walk {
    out: Vec<String>,
    section: Section,
    step: usize,
    list_item: usize,
    in_fence: bool,
    table: Option<TableLayout>,
    /// Lookahead: another ordered item continues the current block
    ordered_follows: bool,
}

impl Default for Walk {
    fn default() -> Self {
        Self {
            out: Vec::new(),
            section: Section::Other,
            step: 0,
            list_item: 0,
            in_fence: false,
            table: None,
            ordered_follows: false,
        }
    }
}

impl Walk {
    fn push(&mut self, line: &str, cr: &str) {
        self.out.push(format!("{}{}", line, cr));
    }

    fn last_is_blank(&self) -> bool {
        self.out.last().is_some_and(|line| line.trim().is_empty())
    }

    fn enter_heading(&mut self, level: usize, text: &str) {
        match sections::section_for_heading(text) {
            // "### Step 2" inside the instructions is a sub-heading
            Some(Section::Instructions) if self.section == Section::Instructions && level >= 3 => {}
            Some(section) => self.enter_section(section),
            None if level <= 2 => self.leave_section(),
            None => {}
        }
        self.table = None;
        self.list_item = 0;
    }

    fn enter_section(&mut self, section: Section) {
        if section == Section::Instructions {
            self.step = 0;
        }
        self.section = section;
        self.table = None;
        self.list_item = 0;
    }

    fn leave_section(&mut self) {
        self.section = Section::Other;
        self.table = None;
        self.list_item = 0;
    }
}
