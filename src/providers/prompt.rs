/// Markdown layout every extracted recipe is asked to follow.
pub const RECIPE_TEMPLATE: &str = "# Recipe Title

**Servings:** number of servings
**Prep Time:** preparation time
**Cook Time:** cooking time
**Source:** where the recipe comes from

## Ingredients

- quantity unit ingredient
- quantity unit ingredient

## Instructions

1. First step
2. Second step

## Notes

Tips, variations and storage notes.
";

/// Build the extraction prompt, describing where the recipe comes from.
///
/// `source` is a short phrase such as "this recipe image" or "the web page
/// text below".
pub fn build_extraction_prompt(source: &str) -> String {
    format!(
        "Analyze {source} and extract the recipe information into a structured markdown format.

You MUST follow this exact template structure:

{RECIPE_TEMPLATE}
Instructions:
- Extract all text accurately, preserving measurements and quantities
- Fill in the template with the actual recipe information
- Use the exact section headers shown in the template (# Title, ## Ingredients, ## Instructions, ## Notes)
- For Ingredients: use bullet points (-) with quantities and units when given
- For Instructions: use numbered lists (1., 2., 3., etc.) with clear, actionable steps
- If a section is not available, include the header and note that the information is not available
- Do not add any text outside of this template structure"
    )
}

/// Prompt for locating a print-friendly version of `page_url`.
///
/// The excerpt of print-related markup is sent alongside as the input text.
pub fn build_print_detection_prompt(page_url: &str) -> String {
    format!(
        "The markup below was taken from the recipe page {page_url}. It lists the links, \
buttons and scripts on that page that mention printing.

Find the URL of the print-friendly version of the recipe. Answer with that single URL \
and nothing else. Relative URLs are fine. If there is no print-friendly URL, or printing \
only opens the browser's print dialog, answer exactly NONE."
    )
}
