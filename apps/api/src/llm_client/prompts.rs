// Prompt constants and builders for suggestion rewrites.

use crate::analysis::rewrite::RewriteContext;

/// System prompt for every rewrite call.
pub const REWRITE_SYSTEM: &str = "You are an expert resume editor. \
    You rewrite a single resume line so it reads well to both recruiters and \
    applicant tracking systems. \
    Respond with the rewritten line only: no quotes, no markdown, no explanation.";

/// Appended to every rewrite prompt.
pub const TRUTHFULNESS_INSTRUCTION: &str = "\
    CRITICAL: Keep every fact from the original line. Do NOT invent employers, numbers, \
    tools or responsibilities. If the requested keyword cannot be added truthfully, \
    return the original line with only wording improvements.";

pub fn build_rewrite_prompt(context: &RewriteContext) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Section: {}\n", context.section_heading));
    if let Some(entry) = &context.entry_heading {
        prompt.push_str(&format!("Entry: {entry}\n"));
    }
    if !context.neighbours.is_empty() {
        prompt.push_str("Other lines in this entry:\n");
        for line in &context.neighbours {
            prompt.push_str(&format!("- {line}\n"));
        }
    }

    prompt.push_str(&format!("\nIssue: {}\n", context.issue));
    if let Some(target) = &context.target {
        prompt.push_str(&format!("Keyword to work in: {target}\n"));
    }

    match &context.original {
        Some(original) => prompt.push_str(&format!("\nRewrite this line:\n{original}\n\n")),
        None => prompt.push_str("\nWrite one new line for this section that addresses the issue.\n\n"),
    }
    prompt.push_str(TRUTHFULNESS_INSTRUCTION);
    prompt
}
