//! Vertical card display for classifications, plans and resolved articles.

use lexkor_ai::Intent;
use lexkor_core::Plan;
use lexkor_law::ResolvedArticle;

/// Article text shown in a card before it is cut off.
const MAX_TEXT_CHARS: usize = 1200;

pub fn print_classification(query: &str, intent: Intent, confidence: f32, mode: Intent) {
    println!("=== {query} ===");
    println!();
    println!("Classification");
    field("intent", intent.as_str());
    field("confidence", &format!("{confidence:.2}"));
    field("threshold", &format!("{:.2}", intent.threshold()));
    field("mode", mode.as_str());
}

pub fn print_plan_card(query: &str, plan: &Plan) {
    println!("=== {query} ===");
    println!();
    println!("Plan");
    field("action", plan.action.as_str());
    optional("law_name", &plan.law_name);
    optional("article_label", &plan.article_label);
    optional("mst", &plan.mst);
    optional("jo", &plan.jo);
    optional("efYd", &plan.ef_yd);
    optional("notes", &plan.notes);

    if !plan.candidates.is_empty() {
        println!();
        println!("Candidates");
        for (i, c) in plan.candidates.iter().enumerate() {
            let label = format!("{}.", i + 1);
            let mut line = format!("{} {}", c.law_name, c.article_label);
            if !c.jo.is_empty() {
                line.push_str(&format!(" (jo {})", c.jo));
            }
            field(&label, line.trim());
        }
    }

    if plan.is_parse_error() {
        println!();
        println!("Raw output");
        println!("{}", truncate(&plan.raw, MAX_TEXT_CHARS));
    }
}

pub fn print_resolved_card(law: &str, article: &str, resolved: &ResolvedArticle) {
    let title = format!("{law} {article}");
    println!("=== {} ===", title.trim());
    println!();
    field("link", or_dash(&resolved.link));
    field("text_chars", &resolved.text.chars().count().to_string());
    if !resolved.text.is_empty() {
        println!();
        println!("{}", truncate(&resolved.text, MAX_TEXT_CHARS));
    }
}

fn field(name: &str, value: &str) {
    println!("  {:<26} {}", name, value);
}

fn optional(name: &str, value: &str) {
    if !value.is_empty() {
        field(name, value);
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("\n  ...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("가나다", 5), "가나다");
        assert_eq!(truncate("가나다라", 2), "가나\n  ...");
    }

    #[test]
    fn empty_values_render_as_dash() {
        assert_eq!(or_dash(""), "-");
        assert_eq!(or_dash("x"), "x");
    }
}
