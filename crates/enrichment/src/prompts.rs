//! Prompt templates for the AI service
//!
//! Split into system (static) and user (per call) parts.

pub const FEATURES_SYSTEM: &str = include_str!("../assets/prompts/features_system.txt");
pub const FEATURES_USER: &str = include_str!("../assets/prompts/features_user.txt");

pub const KEYWORDS_SYSTEM: &str = include_str!("../assets/prompts/keywords_system.txt");
pub const KEYWORDS_USER: &str = include_str!("../assets/prompts/keywords_user.txt");

pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}
