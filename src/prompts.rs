use crate::models::Tier;

pub const VISUALIZATION: &str = include_str!("../data/prompts/visualization.txt");
pub const INTERPRET_STANDARD_SYSTEM: &str =
    include_str!("../data/prompts/interpret_standard_system.txt");
pub const INTERPRET_STANDARD_USER: &str =
    include_str!("../data/prompts/interpret_standard_user.txt");
pub const INTERPRET_PREMIUM_SYSTEM: &str =
    include_str!("../data/prompts/interpret_premium_system.txt");
pub const INTERPRET_PREMIUM_USER: &str = include_str!("../data/prompts/interpret_premium_user.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Frame raw dream text as an image/video generation prompt.
pub fn visualization(dream: &str) -> String {
    render(VISUALIZATION, &[("dream", dream.trim())])
        .trim()
        .to_string()
}

/// System and user templates for the interpretation stage.
pub fn interpretation_templates(tier: Tier) -> (&'static str, &'static str) {
    match tier {
        Tier::Standard => (INTERPRET_STANDARD_SYSTEM, INTERPRET_STANDARD_USER),
        Tier::Premium => (INTERPRET_PREMIUM_SYSTEM, INTERPRET_PREMIUM_USER),
    }
}
