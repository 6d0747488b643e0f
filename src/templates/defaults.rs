//! Built-in templates compiled into the binary

use super::TemplateCategory;

const REQUIREMENTS: &str = include_str!("../../templates/specs/requirements.md");
const DESIGN: &str = include_str!("../../templates/specs/design.md");
const TASKS: &str = include_str!("../../templates/specs/tasks.md");

const PRODUCT: &str = include_str!("../../templates/steering/product.md");
const TECH: &str = include_str!("../../templates/steering/tech.md");
const STRUCTURE: &str = include_str!("../../templates/steering/structure.md");

pub const STEERING_NAMES: &[&str] = &["product", "tech", "structure"];
pub const SPEC_NAMES: &[&str] = &["requirements", "design", "tasks"];

pub fn names(category: TemplateCategory) -> &'static [&'static str] {
    match category {
        TemplateCategory::Steering => STEERING_NAMES,
        TemplateCategory::Specs => SPEC_NAMES,
    }
}

pub fn builtin(category: TemplateCategory, name: &str) -> Option<&'static str> {
    match (category, name) {
        (TemplateCategory::Specs, "requirements") => Some(REQUIREMENTS),
        (TemplateCategory::Specs, "design") => Some(DESIGN),
        (TemplateCategory::Specs, "tasks") => Some(TASKS),
        (TemplateCategory::Steering, "product") => Some(PRODUCT),
        (TemplateCategory::Steering, "tech") => Some(TECH),
        (TemplateCategory::Steering, "structure") => Some(STRUCTURE),
        _ => None,
    }
}
