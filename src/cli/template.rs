//! Template command implementation

use anyhow::Result;

use crate::model::{Niche, TemplateType};
use crate::templates::{TemplateContext, TemplateResolver};

pub fn run(
    resolver: &TemplateResolver,
    niche: Niche,
    template_type: TemplateType,
    context: &TemplateContext,
) -> Result<()> {
    let resolved = resolver.resolve(niche, template_type, context);
    println!("Fallback level: {}", resolved.fallback_level.as_str());
    println!("{}", "-".repeat(40));
    println!("{}", resolved.template.trim_end());
    Ok(())
}
