//! Prompt template resolution with an exact → default → generic fallback chain
//!
//! Templates are loaded from a YAML document keyed by niche (plus a
//! `default` entry) and then by template type. The parsed set lives behind
//! an `RwLock<Arc<_>>`; `reload` builds a complete new set and swaps the
//! `Arc`, so readers see either the old map or the new one.
//!
//! Resolution never fails: a source that cannot be read or parsed is logged
//! and every lookup degrades to the generic template.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::model::{Niche, TemplateType};

const BUILTIN_TEMPLATES: &str = include_str!("../templates/builtin.yaml");
const DEFAULT_KEY: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    /// The niche has its own template
    Exact,
    /// Borrowed from the `default` niche
    Default,
    /// Synthesized from the niche and product name
    Generic,
}

impl FallbackLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackLevel::Exact => "exact",
            FallbackLevel::Default => "default",
            FallbackLevel::Generic => "generic",
        }
    }
}

/// Where template definitions come from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Builtin,
    File(PathBuf),
    Inline(String),
}

impl TemplateSource {
    fn read(&self) -> Result<String> {
        match self {
            TemplateSource::Builtin => Ok(BUILTIN_TEMPLATES.to_string()),
            TemplateSource::File(path) => Ok(std::fs::read_to_string(path)?),
            TemplateSource::Inline(yaml) => Ok(yaml.clone()),
        }
    }
}

/// Values substituted into the chosen template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    pub product: &'a str,
    pub tone: &'a str,
    pub trend_context: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTemplate {
    pub template: String,
    pub fallback_level: FallbackLevel,
}

#[derive(Debug, Default)]
struct TemplateSet {
    niches: HashMap<Niche, HashMap<TemplateType, String>>,
    defaults: HashMap<TemplateType, String>,
}

impl TemplateSet {
    fn parse(yaml: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, String>> =
            serde_yaml::from_str(yaml).map_err(|e| Error::Template(e.to_string()))?;

        let mut set = TemplateSet::default();
        for (niche_key, templates) in raw {
            let mut parsed = HashMap::new();
            for (type_key, template) in templates {
                let template_type = type_key
                    .parse::<TemplateType>()
                    .map_err(|e| Error::Template(format!("{}.{}: {}", niche_key, type_key, e)))?;
                parsed.insert(template_type, template);
            }

            if niche_key == DEFAULT_KEY {
                set.defaults = parsed;
            } else {
                let niche = niche_key
                    .parse::<Niche>()
                    .map_err(|e| Error::Template(format!("{}: {}", niche_key, e)))?;
                set.niches.insert(niche, parsed);
            }
        }
        Ok(set)
    }

    fn len(&self) -> usize {
        self.defaults.len() + self.niches.values().map(HashMap::len).sum::<usize>()
    }
}

pub struct TemplateResolver {
    source: TemplateSource,
    cache: RwLock<Arc<TemplateSet>>,
}

impl TemplateResolver {
    /// Load templates from `source`. A broken source is logged and leaves the
    /// resolver empty, so every lookup falls through to the generic template.
    pub fn new(source: TemplateSource) -> Self {
        let set = match Self::load(&source) {
            Ok(set) => set,
            Err(e) => {
                error!(
                    "[TemplateResolver] Failed to load templates from {:?}: {} (fallback level: generic)",
                    source, e
                );
                TemplateSet::default()
            }
        };

        Self {
            source,
            cache: RwLock::new(Arc::new(set)),
        }
    }

    pub fn builtin() -> Self {
        Self::new(TemplateSource::Builtin)
    }

    fn load(source: &TemplateSource) -> Result<TemplateSet> {
        let set = TemplateSet::parse(&source.read()?)?;
        info!("[TemplateResolver] Loaded {} templates", set.len());
        Ok(set)
    }

    /// Re-read the source and swap in the new set. On failure the current
    /// set stays in place and the error is returned to the caller.
    pub fn reload(&self) -> Result<()> {
        let set = Self::load(&self.source).map_err(|e| {
            error!("[TemplateResolver] Reload failed, keeping current templates: {}", e);
            e
        })?;

        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(set);
        Ok(())
    }

    fn snapshot(&self) -> Arc<TemplateSet> {
        let guard = self.cache.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn resolve(
        &self,
        niche: Niche,
        template_type: TemplateType,
        context: &TemplateContext,
    ) -> ResolvedTemplate {
        let set = self.snapshot();

        if let Some(template) = set.niches.get(&niche).and_then(|t| t.get(&template_type)) {
            return ResolvedTemplate {
                template: fill(template, context),
                fallback_level: FallbackLevel::Exact,
            };
        }

        if let Some(template) = set.defaults.get(&template_type) {
            warn!(
                "[TemplateResolver] No {} template for niche '{}', using default niche (fallback level: default)",
                template_type, niche
            );
            return ResolvedTemplate {
                template: fill(template, context),
                fallback_level: FallbackLevel::Default,
            };
        }

        warn!(
            "[TemplateResolver] No {} template for niche '{}' or default, using generic (fallback level: generic)",
            template_type, niche
        );
        ResolvedTemplate {
            template: fill(&generic_template(niche, template_type), context),
            fallback_level: FallbackLevel::Generic,
        }
    }
}

fn generic_template(niche: Niche, template_type: TemplateType) -> String {
    format!(
        "Create a {{tone}} {} for the {} product \"{{product}}\". {{trendContext}}\n\
         Make it engaging, specific to the {} audience, and end with a clear call to action.",
        template_type.as_str().replace('_', " "),
        niche,
        niche
    )
}

fn fill(template: &str, context: &TemplateContext) -> String {
    template
        .replace("{product}", context.product)
        .replace("{tone}", context.tone)
        .replace("{trendContext}", context.trend_context)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: TemplateContext<'static> = TemplateContext {
        product: "Glow Serum",
        tone: "friendly",
        trend_context: "Trending: glass skin",
    };

    fn inline(yaml: &str) -> TemplateResolver {
        TemplateResolver::new(TemplateSource::Inline(yaml.to_string()))
    }

    /// Formatted log output shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber that records every event it emits
    fn logged<T>(f: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        (value, output)
    }

    #[test]
    fn test_exact_match_substitutes_placeholders() {
        let resolver = inline(
            "tech:\n  caption: \"{tone} post about {product}. {trendContext}\"\n",
        );
        let resolved = resolver.resolve(Niche::Tech, TemplateType::Caption, &CONTEXT);
        assert_eq!(resolved.fallback_level, FallbackLevel::Exact);
        assert_eq!(resolved.template, "friendly post about Glow Serum. Trending: glass skin");
    }

    #[test]
    fn test_falls_back_to_default_niche() {
        let resolver = inline(
            "default:\n  seo_blog: \"Blog about {product}\"\ntech:\n  caption: \"Tech {product}\"\n",
        );
        let resolved = resolver.resolve(Niche::Tech, TemplateType::SeoBlog, &CONTEXT);
        assert_eq!(resolved.fallback_level, FallbackLevel::Default);
        assert_eq!(resolved.template, "Blog about Glow Serum");
    }

    #[test]
    fn test_falls_back_to_generic() {
        let resolver = inline("default:\n  caption: \"x\"\n");
        let resolved = resolver.resolve(Niche::Tech, TemplateType::SeoBlog, &CONTEXT);
        assert_eq!(resolved.fallback_level, FallbackLevel::Generic);
        assert!(resolved.template.contains("tech"));
        assert!(resolved.template.contains("Glow Serum"));
        assert!(resolved.template.contains("Trending: glass skin"));
        assert!(!resolved.template.contains("{product}"));
    }

    #[test]
    fn test_malformed_source_degrades_to_generic() {
        let resolver = inline("tech: [not, a, map");
        let resolved = resolver.resolve(Niche::Tech, TemplateType::Caption, &CONTEXT);
        assert_eq!(resolved.fallback_level, FallbackLevel::Generic);

        let resolver = inline("tech:\n  not_a_template_type: \"x\"\n");
        let resolved = resolver.resolve(Niche::Tech, TemplateType::Caption, &CONTEXT);
        assert_eq!(resolved.fallback_level, FallbackLevel::Generic);
    }

    #[test]
    fn test_missing_file_degrades_to_generic() {
        let resolver = TemplateResolver::new(TemplateSource::File(PathBuf::from(
            "/nonexistent/templates.yaml",
        )));
        let resolved = resolver.resolve(Niche::Food, TemplateType::Caption, &CONTEXT);
        assert_eq!(resolved.fallback_level, FallbackLevel::Generic);
        assert!(resolver.reload().is_err());
    }

    #[test]
    fn test_reload_swaps_templates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.yaml");
        std::fs::write(&path, "default:\n  caption: \"v1 {product}\"\n").unwrap();

        let resolver = TemplateResolver::new(TemplateSource::File(path.clone()));
        let before = resolver.resolve(Niche::Pet, TemplateType::Caption, &CONTEXT);
        assert_eq!(before.template, "v1 Glow Serum");

        std::fs::write(&path, "pet:\n  caption: \"v2 {product}\"\n").unwrap();
        resolver.reload().unwrap();
        let after = resolver.resolve(Niche::Pet, TemplateType::Caption, &CONTEXT);
        assert_eq!(after.template, "v2 Glow Serum");
        assert_eq!(after.fallback_level, FallbackLevel::Exact);

        std::fs::write(&path, "pet: [broken").unwrap();
        assert!(resolver.reload().is_err());
        let kept = resolver.resolve(Niche::Pet, TemplateType::Caption, &CONTEXT);
        assert_eq!(kept.template, "v2 Glow Serum");
    }

    #[test]
    fn test_fallback_levels_are_logged() {
        let resolver = inline(
            "default:\n  seo_blog: \"Blog about {product}\"\ntech:\n  caption: \"Tech {product}\"\n",
        );

        let (exact, output) = logged(|| resolver.resolve(Niche::Tech, TemplateType::Caption, &CONTEXT));
        assert_eq!(exact.fallback_level, FallbackLevel::Exact);
        assert!(!output.contains("WARN"));
        assert!(!output.contains("fallback level"));

        let (default, output) = logged(|| resolver.resolve(Niche::Tech, TemplateType::SeoBlog, &CONTEXT));
        assert_eq!(default.fallback_level, FallbackLevel::Default);
        assert!(output.contains("WARN"));
        assert!(output.contains("[TemplateResolver] No seo_blog template for niche 'tech'"));
        assert!(output.contains("fallback level: default"));

        let (generic, output) = logged(|| resolver.resolve(Niche::Tech, TemplateType::Routine, &CONTEXT));
        assert_eq!(generic.fallback_level, FallbackLevel::Generic);
        assert!(output.contains("WARN"));
        assert!(output.contains("[TemplateResolver]"));
        assert!(output.contains("fallback level: generic"));
        assert!(!output.contains("fallback level: default"));
    }

    #[test]
    fn test_load_failures_are_logged_as_errors() {
        let (resolver, output) = logged(|| inline("tech: [not, a, map"));
        assert!(output.contains("ERROR"));
        assert!(output.contains("[TemplateResolver] Failed to load templates"));
        assert!(output.contains("fallback level: generic"));

        let (result, output) = logged(|| resolver.reload());
        assert!(result.is_err());
        assert!(output.contains("ERROR"));
        assert!(output.contains("[TemplateResolver] Reload failed"));

        let (_, output) = logged(|| inline("tech:\n  caption: \"x\"\n"));
        assert!(!output.contains("ERROR"));
        assert!(output.contains("[TemplateResolver] Loaded 1 templates"));
    }

    #[test]
    fn test_builtin_templates_parse() {
        let set = TemplateSet::parse(BUILTIN_TEMPLATES).unwrap();
        assert!(set.defaults.contains_key(&TemplateType::Caption));

        let resolver = TemplateResolver::builtin();
        let skincare = resolver.resolve(Niche::Skincare, TemplateType::Routine, &CONTEXT);
        assert_eq!(skincare.fallback_level, FallbackLevel::Exact);
        let tech = resolver.resolve(Niche::Tech, TemplateType::SeoBlog, &CONTEXT);
        assert_eq!(tech.fallback_level, FallbackLevel::Default);
        let travel = resolver.resolve(Niche::Travel, TemplateType::InfluencerCaption, &CONTEXT);
        assert_eq!(travel.fallback_level, FallbackLevel::Generic);
    }
}
