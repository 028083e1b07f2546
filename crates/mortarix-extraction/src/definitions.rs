//! Definition extraction.
//!
//! "Given text and a material name, optionally return a definitional
//! clause" is a capability behind [`DefinitionStrategy`], with two
//! interchangeable implementations: a clause-level grammatical pass and a
//! template pass driven by the catalogue's pattern table. The extractor
//! runs its strategies in order and always produces a non-empty string.

use mortarix_common::MaterialSpec;
use regex::Regex;

use crate::pipeline::EngineError;

/// A single way of finding a definitional clause for a material.
pub trait DefinitionStrategy: Send + Sync {
    fn definitional_clause(
        &self,
        context: &str,
        material: &MaterialSpec,
    ) -> Result<Option<String>, EngineError>;
}

// ── Copular-clause strategy ──────────────────────────────────────────────────

/// Finds a clause where the material is the subject of a copular or
/// definitional verb (lemma in be/consist/include/mean/refer) and returns
/// the clause remainder after the verb, minus adverbs and punctuation.
pub struct CopularClauseStrategy;

fn copular_lemma(word: &str) -> Option<&'static str> {
    match word {
        "is" | "are" | "was" | "were" | "be" | "been" | "being" => Some("be"),
        "consist" | "consists" | "consisted" | "consisting" => Some("consist"),
        "include" | "includes" | "included" | "including" => Some("include"),
        "mean" | "means" | "meant" => Some("mean"),
        "refer" | "refers" | "referred" | "referring" => Some("refer"),
        _ => None,
    }
}

const DROPPED_ADVERBS: [&str; 11] = [
    "also", "only", "generally", "usually", "normally", "typically", "mainly", "primarily",
    "hence", "however", "therefore",
];

/// A token reduced to its comparable form: alphanumeric core, lowercased.
fn normalize(token: &str) -> String {
    token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// How far past the subject the verb may sit, to allow auxiliaries
/// ("shall be", "may also consist").
const VERB_WINDOW: usize = 3;

impl DefinitionStrategy for CopularClauseStrategy {
    fn definitional_clause(
        &self,
        context: &str,
        material: &MaterialSpec,
    ) -> Result<Option<String>, EngineError> {
        let subject: Vec<String> =
            material.name.split_whitespace().map(normalize).collect();
        if subject.is_empty() {
            return Ok(None);
        }

        for clause in context.split(['.', '?', '!']) {
            let tokens: Vec<&str> = clause.split_whitespace().collect();
            let normalized: Vec<String> = tokens.iter().map(|t| normalize(t)).collect();

            for start in 0..normalized.len() {
                let end = start + subject.len();
                if end > normalized.len() || normalized[start..end] != subject[..] {
                    continue;
                }

                let verb = (end..(end + VERB_WINDOW).min(normalized.len()))
                    .find(|&j| copular_lemma(&normalized[j]).is_some());
                let Some(verb_at) = verb else { continue };

                let definition: Vec<&str> = tokens[verb_at + 1..]
                    .iter()
                    .filter(|t| {
                        let n = normalize(t);
                        !n.is_empty() && !DROPPED_ADVERBS.contains(&n.as_str())
                    })
                    .copied()
                    .collect();

                if !definition.is_empty() {
                    return Ok(Some(definition.join(" ")));
                }
            }
        }
        Ok(None)
    }
}

// ── Template strategy ────────────────────────────────────────────────────────

/// Applies the material's definition pattern from the catalogue, or a
/// synthesised "<name>(?: is| shall be) <rest of clause>" template when the
/// catalogue carries none. A malformed catalogue pattern is a per-material
/// fault and surfaces as an error.
pub struct TemplateStrategy;

fn default_template(name: &str, plural: bool) -> String {
    let copula = if plural { "are" } else { "is" };
    format!(r"(?i)\b({}(?: {}| shall be)?\s+[^.\n]*)", regex::escape(name), copula)
}

impl DefinitionStrategy for TemplateStrategy {
    fn definitional_clause(
        &self,
        context: &str,
        material: &MaterialSpec,
    ) -> Result<Option<String>, EngineError> {
        let pattern = material
            .definition_pattern
            .clone()
            .unwrap_or_else(|| default_template(&material.name, material.plural));

        let matcher = Regex::new(&pattern)
            .map_err(|e| EngineError::Material(material.name.clone(), e.to_string()))?;

        let Some(captures) = matcher.captures(context) else {
            return Ok(None);
        };

        let group = captures
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().trim())
            .find(|s| !s.is_empty());
        Ok(group.map(str::to_string))
    }
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Ordered strategy chain with a literal last resort. Never yields an
/// empty string.
pub struct DefinitionExtractor {
    strategies: Vec<Box<dyn DefinitionStrategy>>,
}

impl DefinitionExtractor {
    /// Grammatical pass first, template pass second.
    pub fn standard() -> Self {
        Self {
            strategies: vec![Box::new(CopularClauseStrategy), Box::new(TemplateStrategy)],
        }
    }

    /// Template pass only — for callers that want purely lexical behaviour.
    pub fn lexical_only() -> Self {
        Self { strategies: vec![Box::new(TemplateStrategy)] }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DefinitionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, context: &str, material: &MaterialSpec) -> Result<String, EngineError> {
        for strategy in &self.strategies {
            if let Some(definition) = strategy.definitional_clause(context, material)? {
                return Ok(definition);
            }
        }
        Ok(format!(
            "No specific definition for {} could be determined from the context.",
            material.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> MaterialSpec {
        MaterialSpec::named(name)
    }

    #[test]
    fn copular_clause_after_is() {
        let out = CopularClauseStrategy
            .definitional_clause("Cement is a binder obtained from limestone.", &spec("Cement"))
            .unwrap();
        assert_eq!(out, Some("a binder obtained from limestone".to_string()));
    }

    #[test]
    fn copular_clause_allows_auxiliaries() {
        let out = CopularClauseStrategy
            .definitional_clause(
                "Cement shall be 43 Grade Ordinary Portland.",
                &spec("Cement"),
            )
            .unwrap();
        assert_eq!(out, Some("43 Grade Ordinary Portland".to_string()));
    }

    #[test]
    fn copular_clause_drops_adverbs() {
        let out = CopularClauseStrategy
            .definitional_clause("Water is generally potable and clean.", &spec("Water"))
            .unwrap();
        assert_eq!(out, Some("potable and clean".to_string()));
    }

    #[test]
    fn copular_clause_handles_multiword_subject() {
        let out = CopularClauseStrategy
            .definitional_clause("Fine Aggregate is used in concrete.", &spec("Fine Aggregate"))
            .unwrap();
        assert_eq!(out, Some("used in concrete".to_string()));
    }

    #[test]
    fn no_copula_no_clause() {
        let out = CopularClauseStrategy
            .definitional_clause("Cement content per cubic metre.", &spec("Cement"))
            .unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn template_default_singular() {
        let out = TemplateStrategy
            .definitional_clause("Mortar is a paste of cement and sand.", &spec("Mortar"))
            .unwrap();
        assert_eq!(out, Some("Mortar is a paste of cement and sand".to_string()));
    }

    #[test]
    fn template_default_plural() {
        let mut piers = spec("Piers");
        piers.plural = true;
        let out = TemplateStrategy
            .definitional_clause("Piers are constructed of concrete.", &piers)
            .unwrap();
        assert_eq!(out, Some("Piers are constructed of concrete".to_string()));
    }

    #[test]
    fn template_uses_catalogue_pattern() {
        let mut fine = spec("Fine Aggregate");
        fine.definition_pattern = Some(
            r"(?i)\b(fine aggregate(?: is| shall be)?\s+.*?(?:(?:passes through|retained on)\s+\d+\.\d+\s+mm\s+IS\s+sieve|conforming to IS \d+)[^.\n]*)".to_string(),
        );
        let out = TemplateStrategy
            .definitional_clause(
                "Fine aggregate conforming to IS 383 shall be used. Other text.",
                &fine,
            )
            .unwrap();
        assert_eq!(
            out,
            Some("Fine aggregate conforming to IS 383 shall be used".to_string())
        );
    }

    #[test]
    fn malformed_pattern_is_a_material_fault() {
        let mut broken = spec("Cement");
        broken.definition_pattern = Some("(unbalanced".to_string());
        let err = TemplateStrategy.definitional_clause("Cement is grey.", &broken);
        assert!(err.is_err());
    }

    #[test]
    fn extractor_falls_back_to_literal() {
        let extractor = DefinitionExtractor::standard();
        let out = extractor.extract("Unrelated sentence entirely.", &spec("Jali")).unwrap();
        assert_eq!(
            out,
            "No specific definition for Jali could be determined from the context."
        );
    }

    #[test]
    fn extractor_prefers_grammatical_pass() {
        let extractor = DefinitionExtractor::standard();
        let out = extractor
            .extract("Concrete is a mixture of cement, aggregate and water.", &spec("Concrete"))
            .unwrap();
        assert_eq!(out, "a mixture of cement, aggregate and water");
    }
}
