use index::NutrientFacts;
use matcher::extract_keyword;
use regressor::{estimate_nutrients, NutrientEstimate};
use semantic::{with_timeout, EmbeddingVector};
use serde::Serialize;

use crate::config::FallbackQuery;
use crate::context::PipelineContext;
use crate::error::PipelineError;

/// Result of scanning one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The gate accepted the image and the regressor estimated it.
    Regression {
        #[serde(flatten)]
        estimate: NutrientEstimate,
        similarity: f32,
    },
    /// The gate rejected the image; values come from the nearest reference.
    Lookup {
        food: String,
        reference_id: String,
        score: f32,
        #[serde(flatten)]
        facts: NutrientFacts,
        similarity: f32,
    },
    /// The pre-check said the photo does not show food.
    NotFood,
}

impl ScanOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Regression { .. } => "regression",
            ScanOutcome::Lookup { .. } => "lookup",
            ScanOutcome::NotFood => "not_food",
        }
    }
}

/// Estimates nutrition for an encoded photo.
///
/// Optional food pre-check, then image embedding and the domain gate. In-domain
/// images go to the regressor; the rest fall back to the reference index.
pub async fn estimate_from_image(ctx: &PipelineContext, image: &[u8]) -> Result<ScanOutcome, PipelineError> {
    if image.is_empty() {
        return Err(PipelineError::InvalidImage("empty upload".to_string()));
    }
    let config = ctx.config();

    if config.food_check.enabled && !is_food(ctx, image).await? {
        tracing::debug!("food check rejected image");
        return Ok(ScanOutcome::NotFood);
    }

    let vector = with_timeout(
        "embed_image",
        config.timeouts.embed(),
        ctx.image_embedder().embed_image(image),
    )
    .await?;

    let decision = ctx.gate().evaluate(&vector)?;
    if decision.in_domain {
        let estimate = estimate_nutrients(ctx.regressor(), vector.as_slice())?;
        return Ok(ScanOutcome::Regression {
            estimate,
            similarity: decision.max_similarity,
        });
    }

    let query = match config.fallback.query {
        FallbackQuery::ImageEmbedding => vector,
        FallbackQuery::Describe => describe_query(ctx, image).await?,
    };
    let hit = ctx.fallback().lookup(&query).await?;

    Ok(ScanOutcome::Lookup {
        food: hit.reference.food_name.clone(),
        reference_id: hit.reference.id.clone(),
        score: hit.score,
        facts: hit.reference.facts,
        similarity: decision.max_similarity,
    })
}

async fn is_food(ctx: &PipelineContext, image: &[u8]) -> Result<bool, PipelineError> {
    let config = ctx.config();
    let reply = with_timeout(
        "food_check",
        config.timeouts.classify(),
        ctx.classifier().classify(&config.food_check.prompt, Some(image)),
    )
    .await?;

    match food_label(&reply).as_str() {
        "FOOD" => Ok(true),
        "NOT_FOOD" => Ok(false),
        _ => Err(PipelineError::DependencyError(format!(
            "unexpected food check reply: {reply:?}"
        ))),
    }
}

/// `"**not food**."` reads as `NOT_FOOD`.
fn food_label(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c: char| matches!(c, '*' | '"' | '\'' | '`' | '.') || c.is_whitespace())
        .to_ascii_uppercase()
        .replace([' ', '-'], "_")
}

/// Asks the vision model for a keyword and embeds it in text space.
async fn describe_query(ctx: &PipelineContext, image: &[u8]) -> Result<EmbeddingVector, PipelineError> {
    let config = ctx.config();
    let reply = with_timeout(
        "describe",
        config.timeouts.describe(),
        ctx.classifier().describe(&config.fallback.describe_prompt, image),
    )
    .await?;

    let Some(keyword) = extract_keyword(&reply) else {
        tracing::warn!(reply = %reply, "description carried no keyword");
        return Err(PipelineError::NoMatchFound);
    };
    tracing::debug!(%keyword, "fallback keyword");

    Ok(with_timeout(
        "embed_text",
        config.timeouts.embed(),
        ctx.text_embedder().embed_text(&keyword),
    )
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_labels_tolerate_formatting() {
        assert_eq!(food_label("FOOD"), "FOOD");
        assert_eq!(food_label("**FOOD**"), "FOOD");
        assert_eq!(food_label(" not food. "), "NOT_FOOD");
        assert_eq!(food_label("NOT-FOOD"), "NOT_FOOD");
        assert_eq!(food_label("maybe"), "MAYBE");
    }

    #[test]
    fn outcomes_serialize_with_source_tag() {
        let outcome = ScanOutcome::Regression {
            estimate: NutrientEstimate::from_outputs([200.0, 300.0, 10.0, 40.0, 12.0]).unwrap(),
            similarity: 0.8,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["source"], "regression");
        assert_eq!(json["calories"], 300.0);
        assert_eq!(json["mass"], 200.0);
        assert_eq!(outcome.label(), "regression");
        assert_eq!(ScanOutcome::NotFood.label(), "not_food");
    }
}
