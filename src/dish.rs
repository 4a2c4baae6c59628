use recipe::synthesize;
use serde::Serialize;

use crate::allergy::check_allergy;
use crate::context::PipelineContext;
use crate::error::PipelineError;

/// Warning text when nothing needs flagging.
pub const NO_WARNING: &str = "none";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedDish {
    pub id: String,
    pub score: f32,
}

/// Response of the dish calorie entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishEstimate {
    /// `[low, high]` kcal, `None` when no dish matched or nothing resolved.
    pub calories_range: Option<(f64, f64)>,
    pub warning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish: Option<MatchedDish>,
}

/// Matches `description` to a catalog dish and bounds its calories.
///
/// When no dish matches, `calories_range` is `None` and no allergy check runs.
pub async fn estimate_dish_calories(
    ctx: &PipelineContext,
    description: &str,
    allergy: Option<&str>,
) -> Result<DishEstimate, PipelineError> {
    let Some(hit) = ctx.dishes().match_dish(description).await? else {
        return Ok(DishEstimate {
            calories_range: None,
            warning: NO_WARNING.to_string(),
            dish: None,
        });
    };

    let dish = ctx
        .catalog()
        .dish(&hit.dish_id)
        .ok_or_else(|| PipelineError::Config(format!("matched dish {:?} is not in the catalog", hit.dish_id)))?;

    let interval = synthesize(dish, ctx.catalog(), &ctx.config().synthesis)?;
    let calories_range = interval.is_usable().then(|| interval.as_pair());
    if !interval.is_usable() {
        tracing::warn!(dish = %dish.id, skipped = interval.skipped, "no ingredient of the dish resolved");
    }

    let display = dish.display_name();
    let verdict = check_allergy(ctx, display, allergy).await;
    let warning = allergy
        .and_then(|a| verdict.warning(display, a.trim()))
        .unwrap_or_else(|| NO_WARNING.to_string());

    tracing::debug!(dish = %dish.id, score = hit.score, ?calories_range, %warning, "dish estimate");
    Ok(DishEstimate {
        calories_range,
        warning,
        dish: Some(MatchedDish {
            id: hit.dish_id,
            score: hit.score,
        }),
    })
}
