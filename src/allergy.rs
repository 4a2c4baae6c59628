use serde::Serialize;

use semantic::with_timeout;

use crate::context::PipelineContext;

/// Verdict on whether a dish suits a stated allergy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum AllergyVerdict {
    Compatible,
    Incompatible,
    /// The classifier's answer could not be read, or the call failed.
    Undetermined(String),
}

impl AllergyVerdict {
    /// User-facing warning, `None` when the dish is fine.
    pub fn warning(&self, dish: &str, allergy: &str) -> Option<String> {
        match self {
            AllergyVerdict::Compatible => None,
            AllergyVerdict::Incompatible => Some(format!(
                "{dish} may not be suitable for your allergy ({allergy})"
            )),
            AllergyVerdict::Undetermined(reason) => Some(format!(
                "could not verify {dish} against your allergy ({allergy}): {reason}"
            )),
        }
    }
}

/// Asks the classifier whether `dish` is safe for `allergy`.
///
/// An absent or blank allergy is compatible without a call. Failures never
/// read as safe: they come back as [`AllergyVerdict::Undetermined`].
pub async fn check_allergy(ctx: &PipelineContext, dish: &str, allergy: Option<&str>) -> AllergyVerdict {
    let Some(allergy) = allergy.map(str::trim).filter(|a| !a.is_empty()) else {
        return AllergyVerdict::Compatible;
    };

    let config = ctx.config();
    let prompt = config.allergy.render(dish, allergy);
    let reply = match with_timeout(
        "allergy_check",
        config.timeouts.classify(),
        ctx.classifier().classify(&prompt, None),
    )
    .await
    {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(%dish, error = %err, "allergy check failed");
            return AllergyVerdict::Undetermined(err.to_string());
        }
    };

    let verdict = parse_verdict(&reply);
    if let AllergyVerdict::Undetermined(_) = verdict {
        tracing::warn!(%dish, reply = %reply, "unreadable allergy verdict");
    }
    verdict
}

/// Exact match on the normalized reply, internal whitespace collapsed;
/// anything else is undetermined.
pub fn parse_verdict(reply: &str) -> AllergyVerdict {
    let cfg = canonical::CanonicalizeConfig {
        collapse_whitespace: true,
        ..Default::default()
    };
    match canonical::normalize_text(reply, &cfg).as_str() {
        "compatible" | "phu hop" => AllergyVerdict::Compatible,
        "incompatible" | "khong phu hop" => AllergyVerdict::Incompatible,
        _ => AllergyVerdict::Undetermined(format!("unrecognized reply {:?}", reply.trim())),
    }
}
