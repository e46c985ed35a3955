//! Grounded answering over retrieved chunks.

use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Provider;
use fitcoach_core::types::{GenerateParams, Message};
use fitcoach_knowledge::SearchHit;

/// Format retrieved chunks as a numbered context block carrying each
/// chunk's source and page so the model can cite them.
fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| {
            format!(
                "[{}] meta={{'source': {}, 'page': {}}}\n{}",
                i + 1,
                h.metadata.source,
                h.metadata.page.map_or("None".to_string(), |p| p.to_string()),
                h.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One model call over the retrieved context. The model is instructed to
/// answer only from the context, to admit when it is insufficient, and to
/// cite as `[source p.page]`. Provider failures propagate.
pub async fn answer_grounded(
    provider: &dyn Provider,
    question: &str,
    retrieved: &[SearchHit],
    params: &GenerateParams,
) -> Result<String> {
    for (i, h) in retrieved.iter().enumerate() {
        tracing::debug!(
            rank = i + 1,
            source = %h.metadata.source,
            page = ?h.metadata.page,
            chars = h.text.len(),
            "retrieved chunk"
        );
    }

    let prompt = format!(
        "You are an evidence-grounded assistant.\n\
         Answer concisely and accurately using only the context below.\n\
         If the context is insufficient, say 'The available material does not answer this question.'\n\
         Where possible, include short citations in the form [source p.page].\n\n\
         # Context\n{}\n\n# Question\n{}",
        format_context(retrieved),
        question
    );

    let response = provider.chat(&[Message::user(prompt)], &[], params).await?;
    response
        .content
        .ok_or_else(|| FitCoachError::Provider("Empty answer from model".into()))
}
