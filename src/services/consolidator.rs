//! 自洽性汇总：把 K 份解答交给模型选出最终答案

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, Instrument, Span};

use crate::clients::ModelBackend;
use crate::services::prompt_store::PromptStore;
use crate::services::sample_generator::SampleSet;

/// 把采样结果渲染为 `## roll_out_<i>\n<text>\n` 片段
pub fn build_roll_out_responses(samples: &[String]) -> String {
    samples
        .iter()
        .enumerate()
        .map(|(i, solution)| format!("## roll_out_{}\n{}\n", i, solution))
        .collect()
}

pub struct Consolidator {
    backend: Arc<dyn ModelBackend>,
    prompts: Arc<PromptStore>,
    span: Span,
}

impl Consolidator {
    pub fn new(backend: Arc<dyn ModelBackend>, prompts: Arc<PromptStore>, span: Span) -> Self {
        Self {
            backend,
            prompts,
            span,
        }
    }

    /// 调用一次模型，原样返回汇总结果
    pub async fn consolidate(&self, samples: &SampleSet, question: &str, lang: &str) -> Result<String> {
        let roll_out_responses = build_roll_out_responses(samples.as_slice());
        let prompt = self.prompts.render(
            "critic",
            "self_consistency",
            lang,
            &[
                ("roll_out_responses", &roll_out_responses),
                ("question", question),
            ],
        )?;

        async {
            debug!("[LLM INPUT] prompt (self_consistency):\n{}", prompt);
            let solution = self
                .backend
                .generate(&prompt)
                .await
                .context("自洽性汇总调用失败")?;
            debug!("[LLM OUTPUT] solution (self_consistency):\n{}", solution);
            Ok::<_, anyhow::Error>(solution)
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_out_transcript() {
        let transcript = build_roll_out_responses(&[
            "a".to_string(),
            "Error in roll_out_1: timeout".to_string(),
        ]);
        assert_eq!(
            transcript,
            "## roll_out_0\na\n## roll_out_1\nError in roll_out_1: timeout\n"
        );
    }
}
