//! The AI rule driver (spec §4.7): assembles the document once, batches
//! the norm library, dispatches batches concurrently with per-batch
//! retry, requeues round-1 failures once, and maps surviving issues.

use std::sync::Arc;

use terra_core::config::AiConfig;
use terra_core::model::IssueDraft;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::batching::partition_batches;
use crate::client::ModelClient;
use crate::document::{assemble_document, DocBlock};
use crate::error::AiError;
use crate::mapping::map_ai_issue;
use crate::norm::NormRule;
use crate::prompts::{AiIssue, ModelResponse, RULE_ENGINE_SYSTEM};

pub struct AiDriver {
    client: Arc<dyn ModelClient>,
    max_concurrency: usize,
    batch_size_min: usize,
    batch_size_max: usize,
    batch_size_default: usize,
    document_char_cap: usize,
}

impl AiDriver {
    pub fn new(client: Arc<dyn ModelClient>, config: &AiConfig) -> Self {
        Self {
            client,
            max_concurrency: config.max_concurrency.max(1),
            batch_size_min: config.batch_size_min,
            batch_size_max: config.batch_size_max,
            batch_size_default: config.batch_size_default,
            document_char_cap: config.document_char_cap,
        }
    }

    /// Runs the full two-round batch dispatch against `blocks` and
    /// `norm_library`, returning every issue draft that survived evidence
    /// validation. Never fails outright: batches that exhaust every
    /// retry and the round-2 requeue are logged and simply contribute no
    /// issues.
    pub async fn run(&self, blocks: &[DocBlock], norm_library: &[NormRule]) -> Vec<IssueDraft> {
        let document = assemble_document(blocks, self.document_char_cap);

        let round1 = partition_batches(norm_library, self.batch_size_min, self.batch_size_max, self.batch_size_default);
        let total = round1.len();
        if total == 0 {
            return Vec::new();
        }

        let (succeeded, mut failed_rules) = self.dispatch_round(&document, round1).await;
        info!(total_batches = total, succeeded = succeeded.len(), "AI review round 1 complete");

        let mut drafts: Vec<IssueDraft> = succeeded
            .into_iter()
            .flat_map(|(batch, response)| map_batch_issues(&response, &batch, blocks))
            .collect();

        if !failed_rules.is_empty() {
            failed_rules.sort_by(|a, b| a.id.cmp(&b.id));
            let round2 = partition_batches(&failed_rules, self.batch_size_min, self.batch_size_max, self.batch_size_default);
            let (succeeded2, still_failed) = self.dispatch_round(&document, round2).await;
            for rule in &still_failed {
                warn!(rule_id = %rule.id, "AI batch failed in both rounds, rule dropped from this run");
            }
            drafts.extend(succeeded2.into_iter().flat_map(|(batch, response)| map_batch_issues(&response, &batch, blocks)));
        }

        drafts
    }

    /// Runs every batch in `batches` under the concurrency semaphore,
    /// returning the `(batch, response)` pairs that succeeded and the
    /// flattened list of rules from batches that exhausted all 3 retries.
    async fn dispatch_round(&self, document: &str, batches: Vec<Vec<NormRule>>) -> (Vec<(Vec<NormRule>, ModelResponse)>, Vec<NormRule>) {
        let total = batches.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(total);

        for batch in batches {
            let semaphore = Arc::clone(&semaphore);
            let client = Arc::clone(&self.client);
            let document = document.to_string();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let user = build_user_message(&document, &batch);
                let result = call_batch_with_retry(client.as_ref(), &user).await;
                (batch, result)
            }));
        }

        let mut succeeded = Vec::new();
        let mut failed_rules = Vec::new();
        let mut completed = 0usize;
        for handle in handles {
            let (batch, result) = handle.await.expect("AI batch task panicked");
            completed += 1;
            info!(completed_batches = completed, total_batches = total, progress = completed * 100 / total, "AI batch dispatched");
            match result {
                Ok(response) => succeeded.push((batch, response)),
                Err(err) => {
                    warn!(%err, rules = batch.len(), "AI batch failed after all retries");
                    failed_rules.extend(batch);
                }
            }
        }
        (succeeded, failed_rules)
    }
}

fn build_user_message(document: &str, batch: &[NormRule]) -> String {
    let rules: Vec<serde_json::Value> = batch
        .iter()
        .map(|r| serde_json::json!({"rule_id": r.id, "rule_name": r.name, "review_type": r.review_type}))
        .collect();
    serde_json::json!({"document": document, "rules": rules}).to_string()
}

/// Calls the model up to 3 times. The response-format hint is dropped on
/// the retry immediately following a JSON-parse failure (spec §7's "one
/// free retry without response-format hint") and restored for any
/// attempt after that.
async fn call_batch_with_retry(client: &dyn ModelClient, user: &str) -> Result<ModelResponse, AiError> {
    let mut json_mode = true;
    let mut last_err = AiError::Request("no attempts made".to_string());

    for attempt in 1..=3 {
        match client.complete(RULE_ENGINE_SYSTEM, user, json_mode).await {
            Ok(raw) => match serde_json::from_str::<ModelResponse>(&raw) {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_err = AiError::Parse(e.to_string());
                    json_mode = attempt != 1;
                }
            },
            Err(e) => {
                last_err = e;
                json_mode = true;
            }
        }
    }
    Err(last_err)
}

fn review_type_for(issue: &AiIssue, batch: &[NormRule]) -> terra_core::model::ReviewType {
    let rule_id = issue.rule_definition.get("rule_id").and_then(|v| v.as_str());
    rule_id
        .and_then(|id| batch.iter().find(|r| r.id == id))
        .or_else(|| batch.first())
        .map(|r| r.review_type)
        .unwrap_or(terra_core::model::ReviewType::Tech)
}

fn map_batch_issues(response: &ModelResponse, batch: &[NormRule], blocks: &[DocBlock]) -> Vec<IssueDraft> {
    response
        .issues
        .iter()
        .filter_map(|issue| map_ai_issue(issue, review_type_for(issue, batch), blocks))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::ScriptedClient;
    use terra_core::ids::BlockId;
    use terra_core::model::ReviewType;

    fn cfg() -> AiConfig {
        AiConfig {
            max_concurrency: 2,
            batch_size_min: 2,
            batch_size_max: 3,
            batch_size_default: 2,
            document_char_cap: 10_000,
            ..Default::default()
        }
    }

    fn blocks() -> Vec<DocBlock> {
        vec![DocBlock { block_id: BlockId(42), page_no: Some(7), text: "项目 总占地面积：1.5 hm² 位于…".to_string() }]
    }

    fn success_response() -> String {
        serde_json::json!({
            "规则校验结果": [{
                "issue_id": "1",
                "issue_title": "占地面积描述不一致",
                "issue_type": "一致性问题",
                "severity": "高",
                "location": {"section": null, "page": null, "anchor_text": null},
                "evidence": {"snippets": ["占地面积 1.5 hm²"], "page_refs": []},
                "rule_definition": {"rule_id": "N002"},
                "norm_basis": null,
                "fix_suggestion": {"suggested_text": "核对两处面积描述", "fix_steps": []},
                "dependencies": null
            }],
            "规则库沉淀清单": []
        })
        .to_string()
    }

    #[tokio::test]
    async fn successful_batch_produces_mapped_issue() {
        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::new(vec![Ok(success_response())]));
        let driver = AiDriver::new(client, &cfg());
        let norm_library = vec![NormRule::new("N002", "面积一致性", ReviewType::Tech)];

        let drafts = driver.run(&blocks(), &norm_library).await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].issue_type, "CONSISTENCY");
        assert_eq!(drafts[0].page_no, Some(7));
    }

    #[tokio::test]
    async fn parse_failure_retries_without_hint_then_succeeds() {
        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::new(vec![
            Err(AiError::Parse("not json".to_string())),
            Ok(success_response()),
        ]));
        let driver = AiDriver::new(Arc::clone(&client), &cfg());
        let norm_library = vec![NormRule::new("N002", "面积一致性", ReviewType::Tech)];

        let drafts = driver.run(&blocks(), &norm_library).await;
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn batch_failing_all_three_attempts_is_requeued_once() {
        let client: Arc<dyn ModelClient> =
            Arc::new(ScriptedClient::new(vec![Err(AiError::Request("boom".to_string()))]));
        let driver = AiDriver::new(client, &cfg());
        let norm_library = vec![NormRule::new("N002", "面积一致性", ReviewType::Tech)];

        // both round 1 and round 2 exhaust the same scripted failure; the
        // run completes with no drafts rather than hanging or panicking.
        let drafts = driver.run(&blocks(), &norm_library).await;
        assert!(drafts.is_empty());
    }

    #[tokio::test]
    async fn empty_norm_library_yields_no_batches_and_no_calls() {
        let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::new(vec![Ok(success_response())]));
        let driver = AiDriver::new(client, &cfg());
        let drafts = driver.run(&blocks(), &[]).await;
        assert!(drafts.is_empty());
    }
}
