// inkwell-cli/src/batch.rs

//! Sends a drafted rejection letter to every applicant in a CSV file.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use inkwell_core::mail::EmailDraft;
use inkwell_core::{Composer, Mailbox};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Applicant {
    pub first_name: String,
    pub email: String,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Sent { row: usize, email: String, detail: String },
    Drafted { row: usize, email: String, body: String },
    Failed { row: usize, email: Option<String>, error: String },
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Sent { .. }))
    }

    pub fn drafted(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Drafted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} row(s): {} sent, {} drafted, {} failed.",
            self.outcomes.len(),
            self.sent(),
            self.drafted(),
            self.failed()
        )
    }
}

pub struct BatchSender<'a> {
    composer: &'a Composer,
    /// `None` drafts every letter without sending (dry run).
    mailbox: Option<&'a Mailbox>,
    subject: String,
}

impl<'a> BatchSender<'a> {
    pub fn new(composer: &'a Composer, mailbox: Option<&'a Mailbox>, subject: &str) -> Self {
        Self {
            composer,
            mailbox,
            subject: subject.to_string(),
        }
    }

    pub async fn run_file(&self, path: &Path, progress: &ProgressBar) -> Result<BatchReport> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open applicant file: {}", path.display()))?;
        self.run(file, progress).await
    }

    /// Processes every row; a bad row is recorded and the batch moves on.
    pub async fn run<R: Read>(&self, reader: R, progress: &ProgressBar) -> Result<BatchReport> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let rows: Vec<csv::Result<Applicant>> = csv_reader.deserialize().collect();
        info!(rows = rows.len(), dry_run = self.mailbox.is_none(), "Starting rejection batch");
        progress.set_length(rows.len() as u64);

        let mut report = BatchReport::default();
        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            let outcome = match row {
                Ok(applicant) => {
                    progress.set_message(applicant.email.clone());
                    self.process(row_number, applicant).await
                }
                Err(e) => RowOutcome::Failed {
                    row: row_number,
                    email: None,
                    error: format!("Invalid row: {}", e),
                },
            };
            if let RowOutcome::Failed { row, error, .. } = &outcome {
                warn!(row, error = %error, "Batch row failed");
            }
            report.outcomes.push(outcome);
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!(summary = %report.summary(), "Rejection batch finished");
        Ok(report)
    }

    async fn process(&self, row: usize, applicant: Applicant) -> RowOutcome {
        let fail = |error: String| RowOutcome::Failed {
            row,
            email: Some(applicant.email.clone()),
            error,
        };
        if applicant.first_name.is_empty() || applicant.email.is_empty() {
            return fail("Row is missing first_name or email.".to_string());
        }

        let body = match self
            .composer
            .generate_rejection(&applicant.first_name, &applicant.feedback)
            .await
        {
            Ok(body) => body,
            Err(e) => return fail(e.to_string()),
        };

        let Some(mailbox) = self.mailbox else {
            return RowOutcome::Drafted {
                row,
                email: applicant.email.clone(),
                body,
            };
        };

        let draft = EmailDraft {
            to: applicant.email.clone(),
            subject: self.subject.clone(),
            body,
            ..Default::default()
        };
        match mailbox.send(&draft).await {
            Ok(detail) => RowOutcome::Sent {
                row,
                email: applicant.email.clone(),
                detail,
            },
            Err(e) => fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use inkwell_core::config::{ComposerConfig, MailConfig};
    use inkwell_core::{GmailClient, ModelConfig, OpenAIProvider};
    use serde_json::json;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn composer(server: &MockServer) -> Composer {
        let provider = OpenAIProvider::new(
            ModelConfig {
                model_name: "gpt-4o-mini".to_string(),
                parameters: None,
                endpoint: Some(server.url("/v1/chat/completions")),
            },
            reqwest::Client::new(),
            "sk-test".to_string(),
        );
        Composer::new(Arc::new(provider), ComposerConfig::default())
    }

    fn mailbox(server: &MockServer) -> Mailbox {
        let mail_config = MailConfig {
            endpoint: Some(server.url("/gmail/v1")),
            ..MailConfig::default()
        };
        let gmail = GmailClient::new(reqwest::Client::new(), &mail_config, "ya29.token".to_string());
        Mailbox::new(Arc::new(gmail), "team@example.com")
    }

    async fn mock_model(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "id": "chatcmpl-1",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "<p>Dear applicant, thank you.</p>"},
                        "finish_reason": "stop"
                    }]
                }));
            })
            .await
    }

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_batch_sends_each_row_and_counts_failures() {
        let server = MockServer::start_async().await;
        let model = mock_model(&server).await;
        let send = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/gmail/v1/users/me/messages/send")
                    .header("Authorization", "Bearer ya29.token");
                then.status(200).json_body(json!({"id": "sent-1", "threadId": "t-1"}));
            })
            .await;
        let (composer, mailbox) = (composer(&server), mailbox(&server));

        let file = csv_file(
            "first_name,email,feedback\n\
             Ada, ada@example.com ,Strong portfolio but limited availability\n\
             Bob,not-an-address,Needs more experience\n\
             ,missing@example.com,No name\n",
        );
        let sender = BatchSender::new(&composer, Some(&mailbox), "Your application");
        let report = sender
            .run_file(file.path(), &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.sent(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(
            report.outcomes[0],
            RowOutcome::Sent {
                row: 1,
                email: "ada@example.com".to_string(),
                detail: "Email sent successfully. Message ID: sent-1".to_string(),
            }
        );
        match &report.outcomes[1] {
            RowOutcome::Failed { row, email, error } => {
                assert_eq!(*row, 2);
                assert_eq!(email.as_deref(), Some("not-an-address"));
                assert!(error.contains("not-an-address"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // The nameless row never reaches the model.
        model.assert_hits_async(2).await;
        send.assert_hits_async(1).await;
        assert_eq!(
            report.summary(),
            "Processed 3 row(s): 1 sent, 0 drafted, 2 failed."
        );
    }

    #[tokio::test]
    async fn test_dry_run_drafts_without_sending() {
        let server = MockServer::start_async().await;
        let model = mock_model(&server).await;
        let gmail = server
            .mock_async(|when, then| {
                when.path_contains("/gmail/v1");
                then.status(500);
            })
            .await;
        let composer = composer(&server);

        let sender = BatchSender::new(&composer, None, "Your application");
        let progress = ProgressBar::hidden();
        let report = sender
            .run(
                "first_name,email,feedback\nAda,ada@example.com,Great interview\n".as_bytes(),
                &progress,
            )
            .await
            .unwrap();
        assert_eq!(progress.length(), Some(1));
        assert_eq!(progress.position(), 1);

        assert_eq!(
            report.outcomes,
            vec![RowOutcome::Drafted {
                row: 1,
                email: "ada@example.com".to_string(),
                body: "<p>Dear applicant, thank you.</p>".to_string(),
            }]
        );
        model.assert_hits_async(1).await;
        gmail.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_model_failure_is_counted_per_row() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(503).body("overloaded");
            })
            .await;
        let (composer, mailbox) = (composer(&server), mailbox(&server));

        let sender = BatchSender::new(&composer, Some(&mailbox), "Your application");
        let report = sender
            .run(
                "first_name,email,feedback\nAda,ada@example.com,x\nBob,bob@example.com,y\n".as_bytes(),
                &ProgressBar::hidden(),
            )
            .await
            .unwrap();

        assert_eq!(report.failed(), 2);
        match &report.outcomes[1] {
            RowOutcome::Failed { error, .. } => {
                assert!(error.starts_with("Failed to generate email content:"));
                assert!(error.contains("503"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let server = MockServer::start_async().await;
        let composer = composer(&server);
        let sender = BatchSender::new(&composer, None, "Your application");
        let err = sender
            .run_file(Path::new("/definitely/not/here.csv"), &ProgressBar::hidden())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open applicant file"));
    }
}
