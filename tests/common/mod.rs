//! Shared mock capabilities for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use nebula_bot::{AiProvider, AudioNormalizer, ChatProvider, Error, Result, Transcription};

/// Chat capability that records traffic and serves fake downloads
#[derive(Default)]
pub struct MockChat {
    /// (chat_id, text) per send
    pub sent: Mutex<Vec<(i64, String)>>,
    /// (chat_id, message_id, text) per edit
    pub edited: Mutex<Vec<(i64, i64, String)>>,
    pub next_id: AtomicI64,
    pub fail_send: bool,
    pub fail_file_url: bool,
    pub fail_download: bool,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_download() -> Self {
        Self {
            fail_download: true,
            ..Self::default()
        }
    }

    pub fn failing_file_url() -> Self {
        Self {
            fail_file_url: true,
            ..Self::default()
        }
    }

    /// Every message text the user would have seen, sends then edits
    pub fn all_texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect();
        texts.extend(
            self.edited
                .lock()
                .unwrap()
                .iter()
                .map(|(_, _, text)| text.clone()),
        );
        texts
    }

    /// Text of the last edit applied to the status message
    pub fn last_edit_text(&self) -> Option<String> {
        self.edited
            .lock()
            .unwrap()
            .last()
            .map(|(_, _, text)| text.clone())
    }

    /// Number of user-facing error messages across sends and edits
    pub fn error_message_count(&self) -> usize {
        self.all_texts()
            .iter()
            .filter(|text| text.contains('❌'))
            .count()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        if self.fail_send {
            return Err(Error::Permanent("mock send failure".into()));
        }
        let id = 100 + self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<i64> {
        self.edited
            .lock()
            .unwrap()
            .push((chat_id, message_id, text.to_string()));
        Ok(message_id)
    }

    async fn get_file_url(&self, file_id: &str) -> Result<String> {
        if self.fail_file_url {
            return Err(Error::Transient("mock getFile outage".into()));
        }
        Ok(format!("https://files.example/{file_id}"))
    }

    async fn download(&self, _url: &str, dest: &Path) -> Result<()> {
        if self.fail_download {
            return Err(Error::Transient("mock download outage".into()));
        }
        tokio::fs::write(dest, b"OggS fake voice bytes").await?;
        Ok(())
    }
}

/// AI capability returning canned results
#[derive(Default)]
pub struct MockAi {
    pub transcription: Option<Transcription>,
    pub summary: Option<String>,
    pub response: Option<String>,
    /// Context slices the respond operation was handed
    pub seen_context: Mutex<Vec<Vec<String>>>,
}

impl MockAi {
    pub fn transcribing(text: &str, language: &str) -> Self {
        Self {
            transcription: Some(Transcription {
                text: text.to_string(),
                language: language.to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn full(text: &str, language: &str, summary: &str, response: &str) -> Self {
        Self {
            transcription: Some(Transcription {
                text: text.to_string(),
                language: language.to_string(),
            }),
            summary: Some(summary.to_string()),
            response: Some(response.to_string()),
            seen_context: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AiProvider for MockAi {
    async fn transcribe(&self, _path: &Path) -> Option<Transcription> {
        self.transcription.clone()
    }

    async fn summarize(&self, _transcript: &str, _language: &str) -> Option<String> {
        self.summary.clone()
    }

    async fn respond(&self, _summary: &str, context: &[String]) -> Option<String> {
        self.seen_context.lock().unwrap().push(context.to_vec());
        self.response.clone()
    }
}

/// Normalizer that copies the source file instead of invoking ffmpeg
#[derive(Default)]
pub struct MockNormalizer {
    pub fail: bool,
}

impl MockNormalizer {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl AudioNormalizer for MockNormalizer {
    async fn convert(&self, src: &Path, dst: &Path) -> Result<()> {
        if self.fail {
            return Err(Error::Audio("mock conversion failure".into()));
        }
        tokio::fs::copy(src, dst).await?;
        Ok(())
    }
}

/// Count regular files under `dir`, recursively
pub fn file_count(dir: &Path) -> usize {
    let mut count = 0;
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            count += file_count(&path);
        } else {
            count += 1;
        }
    }
    count
}

/// A transcript with exactly `n` whitespace-delimited words
pub fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}
