//! Bounded in-memory buffer of recent audio messages per conversation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Identity of a buffered media entry, unique within the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    /// Chat the message arrived in
    pub chat_id: i64,
    /// Message id within that chat
    pub message_id: i64,
}

/// One audio/voice message under processing
#[derive(Debug, Clone)]
pub struct MediaEntry {
    /// Chat the message arrived in
    pub chat_id: i64,
    /// Message id within that chat
    pub message_id: i64,
    /// Sender of the message
    pub user_id: i64,
    /// Local path of the normalized audio file
    pub filepath: PathBuf,
    /// Creation time of this entry
    pub timestamp: Instant,
    /// Transcribed text, filled in after the transcribe stage
    pub transcription: Option<String>,
    /// Reported media duration in seconds
    pub duration: Option<u32>,
    /// Insertion order, breaks timestamp ties on coarse clocks
    pub(crate) seq: u64,
}

#[derive(Debug, Default)]
struct BufferState {
    entries: HashMap<EntryKey, MediaEntry>,
    next_seq: u64,
}

/// Fixed-capacity store of recent [`MediaEntry`] values.
///
/// One instance per process, shared by `Arc`. All operations take a single
/// internal lock, so mutations are mutually exclusive and readers never
/// observe a half-updated entry. Nothing is held across an await point.
///
/// Two independent eviction triggers: inserting at capacity evicts exactly
/// the globally oldest entry, and [`AudioBuffer::cleanup_expired`] sweeps
/// entries past a caller-supplied age.
#[derive(Debug)]
pub struct AudioBuffer {
    max_size: usize,
    state: Mutex<BufferState>,
}

impl AudioBuffer {
    /// Create a buffer holding at most `max_size` entries
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            state: Mutex::new(BufferState::default()),
        }
    }

    /// Add a new entry stamped with the current time, returning its key.
    ///
    /// At capacity the oldest entry is evicted first, so the buffer never
    /// grows beyond `max_size`. Re-adding an existing key replaces the entry.
    pub fn add_entry(
        &self,
        chat_id: i64,
        message_id: i64,
        user_id: i64,
        filepath: PathBuf,
        duration: Option<u32>,
    ) -> EntryKey {
        let key = EntryKey {
            chat_id,
            message_id,
        };

        let mut state = self.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_size {
            if let Some(oldest) = state
                .entries
                .values()
                .min_by_key(|entry| entry.seq)
                .map(|entry| EntryKey {
                    chat_id: entry.chat_id,
                    message_id: entry.message_id,
                })
            {
                state.entries.remove(&oldest);
                tracing::debug!(
                    chat_id = oldest.chat_id,
                    message_id = oldest.message_id,
                    "evicted oldest buffer entry"
                );
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            MediaEntry {
                chat_id,
                message_id,
                user_id,
                filepath,
                timestamp: Instant::now(),
                transcription: None,
                duration,
                seq,
            },
        );

        key
    }

    /// Retrieve a copy of an entry by its key.
    ///
    /// Evicted keys resolve to `None`; the buffer never hands out stale
    /// entries.
    #[must_use]
    pub fn get_entry(&self, key: EntryKey) -> Option<MediaEntry> {
        self.lock().entries.get(&key).cloned()
    }

    /// Update the transcription of an entry in place.
    ///
    /// Returns `false` if the key is absent.
    pub fn update_transcription(&self, key: EntryKey, transcription: String) -> bool {
        match self.lock().entries.get_mut(&key) {
            Some(entry) => {
                entry.transcription = Some(transcription);
                true
            }
            None => false,
        }
    }

    /// Recent entries for a chat, most-recent-first, truncated to `limit`.
    ///
    /// Entries without a transcription are included; filtering on
    /// transcription presence is the caller's job.
    #[must_use]
    pub fn get_chat_history(&self, chat_id: i64, limit: usize) -> Vec<MediaEntry> {
        let state = self.lock();
        let mut entries: Vec<MediaEntry> = state
            .entries
            .values()
            .filter(|entry| entry.chat_id == chat_id)
            .cloned()
            .collect();
        drop(state);

        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        entries.truncate(limit);
        entries
    }

    /// Remove every entry older than `max_age`, returning the count removed
    pub fn cleanup_expired(&self, max_age: Duration) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| entry.timestamp.elapsed() <= max_age);
        before - state.entries.len()
    }

    /// Number of entries currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the buffer holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(buffer: &AudioBuffer, chat_id: i64, message_id: i64) -> EntryKey {
        buffer.add_entry(
            chat_id,
            message_id,
            7,
            PathBuf::from(format!("/tmp/voice_{message_id}.m4a")),
            Some(30),
        )
    }

    #[test]
    fn add_and_get_round_trip() {
        let buffer = AudioBuffer::new(10);
        let key = add(&buffer, 1, 100);

        let entry = buffer.get_entry(key).expect("entry present");
        assert_eq!(entry.chat_id, 1);
        assert_eq!(entry.message_id, 100);
        assert_eq!(entry.user_id, 7);
        assert_eq!(entry.duration, Some(30));
        assert!(entry.transcription.is_none());
    }

    #[test]
    fn missing_key_resolves_to_none() {
        let buffer = AudioBuffer::new(10);
        let absent = EntryKey {
            chat_id: 1,
            message_id: 999,
        };
        assert!(buffer.get_entry(absent).is_none());
    }

    #[test]
    fn capacity_evicts_exactly_the_oldest() {
        let buffer = AudioBuffer::new(3);
        let first = add(&buffer, 1, 1);
        add(&buffer, 1, 2);
        add(&buffer, 1, 3);
        assert_eq!(buffer.len(), 3);

        add(&buffer, 1, 4);
        assert_eq!(buffer.len(), 3);
        assert!(buffer.get_entry(first).is_none(), "oldest entry evicted");
        assert!(
            buffer
                .get_entry(EntryKey {
                    chat_id: 1,
                    message_id: 2
                })
                .is_some()
        );
    }

    #[test]
    fn size_stays_at_capacity_across_many_adds() {
        let buffer = AudioBuffer::new(5);
        for message_id in 0..50 {
            add(&buffer, 1, message_id);
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);

        // The five most recent survive
        for message_id in 45..50 {
            assert!(
                buffer
                    .get_entry(EntryKey {
                        chat_id: 1,
                        message_id
                    })
                    .is_some()
            );
        }
    }

    #[test]
    fn update_transcription_mutates_in_place() {
        let buffer = AudioBuffer::new(10);
        let key = add(&buffer, 1, 1);

        assert!(buffer.update_transcription(key, "hello there".into()));
        let entry = buffer.get_entry(key).unwrap();
        assert_eq!(entry.transcription.as_deref(), Some("hello there"));
    }

    #[test]
    fn update_transcription_reports_absent_key() {
        let buffer = AudioBuffer::new(10);
        let absent = EntryKey {
            chat_id: 5,
            message_id: 5,
        };
        assert!(!buffer.update_transcription(absent, "text".into()));
    }

    #[test]
    fn history_is_scoped_ordered_and_limited() {
        let buffer = AudioBuffer::new(20);
        for message_id in 1..=5 {
            add(&buffer, 1, message_id);
        }
        add(&buffer, 2, 99);

        let history = buffer.get_chat_history(1, 3);
        assert_eq!(history.len(), 3);
        let ids: Vec<i64> = history.iter().map(|e| e.message_id).collect();
        assert_eq!(ids, vec![5, 4, 3], "most-recent-first");
        assert!(history.iter().all(|e| e.chat_id == 1));

        for pair in history.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn history_includes_entries_without_transcription() {
        let buffer = AudioBuffer::new(10);
        let key = add(&buffer, 1, 1);
        add(&buffer, 1, 2);
        buffer.update_transcription(key, "done".into());

        let history = buffer.get_chat_history(1, 10);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn cleanup_expired_removes_only_old_entries() {
        let buffer = AudioBuffer::new(10);
        add(&buffer, 1, 1);
        add(&buffer, 1, 2);
        std::thread::sleep(Duration::from_millis(20));
        add(&buffer, 1, 3);

        let removed = buffer.cleanup_expired(Duration::from_millis(10));
        assert_eq!(removed, 2);
        assert_eq!(buffer.len(), 1);
        assert!(
            buffer
                .get_entry(EntryKey {
                    chat_id: 1,
                    message_id: 3
                })
                .is_some()
        );
    }

    #[test]
    fn cleanup_expired_with_long_ttl_removes_nothing() {
        let buffer = AudioBuffer::new(10);
        add(&buffer, 1, 1);
        add(&buffer, 1, 2);

        assert_eq!(buffer.cleanup_expired(Duration::from_secs(3600)), 0);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn evicted_entries_never_resolve() {
        let buffer = AudioBuffer::new(1);
        let first = add(&buffer, 1, 1);
        add(&buffer, 1, 2);

        assert!(buffer.get_entry(first).is_none());
        assert!(!buffer.update_transcription(first, "late".into()));
    }
}
