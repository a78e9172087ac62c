use crate::mutations::{is_print, is_space};
use crate::report::escape_word;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building words or loading dictionary files.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Words must carry at least one byte.
    #[error("Dictionary word must not be empty")]
    EmptyWord,

    /// The word is longer than [`Word::MAX_SIZE`].
    #[error("Dictionary word of {0} bytes exceeds the {max} byte limit", max = Word::MAX_SIZE)]
    WordTooLong(usize),

    /// A stored dictionary holds more entries than its capacity allows.
    #[error("Dictionary holds {len} entries but its capacity is {capacity}")]
    OverCapacity { len: usize, capacity: usize },

    /// A line of a dictionary file could not be parsed.
    #[error("Malformed dictionary entry on line {line}: {content}")]
    MalformedEntry { line: usize, content: String },

    /// Reading a dictionary file failed.
    #[error("Dictionary I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DictionaryError {
    fn from(err: std::io::Error) -> Self {
        DictionaryError::Io(err.to_string())
    }
}

/// An immutable byte string injected into inputs by the dictionary mutators.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Word(Vec<u8>);

impl Word {
    /// Longest word a dictionary accepts.
    pub const MAX_SIZE: usize = 64;

    pub fn new(bytes: &[u8]) -> Result<Self, DictionaryError> {
        Self::try_from(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u8>> for Word {
    type Error = DictionaryError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            return Err(DictionaryError::EmptyWord);
        }
        if bytes.len() > Self::MAX_SIZE {
            return Err(DictionaryError::WordTooLong(bytes.len()));
        }
        Ok(Word(bytes))
    }
}

impl From<Word> for Vec<u8> {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl AsRef<[u8]> for Word {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word(\"{}\")", escape_word(&self.0))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_word(&self.0))
    }
}

/// A dictionary word plus the statistics the dispatcher keeps about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    word: Word,
    /// Offset at which the word previously proved useful.
    position_hint: Option<usize>,
    use_count: u64,
    success_count: u64,
}

impl DictionaryEntry {
    pub fn new(word: Word) -> Self {
        Self {
            word,
            position_hint: None,
            use_count: 0,
            success_count: 0,
        }
    }

    pub fn with_position_hint(word: Word, position_hint: usize) -> Self {
        Self {
            position_hint: Some(position_hint),
            ..Self::new(word)
        }
    }

    pub(crate) fn with_use_count(word: Word, use_count: u64) -> Self {
        Self {
            use_count,
            ..Self::new(word)
        }
    }

    pub fn word(&self) -> &Word {
        &self.word
    }

    pub fn position_hint(&self) -> Option<usize> {
        self.position_hint
    }

    pub fn use_count(&self) -> u64 {
        self.use_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn increment_use_count(&mut self) {
        self.use_count += 1;
    }

    pub fn increment_success_count(&mut self) {
        self.success_count += 1;
    }
}

/// Identifies one of the three dictionaries a dispatcher owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DictionaryKind {
    /// Words supplied by the user, e.g. from a `.dict` file.
    Manual,
    /// Words discovered during the current session; may be cleared at any time.
    TemporaryAuto,
    /// Words that were part of a successful mutation sequence.
    PersistentAuto,
}

/// An ordered, capacity-bounded list of dictionary entries.
///
/// Pushing into a full dictionary is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredDictionary")]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    capacity: usize,
}

/// Unchecked serialized form of a [`Dictionary`].
#[derive(Deserialize)]
struct StoredDictionary {
    entries: Vec<DictionaryEntry>,
    capacity: usize,
}

impl TryFrom<StoredDictionary> for Dictionary {
    type Error = DictionaryError;

    fn try_from(stored: StoredDictionary) -> Result<Self, Self::Error> {
        if stored.entries.len() > stored.capacity {
            return Err(DictionaryError::OverCapacity {
                len: stored.entries.len(),
                capacity: stored.capacity,
            });
        }
        Ok(Self {
            entries: stored.entries,
            capacity: stored.capacity,
        })
    }
}

impl Dictionary {
    /// Default capacity of every dictionary.
    pub const MAX_SIZE: usize = 1 << 14;

    pub fn new() -> Self {
        Self::with_capacity_limit(Self::MAX_SIZE)
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Appends `entry`, returning `false` if the dictionary is full.
    pub fn push(&mut self, entry: DictionaryEntry) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Linear search by word content.
    pub fn contains_word(&self, word: &Word) -> bool {
        self.entries.iter().any(|entry| entry.word() == word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&DictionaryEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DictionaryEntry> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one `[name=]"value"` dictionary line into raw bytes.
///
/// Supported escapes are `\\`, `\"` and `\xHH`. Returns `None` for anything
/// else, including an empty value.
fn parse_entry(line: &[u8]) -> Option<Vec<u8>> {
    if line.is_empty() {
        return None;
    }
    let mut left = 0;
    let mut right = line.len() - 1;
    while left < right && is_space(line[left]) {
        left += 1;
    }
    while right > left && is_space(line[right]) {
        right -= 1;
    }
    if right - left < 2 || line[right] != b'"' {
        return None;
    }
    right -= 1;
    while left < right && line[left] != b'"' {
        left += 1;
    }
    if left >= right {
        return None;
    }
    left += 1;

    let mut bytes = Vec::with_capacity(right + 1 - left);
    let mut pos = left;
    while pos <= right {
        let byte = line[pos];
        if !is_print(byte) && !is_space(byte) {
            return None;
        }
        if byte != b'\\' {
            bytes.push(byte);
            pos += 1;
            continue;
        }
        if pos < right && matches!(line[pos + 1], b'\\' | b'"') {
            bytes.push(line[pos + 1]);
            pos += 2;
            continue;
        }
        if pos + 3 <= right
            && line[pos + 1] == b'x'
            && line[pos + 2].is_ascii_hexdigit()
            && line[pos + 3].is_ascii_hexdigit()
        {
            let hex = std::str::from_utf8(&line[pos + 2..pos + 4]).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            pos += 4;
            continue;
        }
        return None;
    }
    Some(bytes)
}

/// Parses the contents of an AFL-style dictionary file.
///
/// Blank lines and lines starting with `#` are skipped. Every other line must
/// hold one `[name=]"value"` entry.
pub fn parse_dictionary(text: &str) -> Result<Vec<Word>, DictionaryError> {
    let mut words = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let bytes = parse_entry(line.as_bytes()).ok_or_else(|| DictionaryError::MalformedEntry {
            line: index + 1,
            content: line.to_string(),
        })?;
        words.push(Word::try_from(bytes)?);
    }
    Ok(words)
}

/// Reads and parses a dictionary file.
pub fn load_dictionary_file(path: &Path) -> Result<Vec<Word>, DictionaryError> {
    let text = fs::read_to_string(path)
        .map_err(|e| DictionaryError::Io(format!("Failed to read dictionary {:?}: {}", path, e)))?;
    let words = parse_dictionary(&text)?;
    log::debug!("Loaded {} words from dictionary {:?}", words.len(), path);
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn word(bytes: &[u8]) -> Word {
        Word::new(bytes).unwrap()
    }

    #[test]
    fn word_rejects_empty_and_oversized_input() {
        assert!(matches!(Word::new(b""), Err(DictionaryError::EmptyWord)));
        assert!(matches!(
            Word::new(&[b'a'; Word::MAX_SIZE + 1]),
            Err(DictionaryError::WordTooLong(65))
        ));
        assert_eq!(Word::new(&[b'a'; Word::MAX_SIZE]).unwrap().len(), 64);
    }

    #[test]
    fn dictionary_push_is_a_noop_when_full() {
        let mut dict = Dictionary::with_capacity_limit(2);
        assert!(dict.push(DictionaryEntry::new(word(b"a"))));
        assert!(dict.push(DictionaryEntry::new(word(b"b"))));
        assert!(!dict.push(DictionaryEntry::new(word(b"c"))));
        assert_eq!(dict.len(), 2);
        assert!(!dict.contains_word(&word(b"c")));
    }

    #[test]
    fn dictionary_contains_word_compares_content() {
        let mut dict = Dictionary::new();
        dict.push(DictionaryEntry::with_position_hint(word(b"GET"), 0));
        assert!(dict.contains_word(&word(b"GET")));
        assert!(!dict.contains_word(&word(b"GE")));
        assert_eq!(dict.get(0).unwrap().position_hint(), Some(0));
        dict.clear();
        assert!(dict.is_empty());
    }

    #[test]
    fn entry_counters_increase() {
        let mut entry = DictionaryEntry::new(word(b"x"));
        entry.increment_use_count();
        entry.increment_use_count();
        entry.increment_success_count();
        assert_eq!(entry.use_count(), 2);
        assert_eq!(entry.success_count(), 1);
    }

    #[test]
    fn parse_dictionary_handles_names_comments_and_escapes() {
        let text = "# http keywords\n\
                    \n\
                    kw_get=\"GET\"\n\
                    \"\\x00\\xffA\"\n\
                    \t quoted=\"say \\\"hi\\\" \\\\ bye\"  \n";
        let words = parse_dictionary(text).unwrap();
        assert_eq!(
            words,
            vec![word(b"GET"), word(b"\x00\xffA"), word(b"say \"hi\" \\ bye")]
        );
    }

    #[test]
    fn parse_dictionary_reports_the_bad_line() {
        let text = "\"ok\"\nnot quoted\n";
        match parse_dictionary(text) {
            Err(DictionaryError::MalformedEntry { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedEntry, got {:?}", other),
        }
        assert!(parse_dictionary("\"\"").is_err());
        assert!(parse_dictionary("\"bad \\q escape\"").is_err());
    }

    #[test]
    fn escaped_words_parse_back() {
        let original = word(b"a\"b\\c\x01\x7f");
        let line = format!("\"{}\"", original);
        assert_eq!(parse_dictionary(&line).unwrap(), vec![original]);
    }

    #[test]
    fn load_dictionary_file_reads_from_disk() -> Result<(), DictionaryError> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("http.dict");
        fs::write(&path, "a=\"POST\"\nb=\"HTTP/1.1\"\n").unwrap();
        let words = load_dictionary_file(&path)?;
        assert_eq!(words, vec![word(b"POST"), word(b"HTTP/1.1")]);
        assert!(load_dictionary_file(&dir.path().join("missing.dict")).is_err());
        dir.close().unwrap();
        Ok(())
    }

    #[test]
    fn dictionary_round_trips_through_json() {
        let mut dict = Dictionary::new();
        let mut entry = DictionaryEntry::with_position_hint(word(b"\x00key"), 3);
        entry.increment_use_count();
        dict.push(entry);
        let json = serde_json::to_string(&dict).unwrap();
        let restored: Dictionary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, dict);
        assert!(serde_json::from_str::<Word>("[]").is_err());
    }

    #[test]
    fn stored_dictionary_over_capacity_is_rejected() {
        let mut dict = Dictionary::with_capacity_limit(2);
        dict.push(DictionaryEntry::new(word(b"one")));
        dict.push(DictionaryEntry::new(word(b"two")));
        let json = serde_json::to_string(&dict).unwrap();

        let shrunk = json.replace("\"capacity\":2", "\"capacity\":1");
        assert_ne!(shrunk, json);
        let err = serde_json::from_str::<Dictionary>(&shrunk).unwrap_err();
        assert!(err.to_string().contains("capacity is 1"), "{err}");

        let zero = json.replace("\"capacity\":2", "\"capacity\":0");
        assert!(serde_json::from_str::<Dictionary>(&zero).is_err());

        let restored: Dictionary = serde_json::from_str(&json).unwrap();
        assert_eq!((restored.len(), restored.capacity()), (2, 2));
    }
}
