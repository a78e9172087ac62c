use crate::input::Input;
use rand_core::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Defines errors that can arise while filling a corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// A seed path given by the user does not exist.
    #[error("Seed path {0:?} does not exist")]
    SeedPathNotFound(PathBuf),

    /// An I/O error occurred while reading seeds.
    /// Contains a string describing the underlying I/O error.
    #[error("Corpus I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CorpusError {
    fn from(err: std::io::Error) -> Self {
        CorpusError::Io(err.to_string())
    }
}

/// Read-only, indexable view of existing test cases.
///
/// This is all the mutation engine needs from a corpus: cross-over strategies
/// pick a random index in `[0, len())` and read that entry's bytes. Entries
/// may be empty; callers skip them.
pub trait Corpus {
    /// Returns the total number of inputs in the corpus.
    fn len(&self) -> usize;

    /// Returns the bytes of the input with index `id`, if it exists.
    fn get(&self, id: usize) -> Option<&[u8]>;

    /// Returns `true` if the corpus contains no inputs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I: Input> Corpus for Vec<I> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, id: usize) -> Option<&[u8]> {
        self.as_slice().get(id).map(Input::as_bytes)
    }
}

/// One stored input together with a note on where it came from.
#[derive(Debug, Clone)]
pub struct CorpusEntry<I: Input> {
    pub input: I,
    /// Human-readable origin, e.g. the seed file or the mutation that made it.
    pub origin: String,
}

/// An in-memory corpus.
///
/// Entries are kept in insertion order and never removed, so an index stays
/// valid for the corpus's lifetime.
#[derive(Debug)]
pub struct InMemoryCorpus<I: Input> {
    entries: Vec<CorpusEntry<I>>,
}

impl<I: Input> InMemoryCorpus<I> {
    /// Creates a new, empty `InMemoryCorpus`.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an input and returns its index.
    pub fn add(&mut self, input: I, origin: impl Into<String>) -> usize {
        let id = self.entries.len();
        self.entries.push(CorpusEntry {
            input,
            origin: origin.into(),
        });
        id
    }

    pub fn entry(&self, id: usize) -> Option<&CorpusEntry<I>> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusEntry<I>> {
        self.entries.iter()
    }

    /// Picks an entry uniformly at random. Returns `None` if the corpus is empty.
    pub fn random_select(&self, rng: &mut dyn RngCore) -> Option<(usize, &I)> {
        if self.entries.is_empty() {
            return None;
        }
        let index = rng.next_u64() as usize % self.entries.len();
        self.entries.get(index).map(|entry| (index, &entry.input))
    }

    /// Loads seed inputs from files and directories.
    ///
    /// Directories are read one level deep in file-name order; hidden files
    /// are skipped. Returns the number of seeds loaded.
    pub fn load_initial_seeds(&mut self, seed_paths: &[PathBuf]) -> Result<usize, CorpusError> {
        let mut loaded_count = 0;
        for path_buf in seed_paths {
            let path_ref = path_buf.as_path();
            if path_ref.is_file() {
                self.load_seed_file(path_ref)?;
                loaded_count += 1;
            } else if path_ref.is_dir() {
                let mut files = Vec::new();
                for entry_result in fs::read_dir(path_ref).map_err(|e| {
                    CorpusError::Io(format!(
                        "Failed to read seed directory {:?}: {}",
                        path_ref, e
                    ))
                })? {
                    let entry = entry_result.map_err(|e| {
                        CorpusError::Io(format!("Error reading entry in {:?}: {}", path_ref, e))
                    })?;
                    let file_path_in_dir = entry.path();
                    let hidden = entry.file_name().to_string_lossy().starts_with('.');
                    if file_path_in_dir.is_file() && !hidden {
                        files.push(file_path_in_dir);
                    }
                }
                files.sort();
                for file in &files {
                    self.load_seed_file(file)?;
                }
                loaded_count += files.len();
            } else {
                return Err(CorpusError::SeedPathNotFound(path_buf.clone()));
            }
        }
        log::debug!("Loaded {} seeds into corpus", loaded_count);
        Ok(loaded_count)
    }

    fn load_seed_file(&mut self, path: &Path) -> Result<usize, CorpusError> {
        let data_bytes = fs::read(path).map_err(|e| {
            CorpusError::Io(format!("Failed to read seed file {:?}: {}", path, e))
        })?;
        Ok(self.add(I::from_bytes(data_bytes), format!("seed {:?}", path)))
    }
}

impl<I: Input> Default for InMemoryCorpus<I> {
    /// Provides a default, empty `InMemoryCorpus`.
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Input> Corpus for InMemoryCorpus<I> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, id: usize) -> Option<&[u8]> {
        self.entries.get(id).map(|entry| entry.input.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn in_memory_corpus_add_get_len_is_empty() {
        let mut corpus: InMemoryCorpus<Vec<u8>> = InMemoryCorpus::new();
        assert!(Corpus::is_empty(&corpus));
        assert_eq!(Corpus::len(&corpus), 0);
        let id1 = corpus.add(vec![1, 2, 3], "first");
        let id2 = corpus.add(vec![4, 5], "second");
        assert_eq!((id1, id2), (0, 1));
        assert_eq!(Corpus::len(&corpus), 2);
        assert_eq!(Corpus::get(&corpus, id1), Some(&[1u8, 2, 3][..]));
        assert_eq!(corpus.entry(id2).unwrap().origin, "second");
        assert!(Corpus::get(&corpus, 99).is_none());
    }

    #[test]
    fn vectors_of_inputs_are_corpora() {
        let inputs: Vec<Vec<u8>> = vec![b"one".to_vec(), Vec::new()];
        let view: &dyn Corpus = &inputs;
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0), Some(&b"one"[..]));
        assert_eq!(view.get(1), Some(&b""[..]));
        assert!(view.get(2).is_none());
        assert!(!view.is_empty());
    }

    #[test]
    fn in_memory_corpus_random_select_behavior() {
        let mut corpus: InMemoryCorpus<Vec<u8>> = InMemoryCorpus::new();
        let mut rng = ChaCha8Rng::from_seed([42; 32]);
        assert!(corpus.random_select(&mut rng).is_none());

        corpus.add(vec![b'A'], "meta_A");
        corpus.add(vec![b'B'], "meta_B");
        corpus.add(vec![b'C'], "meta_C");

        let mut selected_ids_counts = HashMap::new();
        for _ in 0..100 {
            let (id, input) = corpus
                .random_select(&mut rng)
                .expect("random_select failed on non-empty corpus");
            assert_eq!(input, &corpus.entry(id).unwrap().input);
            *selected_ids_counts.entry(id).or_insert(0) += 1;
        }
        assert_eq!(selected_ids_counts.len(), 3, "All items should be selected");
    }

    #[test]
    fn in_memory_corpus_load_initial_seeds() -> Result<(), CorpusError> {
        let mut corpus: InMemoryCorpus<Vec<u8>> = InMemoryCorpus::new();
        let temp_dir = tempdir().unwrap();
        let seed1_p = temp_dir.path().join("s1.bin");
        fs::write(&seed1_p, [1, 2]).unwrap();
        let seed_d = temp_dir.path().join("s_dir");
        fs::create_dir(&seed_d).unwrap();
        fs::write(seed_d.join("b.dat"), [7]).unwrap();
        fs::write(seed_d.join("a.dat"), [6]).unwrap();
        fs::write(seed_d.join(".hidden"), [9]).unwrap();

        let count = corpus.load_initial_seeds(&[seed1_p, seed_d])?;
        assert_eq!(count, 3);
        assert_eq!(Corpus::get(&corpus, 0), Some(&[1u8, 2][..]));
        assert_eq!(Corpus::get(&corpus, 1), Some(&[6u8][..]));
        assert_eq!(Corpus::get(&corpus, 2), Some(&[7u8][..]));
        temp_dir.close().unwrap();
        Ok(())
    }

    #[test]
    fn load_initial_seeds_rejects_missing_paths() {
        let temp_dir = tempdir().unwrap();
        let mut corpus: InMemoryCorpus<Vec<u8>> = InMemoryCorpus::new();
        let missing = temp_dir.path().join("nope");
        match corpus.load_initial_seeds(&[missing.clone()]) {
            Err(CorpusError::SeedPathNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected SeedPathNotFound, got {:?}", other),
        }
    }
}
