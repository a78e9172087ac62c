use crate::config::MutationOptions;
use crate::corpus::Corpus;
use crate::crossover;
use crate::dictionary::{Dictionary, DictionaryEntry, DictionaryKind, Word};
use crate::hooks::{CustomCrossOver, CustomMutator};
use crate::mutations;
use crate::mutator::MutatorKind;
use crate::random::Random;
use crate::report;

/// How many strategies `mutate` tries before giving up and returning the
/// input unchanged.
pub const MAX_MUTATION_ATTEMPTS: usize = 10;

/// A dictionary entry consumed during the current mutation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedDictionaryEntry {
    /// Dictionary the entry was drawn from.
    pub source: DictionaryKind,
    /// Index of the entry inside `source` at the time it was used.
    pub index: usize,
    pub word: Word,
}

/// Picks and applies mutation strategies to a caller-owned buffer.
///
/// One dispatcher is meant to live as long as a fuzzing worker. It owns the
/// random source, the three dictionaries and a scratch buffer, and it records
/// which strategies and dictionary words each mutation sequence used so the
/// driver can report or reinforce them.
///
/// The corpus is lent to each call rather than owned, so the driver stays
/// free to grow it between calls.
pub struct MutationDispatcher {
    rand: Random,
    options: MutationOptions,
    mutators: Vec<MutatorKind>,
    default_mutators: Vec<MutatorKind>,
    custom_mutator: Option<Box<dyn CustomMutator + Send>>,
    custom_cross_over: Option<Box<dyn CustomCrossOver + Send>>,
    manual_dictionary: Dictionary,
    temporary_auto_dictionary: Dictionary,
    persistent_auto_dictionary: Dictionary,
    scratch: Vec<u8>,
    current_mutator_sequence: Vec<MutatorKind>,
    current_dictionary_entry_sequence: Vec<UsedDictionaryEntry>,
}

/// Builds a [`MutationDispatcher`] with optional hooks.
#[derive(Default)]
pub struct MutationDispatcherBuilder {
    seed: u64,
    options: MutationOptions,
    registry: Option<Vec<MutatorKind>>,
    custom_mutator: Option<Box<dyn CustomMutator + Send>>,
    custom_cross_over: Option<Box<dyn CustomCrossOver + Send>>,
}

impl MutationDispatcherBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn options(mut self, options: MutationOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the built-in strategy set with `registry`, overriding
    /// `MutationOptions::mutators`.
    ///
    /// A configured custom mutator still takes precedence.
    pub fn registry(mut self, registry: Vec<MutatorKind>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn custom_mutator(mut self, hook: impl CustomMutator + Send + 'static) -> Self {
        self.custom_mutator = Some(Box::new(hook));
        self
    }

    pub fn custom_cross_over(mut self, hook: impl CustomCrossOver + Send + 'static) -> Self {
        self.custom_cross_over = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> MutationDispatcher {
        let default_mutators = MutatorKind::DEFAULT.to_vec();
        let mut mutators = if self.custom_mutator.is_some() {
            vec![MutatorKind::Custom]
        } else {
            self.registry
                .or(self.options.mutators.clone())
                .unwrap_or_else(|| default_mutators.clone())
        };
        if self.custom_cross_over.is_some() {
            mutators.push(MutatorKind::CustomCrossOver);
        }
        assert!(!mutators.is_empty(), "mutator registry must not be empty");
        log::debug!(
            "Mutation dispatcher uses {} strategies: {:?}",
            mutators.len(),
            mutators
        );

        MutationDispatcher {
            rand: Random::new(self.seed),
            options: self.options,
            mutators,
            default_mutators,
            custom_mutator: self.custom_mutator,
            custom_cross_over: self.custom_cross_over,
            manual_dictionary: Dictionary::new(),
            temporary_auto_dictionary: Dictionary::new(),
            persistent_auto_dictionary: Dictionary::new(),
            scratch: Vec::new(),
            current_mutator_sequence: Vec::new(),
            current_dictionary_entry_sequence: Vec::new(),
        }
    }
}

impl MutationDispatcher {
    /// Creates a dispatcher without hooks.
    ///
    /// Uses the built-in strategies, restricted to `options.mutators` when set.
    pub fn new(seed: u64, options: MutationOptions) -> Self {
        Self::builder().seed(seed).options(options).build()
    }

    pub fn builder() -> MutationDispatcherBuilder {
        MutationDispatcherBuilder::default()
    }

    /// Mutates `data[..size]` in place using the active strategies.
    ///
    /// `data` must be at least `max_size` bytes long. Returns the new size,
    /// which is `size` itself if no strategy applied within
    /// [`MAX_MUTATION_ATTEMPTS`] tries. With `size == 0` the first `max_size`
    /// bytes are filled with random data and `max_size` is returned.
    ///
    /// # Panics
    /// Panics if `max_size == 0`, `size > max_size`, `data` is shorter than
    /// `max_size`, or a hook returns more than `max_size` bytes.
    pub fn mutate(
        &mut self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        corpus: Option<&dyn Corpus>,
    ) -> usize {
        self.mutate_impl(data, size, max_size, corpus, false)
    }

    /// Like [`MutationDispatcher::mutate`] but always uses the built-in
    /// strategies, never the hooks.
    pub fn default_mutate(
        &mut self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        corpus: Option<&dyn Corpus>,
    ) -> usize {
        self.mutate_impl(data, size, max_size, corpus, true)
    }

    fn mutate_impl(
        &mut self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        corpus: Option<&dyn Corpus>,
        use_default: bool,
    ) -> usize {
        assert!(max_size > 0, "max_size must be positive");
        assert!(size <= max_size, "size {size} exceeds max_size {max_size}");
        assert!(
            data.len() >= max_size,
            "buffer of {} bytes is smaller than max_size {max_size}",
            data.len()
        );

        if size == 0 {
            for byte in &mut data[..max_size] {
                *byte = mutations::random_char(&mut self.rand);
            }
            if self.options.only_ascii {
                mutations::to_ascii(&mut data[..max_size]);
            }
            return max_size;
        }

        for _ in 0..MAX_MUTATION_ATTEMPTS {
            let registry = if use_default {
                &self.default_mutators
            } else {
                &self.mutators
            };
            let kind = registry[self.rand.below(registry.len())];
            let new_size = self.apply(kind, data, size, max_size, corpus);
            if new_size == 0 {
                log::trace!("{} not applicable to a {} byte input", kind, size);
                continue;
            }
            assert!(
                new_size <= max_size,
                "{kind} returned {new_size} bytes, more than max_size {max_size}"
            );
            if self.options.only_ascii {
                mutations::to_ascii(&mut data[..new_size]);
            }
            self.current_mutator_sequence.push(kind);
            return new_size;
        }
        size
    }

    fn apply(
        &mut self,
        kind: MutatorKind,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        corpus: Option<&dyn Corpus>,
    ) -> usize {
        let rand = &mut self.rand;
        match kind {
            MutatorKind::EraseBytes => mutations::erase_bytes(rand, data, size, max_size),
            MutatorKind::InsertByte => mutations::insert_byte(rand, data, size, max_size),
            MutatorKind::InsertRepeatedBytes => {
                mutations::insert_repeated_bytes(rand, data, size, max_size)
            }
            MutatorKind::ChangeByte => mutations::change_byte(rand, data, size, max_size),
            MutatorKind::ChangeBit => mutations::change_bit(rand, data, size, max_size),
            MutatorKind::ShuffleBytes => mutations::shuffle_bytes(rand, data, size, max_size),
            MutatorKind::ChangeAsciiInteger => {
                mutations::change_ascii_integer(rand, data, size, max_size)
            }
            MutatorKind::ChangeBinaryInteger => {
                mutations::change_binary_integer(rand, data, size, max_size)
            }
            MutatorKind::CopyPart => {
                crossover::copy_part(rand, &mut self.scratch, data, size, max_size)
            }
            MutatorKind::CrossOver => self.cross_over_with_corpus(data, size, max_size, corpus),
            MutatorKind::AddWordFromManualDictionary => {
                self.add_word_from_dictionary(DictionaryKind::Manual, data, size, max_size)
            }
            MutatorKind::AddWordFromTemporaryAutoDictionary => {
                self.add_word_from_dictionary(DictionaryKind::TemporaryAuto, data, size, max_size)
            }
            MutatorKind::AddWordFromPersistentAutoDictionary => {
                self.add_word_from_dictionary(DictionaryKind::PersistentAuto, data, size, max_size)
            }
            MutatorKind::Custom => self.apply_custom_mutator(data, size, max_size),
            MutatorKind::CustomCrossOver => {
                self.apply_custom_cross_over(data, size, max_size, corpus)
            }
        }
    }

    /// Picks a non-empty corpus entry to combine with; needs two or more entries.
    fn pick_other<'c>(&mut self, corpus: Option<&'c dyn Corpus>, size: usize) -> Option<&'c [u8]> {
        let corpus = corpus?;
        if corpus.len() < 2 || size == 0 {
            return None;
        }
        let other = corpus.get(self.rand.below(corpus.len()))?;
        if other.is_empty() { None } else { Some(other) }
    }

    fn cross_over_with_corpus(
        &mut self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        corpus: Option<&dyn Corpus>,
    ) -> usize {
        let Some(other) = self.pick_other(corpus, size) else {
            return 0;
        };
        let rand = &mut self.rand;
        let new_size = match rand.below(3) {
            0 => {
                self.scratch.resize(max_size, 0);
                let out = &mut self.scratch[..max_size];
                let written = crossover::cross_over(rand, &data[..size], other, out);
                data[..written].copy_from_slice(&out[..written]);
                written
            }
            1 => match crossover::insert_part_of(rand, other, data, size, max_size) {
                0 => crossover::copy_part_of(rand, other, data, size),
                inserted => inserted,
            },
            _ => crossover::copy_part_of(rand, other, data, size),
        };
        assert!(new_size > 0, "cross-over produced an empty input");
        new_size
    }

    fn apply_custom_mutator(&mut self, data: &mut [u8], size: usize, max_size: usize) -> usize {
        let seed = self.rand.next_u32();
        let Some(hook) = self.custom_mutator.as_mut() else {
            return 0;
        };
        let new_size = hook.mutate(&mut data[..max_size], size, max_size, seed);
        assert!(
            new_size <= max_size,
            "custom mutator returned {new_size} bytes, more than max_size {max_size}"
        );
        new_size
    }

    fn apply_custom_cross_over(
        &mut self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        corpus: Option<&dyn Corpus>,
    ) -> usize {
        if self.custom_cross_over.is_none() {
            return 0;
        }
        let Some(other) = self.pick_other(corpus, size) else {
            return 0;
        };
        let seed = self.rand.next_u32();
        self.scratch.resize(max_size, 0);
        let out = &mut self.scratch[..max_size];
        let Some(hook) = self.custom_cross_over.as_mut() else {
            return 0;
        };
        let new_size = hook.cross_over(&data[..size], other, out, seed);
        if new_size == 0 {
            return 0;
        }
        assert!(
            new_size <= max_size,
            "custom cross-over returned {new_size} bytes, more than max_size {max_size}"
        );
        data[..new_size].copy_from_slice(&out[..new_size]);
        new_size
    }

    /// Inserts or overwrites a word from dictionary `kind` into `data`.
    ///
    /// Backs the three `AddWordFrom*Dictionary` strategies. A remembered
    /// position hint is honoured half the time when it fits.
    pub fn add_word_from_dictionary(
        &mut self,
        kind: DictionaryKind,
        data: &mut [u8],
        size: usize,
        max_size: usize,
    ) -> usize {
        assert!(size <= max_size && data.len() >= max_size);
        let (dictionary, rand) = match kind {
            DictionaryKind::Manual => (&mut self.manual_dictionary, &mut self.rand),
            DictionaryKind::TemporaryAuto => (&mut self.temporary_auto_dictionary, &mut self.rand),
            DictionaryKind::PersistentAuto => {
                (&mut self.persistent_auto_dictionary, &mut self.rand)
            }
        };
        if dictionary.is_empty() {
            return 0;
        }
        let index = rand.below(dictionary.len());
        let Some(entry) = dictionary.get_mut(index) else {
            return 0;
        };
        let word = entry.word().as_bytes();
        let hint = entry
            .position_hint()
            .filter(|hint| *hint + word.len() < size && rand.next_bool());

        let new_size = if rand.next_bool() {
            if size + word.len() > max_size {
                return 0;
            }
            let at = hint.unwrap_or_else(|| rand.below(size + 1));
            data.copy_within(at..size, at + word.len());
            data[at..at + word.len()].copy_from_slice(word);
            size + word.len()
        } else {
            if word.len() > size {
                return 0;
            }
            let at = hint.unwrap_or_else(|| rand.below(size - word.len() + 1));
            data[at..at + word.len()].copy_from_slice(word);
            size
        };

        entry.increment_use_count();
        let used = UsedDictionaryEntry {
            source: kind,
            index,
            word: entry.word().clone(),
        };
        self.current_dictionary_entry_sequence.push(used);
        new_size
    }

    /// Clears the mutator and dictionary-entry logs.
    pub fn start_mutation_sequence(&mut self) {
        self.current_mutator_sequence.clear();
        self.current_dictionary_entry_sequence.clear();
    }

    /// Reinforces the dictionary entries used in the current sequence.
    ///
    /// Each used entry gets its success count bumped and its word is copied
    /// into the persistent dictionary unless an equal word is already there.
    pub fn record_successful_mutation_sequence(&mut self) {
        for used in &self.current_dictionary_entry_sequence {
            let dictionary = match used.source {
                DictionaryKind::Manual => &mut self.manual_dictionary,
                DictionaryKind::TemporaryAuto => &mut self.temporary_auto_dictionary,
                DictionaryKind::PersistentAuto => &mut self.persistent_auto_dictionary,
            };
            // The temporary dictionary may have been cleared since.
            if let Some(entry) = dictionary.get_mut(used.index) {
                if entry.word() == &used.word {
                    entry.increment_success_count();
                }
            }
            if !self.persistent_auto_dictionary.contains_word(&used.word) {
                let added = self
                    .persistent_auto_dictionary
                    .push(DictionaryEntry::with_use_count(used.word.clone(), 1));
                if added {
                    log::debug!("Promoted \"{}\" to the persistent dictionary", used.word);
                } else {
                    log::warn!("Persistent dictionary is full, dropping \"{}\"", used.word);
                }
            }
        }
    }

    pub fn add_word_to_manual_dictionary(&mut self, word: Word) {
        if !self.manual_dictionary.push(DictionaryEntry::new(word)) {
            log::warn!("Manual dictionary is full, ignoring word");
        }
    }

    /// Adds an entry to the temporary auto dictionary; ignored once it is full.
    pub fn add_word_to_auto_dictionary(&mut self, entry: DictionaryEntry) {
        if !self.temporary_auto_dictionary.push(entry) {
            log::trace!("Temporary auto dictionary is full, ignoring word");
        }
    }

    pub fn clear_auto_dictionary(&mut self) {
        self.temporary_auto_dictionary.clear();
    }

    /// Replaces the persistent dictionary, e.g. with one saved by an earlier session.
    ///
    /// Duplicate words and entries beyond [`Dictionary::MAX_SIZE`] are dropped.
    pub fn restore_persistent_auto_dictionary(&mut self, saved: Dictionary) {
        let mut restored = Dictionary::new();
        for entry in saved.iter() {
            if !restored.contains_word(entry.word()) {
                restored.push(entry.clone());
            }
        }
        log::debug!("Restored {} persistent dictionary entries", restored.len());
        self.persistent_auto_dictionary = restored;
    }

    pub fn manual_dictionary(&self) -> &Dictionary {
        &self.manual_dictionary
    }

    pub fn temporary_auto_dictionary(&self) -> &Dictionary {
        &self.temporary_auto_dictionary
    }

    pub fn persistent_auto_dictionary(&self) -> &Dictionary {
        &self.persistent_auto_dictionary
    }

    /// The strategies `mutate` draws from.
    pub fn mutators(&self) -> &[MutatorKind] {
        &self.mutators
    }

    pub fn options(&self) -> &MutationOptions {
        &self.options
    }

    /// Strategies applied since the last [`MutationDispatcher::start_mutation_sequence`].
    pub fn mutator_sequence(&self) -> &[MutatorKind] {
        &self.current_mutator_sequence
    }

    /// Dictionary entries used since the last [`MutationDispatcher::start_mutation_sequence`].
    pub fn dictionary_entry_sequence(&self) -> &[UsedDictionaryEntry] {
        &self.current_dictionary_entry_sequence
    }

    /// Renders the current sequence as `MS: <n> <Name>-... DE: "<word>"-...`.
    pub fn mutation_sequence(&self) -> String {
        report::render_mutation_sequence(
            &self.current_mutator_sequence,
            self.current_dictionary_entry_sequence.iter().map(|used| &used.word),
        )
    }

    pub fn print_mutation_sequence(&self) {
        eprint!("{}", self.mutation_sequence());
    }

    /// Renders persistent dictionary words that are not in the manual dictionary.
    pub fn recommended_dictionary(&self) -> String {
        report::render_recommended_dictionary(
            self.persistent_auto_dictionary
                .iter()
                .filter(|entry| !self.manual_dictionary.contains_word(entry.word())),
        )
    }

    pub fn print_recommended_dictionary(&self) {
        eprint!("{}", self.recommended_dictionary());
    }
}
