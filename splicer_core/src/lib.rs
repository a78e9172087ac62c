pub mod config;
pub mod corpus;
pub mod crossover;
pub mod dictionary;
pub mod dispatcher;
pub mod hooks;
pub mod input;
pub mod mutations;
pub mod mutator;
pub mod random;
pub mod report;

pub use config::{MutationOptions, SplicerConfig};
pub use corpus::{Corpus, CorpusEntry, CorpusError, InMemoryCorpus};
pub use dictionary::{
    Dictionary, DictionaryEntry, DictionaryError, DictionaryKind, Word, load_dictionary_file,
    parse_dictionary,
};
pub use dispatcher::{
    MAX_MUTATION_ATTEMPTS, MutationDispatcher, MutationDispatcherBuilder, UsedDictionaryEntry,
};
pub use hooks::{CustomCrossOver, CustomMutator};
pub use input::Input;
pub use mutator::{MutatorKind, UnknownMutator};
pub use random::Random;
