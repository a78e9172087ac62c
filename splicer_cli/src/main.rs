use splicer_core::config::SplicerConfig;
use splicer_core::corpus::{Corpus, InMemoryCorpus};
use splicer_core::dictionary::{Dictionary, load_dictionary_file};
use splicer_core::dispatcher::MutationDispatcher;

use clap::Parser;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    #[clap(short, long)]
    seed: Option<u64>,
    #[clap(short, long)]
    runs: Option<u64>,
    #[clap(long)]
    max_len: Option<usize>,
    /// Dictionary file in AFL format; may be repeated.
    #[clap(long = "dict", value_parser)]
    dicts: Vec<PathBuf>,
    #[clap(long)]
    only_ascii: bool,
    #[clap(short, long, value_parser)]
    output_dir: Option<PathBuf>,
    #[clap(long)]
    print_sequences: bool,
    /// Seed files or directories.
    #[clap(value_parser)]
    seeds: Vec<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<SplicerConfig, anyhow::Error> {
    match &cli.config_file {
        Some(config_path) => {
            println!("Loading configuration from specified path: {config_path:?}");
            SplicerConfig::load_from_file(config_path)
        }
        None => {
            let default_config_path = PathBuf::from("splicer.toml");
            if default_config_path.exists() {
                println!(
                    "No config file specified via CLI, loading default: {default_config_path:?}"
                );
                SplicerConfig::load_from_file(&default_config_path)
            } else {
                println!(
                    "No config file specified and default 'splicer.toml' not found, using built-in defaults."
                );
                Ok(SplicerConfig::default())
            }
        }
    }
}

fn apply_overrides(config: &mut SplicerConfig, cli: Cli) -> Result<(), anyhow::Error> {
    if let Some(seed) = cli.seed {
        config.session.seed = seed;
    }
    if let Some(runs) = cli.runs {
        config.session.runs = runs;
    }
    if let Some(max_len) = cli.max_len {
        if max_len == 0 {
            return Err(anyhow::anyhow!("--max-len must be greater than zero"));
        }
        config.session.max_len = max_len;
    }
    if cli.only_ascii {
        config.mutation.only_ascii = true;
    }
    if cli.output_dir.is_some() {
        config.session.output_dir = cli.output_dir;
    }
    if cli.print_sequences {
        config.session.print_sequences = true;
    }
    config.dictionary.manual_paths.extend(cli.dicts);
    config.corpus.initial_seed_paths.extend(cli.seeds);
    Ok(())
}

fn load_persistent_dictionary(path: &Path) -> Result<Option<Dictionary>, anyhow::Error> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("Failed to read persistent dictionary at {:?}: {}", path, e)
    })?;
    let dictionary = serde_json::from_str(&content).map_err(|e| {
        anyhow::anyhow!("Failed to parse persistent dictionary {:?}: {}", path, e)
    })?;
    Ok(Some(dictionary))
}

fn save_persistent_dictionary(path: &Path, dictionary: &Dictionary) -> Result<(), anyhow::Error> {
    let content = serde_json::to_string_pretty(dictionary)?;
    std::fs::write(path, content).map_err(|e| {
        anyhow::anyhow!("Failed to write persistent dictionary to {:?}: {}", path, e)
    })
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli)?;
    apply_overrides(&mut config, cli)?;
    log::debug!("Effective configuration: {config:#?}");

    let session = config.session.clone();
    let mut dispatcher = MutationDispatcher::new(session.seed, config.mutation.clone());

    for dict_path in &config.dictionary.manual_paths {
        let words = load_dictionary_file(dict_path)?;
        println!("Loaded {} words from {:?}", words.len(), dict_path);
        for word in words {
            dispatcher.add_word_to_manual_dictionary(word);
        }
    }
    if let Some(persistent_path) = &config.dictionary.persistent_path {
        if let Some(saved) = load_persistent_dictionary(persistent_path)? {
            dispatcher.restore_persistent_auto_dictionary(saved);
        }
    }

    let mut corpus: InMemoryCorpus<Vec<u8>> = InMemoryCorpus::new();
    let seed_count = corpus.load_initial_seeds(&config.corpus.initial_seed_paths)?;
    let mut known_hashes = HashSet::new();
    for entry in corpus.iter() {
        known_hashes.insert(md5::compute(&entry.input).0);
    }

    if let Some(output_dir) = &session.output_dir {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            anyhow::anyhow!("Failed to create output directory {:?}: {}", output_dir, e)
        })?;
    }

    println!(
        "Starting mutation loop for {} runs with {} seeds, max length {}...",
        session.runs, seed_count, session.max_len
    );
    let mut rng = ChaCha8Rng::seed_from_u64(session.seed);
    let mut buffer = vec![0u8; session.max_len];
    let start_time = Instant::now();
    let mut novel_inputs = 0u64;

    for i in 0..session.runs {
        let size = match corpus.random_select(&mut rng) {
            Some((_, input)) => {
                let len = input.len().min(session.max_len);
                buffer[..len].copy_from_slice(&input[..len]);
                len
            }
            None => 0,
        };

        dispatcher.start_mutation_sequence();
        let new_size = dispatcher.mutate(&mut buffer, size, session.max_len, Some(&corpus));
        let mutated = &buffer[..new_size];

        let digest = md5::compute(mutated);
        if known_hashes.insert(digest.0) {
            novel_inputs += 1;
            dispatcher.record_successful_mutation_sequence();
            if let Some(output_dir) = &session.output_dir {
                let path = output_dir.join(format!("{digest:x}.bin"));
                std::fs::write(&path, mutated).map_err(|e| {
                    anyhow::anyhow!("Failed to write input to {:?}: {}", path, e)
                })?;
            }
            if session.print_sequences {
                println!("#{i} NEW {digest:x} len: {new_size} {}", dispatcher.mutation_sequence());
            }
            corpus.add(mutated.to_vec(), dispatcher.mutation_sequence());
        }

        if i > 0 && i % (session.runs / 100).max(1) == 0 {
            let elapsed = start_time.elapsed().as_secs_f32();
            let runs_per_sec = if elapsed > 0.0 {
                i as f32 / elapsed
            } else {
                0.0
            };
            print!(
                "\rRun: {}/{}, Corpus: {}, New: {}, Runs/sec: {:.2}   ",
                i,
                session.runs,
                corpus.len(),
                novel_inputs,
                runs_per_sec
            );
            std::io::stdout().flush()?;
        }
    }

    let elapsed_total = start_time.elapsed();
    println!("\nMutation loop finished in {elapsed_total:.2?}.");
    println!(
        "Total Runs: {}, Corpus Size: {}, New Inputs: {}, Persistent Dictionary: {}",
        session.runs,
        corpus.len(),
        novel_inputs,
        dispatcher.persistent_auto_dictionary().len()
    );
    dispatcher.print_recommended_dictionary();

    if let Some(persistent_path) = &config.dictionary.persistent_path {
        save_persistent_dictionary(persistent_path, dispatcher.persistent_auto_dictionary())?;
        println!("Saved persistent dictionary to {persistent_path:?}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use splicer_core::dictionary::{DictionaryEntry, Word};
    use tempfile::tempdir;

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "splicer",
            "--seed",
            "9",
            "--max-len",
            "32",
            "--dict",
            "a.dict",
            "--dict",
            "b.dict",
            "--only-ascii",
            "seeds",
        ]);
        let mut config = SplicerConfig::default();
        apply_overrides(&mut config, cli).unwrap();
        assert_eq!(config.session.seed, 9);
        assert_eq!(config.session.max_len, 32);
        assert_eq!(config.session.runs, splicer_core::config::default_runs());
        assert!(config.mutation.only_ascii);
        assert_eq!(config.dictionary.manual_paths.len(), 2);
        assert_eq!(config.corpus.initial_seed_paths, vec![PathBuf::from("seeds")]);
    }

    #[test]
    fn zero_max_len_is_rejected() {
        let cli = Cli::parse_from(["splicer", "--max-len", "0"]);
        assert!(apply_overrides(&mut SplicerConfig::default(), cli).is_err());
    }

    #[test]
    fn persistent_dictionary_survives_a_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persistent.json");
        assert!(load_persistent_dictionary(&path).unwrap().is_none());

        let mut dictionary = Dictionary::new();
        dictionary.push(DictionaryEntry::with_position_hint(Word::new(b"GET ").unwrap(), 0));
        save_persistent_dictionary(&path, &dictionary).unwrap();
        assert_eq!(load_persistent_dictionary(&path).unwrap(), Some(dictionary));
    }
}
