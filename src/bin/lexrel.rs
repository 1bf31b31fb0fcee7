//! LEXREL CLI
//!
//! Convert GloVe text vectors to the binary layout and run relatedness
//! queries against them.

use clap::{Parser, Subcommand};
use lexrel::{
    AdaptorConfig, BinaryWriter, EmbeddingAdaptor, LexicalBackend, TextRecords, WordRelation,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// LEXREL - Lexical relatedness over word embeddings
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a GloVe text file to the binary layout
    Convert {
        /// Text embedding file (`word v1 v2 ...` per line)
        input: PathBuf,

        /// Output directory for dict.bin and vectors.bin
        output: PathBuf,
    },

    /// Score two words and list the relations below the threshold
    Similarity {
        /// Binary embedding directory
        embeddings: PathBuf,

        word1: String,

        word2: String,

        /// Relation threshold in [0, 1]
        #[arg(short, long, default_value_t = lexrel::api::DEFAULT_RELATEDNESS_THRESHOLD)]
        threshold: f64,
    },

    /// List the words nearest to a word
    Related {
        /// Binary embedding directory
        embeddings: PathBuf,

        word: String,

        /// Number of related words
        #[arg(short = 'n', long, default_value_t = lexrel::api::DEFAULT_MAX_RELATED_WORDS)]
        count: usize,

        /// Load the vector table into memory
        #[arg(long)]
        preload: bool,

        /// Index unit-length vectors
        #[arg(long)]
        normalize: bool,
    },

    /// Show the concept a word maps to
    Concepts {
        /// Binary embedding directory
        embeddings: PathBuf,

        word: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lexrel=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Convert { input, output } => {
            let started = Instant::now();
            let written = BinaryWriter::write_stream(&output, TextRecords::open(&input)?)?;
            info!(
                words = written,
                elapsed = ?started.elapsed(),
                "Converted {} to {}",
                input.display(),
                output.display()
            );
            println!("{} words written to {}", written, output.display());
        }

        Command::Similarity {
            embeddings,
            word1,
            word2,
            threshold,
        } => {
            let adaptor = EmbeddingAdaptor::open_with_config(
                &embeddings,
                AdaptorConfig::default().with_threshold(threshold),
            )?;
            let weights = adaptor.word_relations_weighted(&word1, &word2)?;
            let relations = adaptor.word_relations(&word1, &word2)?;

            let score = weights
                .get(&WordRelation::Similarity)
                .copied()
                .unwrap_or_default();
            println!("score({}, {}) = {:.4}", word1, word2, score);

            let mut names: Vec<String> = relations.iter().map(|r| r.to_string()).collect();
            names.sort();
            println!("relations below {}: [{}]", threshold, names.join(", "));
        }

        Command::Related {
            embeddings,
            word,
            count,
            preload,
            normalize,
        } => {
            let started = Instant::now();
            let adaptor = EmbeddingAdaptor::open_with_config(
                &embeddings,
                AdaptorConfig::default()
                    .with_neighbor_index(true)
                    .with_preload(preload)
                    .with_normalized_index(normalize),
            )?;
            info!(elapsed = ?started.elapsed(), "Embeddings ready");

            let related = adaptor.related_words_scored(&word, count)?;
            if related.is_empty() {
                println!("(no related words for {})", word);
            }
            for (i, (w, score)) in related.iter().enumerate() {
                println!("{:>3}. {:<24} {:.4}", i + 1, w, score);
            }
        }

        Command::Concepts { embeddings, word } => {
            let adaptor = EmbeddingAdaptor::open(&embeddings)?;
            let concepts = adaptor.word_to_concepts(&word)?;
            if concepts.is_empty() {
                println!("(nil)");
            }
            for concept in concepts {
                println!("{} (dimension {})", concept.id(), concept.vector().len());
            }
        }
    }

    Ok(())
}
