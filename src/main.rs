use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod embeddings;
use embeddings::{create_embedding_model, EmbeddingGenerator, EmbeddingIndex};

mod matching;
use matching::{hints, SongMatcher, SongScorer};

mod song_store;
use song_store::{Prompt, PromptArc, Song, SongStore, SqliteSongStore, TempoCategory};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser, Debug)]
#[clap(version = VERSION, about = "Song bank catalog and matching CLI")]
struct CliArgs {
    /// Path to a TOML config file. File values override CLI values.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database file.
    #[clap(long)]
    pub db: Option<PathBuf>,

    /// Path to the embedding index artifact.
    #[clap(long)]
    pub index: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the catalog database schema.
    Init,

    /// Insert a song into the catalog, or update it if the filename exists.
    AddSong {
        #[clap(long)]
        filename: String,
        #[clap(long)]
        file_path: String,
        #[clap(long)]
        arc_number: Option<u32>,
        #[clap(long)]
        prompt_number: Option<u32>,
        #[clap(long)]
        arc_name: Option<String>,
        #[clap(long)]
        track_title: Option<String>,
        #[clap(long)]
        prompt_text: Option<String>,
        #[clap(long)]
        duration: Option<f64>,
        #[clap(long)]
        bpm: Option<f64>,
        #[clap(long)]
        key: Option<String>,
        #[clap(long)]
        energy: Option<f64>,
        /// Comma-separated vibe tags.
        #[clap(long)]
        vibe_tags: Option<String>,
        /// Comma-separated mood keywords.
        #[clap(long)]
        mood_keywords: Option<String>,
    },

    /// Rebuild the embedding index from every song in the catalog.
    Reindex,

    /// Find the best matching songs for a prompt.
    Match {
        /// Prompt text describing the desired song.
        prompt: String,
        #[clap(long, default_value_t = 1)]
        arc_number: u32,
        #[clap(long, default_value = "")]
        arc_name: String,
        /// Overall track theme.
        #[clap(long, default_value = "")]
        theme: String,
        /// Number of matches to return.
        #[clap(short, long, default_value_t = 5)]
        count: usize,
        /// Minimum similarity threshold (config default when omitted).
        #[clap(long)]
        min_similarity: Option<f64>,
    },

    /// Increment a song's usage counter.
    MarkUsed {
        song_id: String,
        #[clap(long)]
        track_id: Option<String>,
    },

    /// Show catalog and index statistics.
    Stats,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(
        &CliConfig {
            db_path: cli_args.db.clone(),
            index_path: cli_args.index.clone(),
        },
        file_config,
    )?;

    match cli_args.command {
        Command::Init => init(&config),
        Command::AddSong {
            filename,
            file_path,
            arc_number,
            prompt_number,
            arc_name,
            track_title,
            prompt_text,
            duration,
            bpm,
            key,
            energy,
            vibe_tags,
            mood_keywords,
        } => {
            let store = open_store(&config)?;
            let mut song = match store.get_song_by_filename(&filename)? {
                Some(existing) => existing,
                None => Song::new(filename, file_path.clone()),
            };
            song.file_path = file_path;
            song.arc_number = arc_number;
            song.prompt_number = prompt_number;
            song.arc_name = arc_name;
            song.track_title = track_title;
            song.prompt_text = prompt_text;
            song.duration_seconds = duration;
            song.bpm = bpm;
            song.key = key;
            song.energy_level = energy;
            song.tempo_category = bpm.map(TempoCategory::from_bpm);
            song.vibe_tags = split_list(vibe_tags);
            song.mood_keywords = split_list(mood_keywords);

            store.upsert_song(&song)?;
            println!("Stored song {} ({})", song.filename, song.id);
            Ok(())
        }
        Command::Reindex => reindex(&config),
        Command::Match {
            prompt,
            arc_number,
            arc_name,
            theme,
            count,
            min_similarity,
        } => run_match(
            &config,
            &prompt,
            arc_number,
            &arc_name,
            &theme,
            count,
            min_similarity,
        ),
        Command::MarkUsed { song_id, track_id } => {
            let store = open_store(&config)?;
            match store.mark_used(&song_id, track_id.as_deref())? {
                Some(song) => {
                    println!("{} now used {} times", song.filename, song.times_used);
                    Ok(())
                }
                None => bail!("no song with id {}", song_id),
            }
        }
        Command::Stats => stats(&config),
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn open_store(config: &AppConfig) -> Result<SqliteSongStore> {
    SqliteSongStore::open(&config.db_path)
}

fn make_generator(config: &AppConfig) -> Result<EmbeddingGenerator> {
    let model = create_embedding_model(&config.embedding.engine, config.embedding.dimension)?;
    Ok(EmbeddingGenerator::new(model))
}

fn init(config: &AppConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }
    let store = open_store(config)?;
    println!(
        "Catalog ready at {:?} ({} songs)",
        config.db_path,
        store.song_count()?
    );
    Ok(())
}

fn reindex(config: &AppConfig) -> Result<()> {
    let store = open_store(config)?;
    let generator = make_generator(config)?;
    let songs = store.all_songs()?;

    info!("Generating embeddings for {} songs", songs.len());
    let progress = ProgressBar::new(songs.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap(),
    );

    let pairs: Vec<(Song, embeddings::Embedding)> = songs
        .into_par_iter()
        .map(|song| {
            let embedding = generator.embed_song(&song);
            progress.inc(1);
            (song, embedding)
        })
        .collect();
    progress.finish_and_clear();

    let mut index = EmbeddingIndex::new(generator.model_name().to_string());
    index.add_batch(pairs);

    if let Some(parent) = config.index_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    index.save(&config.index_path)?;
    println!(
        "Indexed {} songs into {:?}",
        index.len(),
        config.index_path
    );
    Ok(())
}

fn run_match(
    config: &AppConfig,
    prompt_text: &str,
    arc_number: u32,
    arc_name: &str,
    theme: &str,
    count: usize,
    min_similarity: Option<f64>,
) -> Result<()> {
    let generator = make_generator(config)?;
    let index = EmbeddingIndex::load(&config.index_path)
        .context("No embedding index found; run `reindex` first")?;
    let scorer = SongScorer::new(config.matching.weights)?;
    let matcher = SongMatcher::new(generator, index, scorer, config.matching.clone());

    let prompt: Prompt = hints::build_prompt(1, prompt_text);
    let arc = PromptArc {
        arc_number,
        arc_name: arc_name.to_string(),
        prompts: Vec::new(),
    };

    let matches = matcher.find_matches(&prompt, &arc, theme, count, min_similarity);

    if matches.is_empty() {
        println!("No matches; the bank needs new content for this prompt.");
        return Ok(());
    }

    println!(
        "{:<3} {:<7} {:<10} {:<6} {:<6} {:<6} {:<6} {:<5} filename",
        "#", "score", "conf", "sim", "arc", "bpm", "key", "used"
    );
    for (rank, m) in matches.iter().enumerate() {
        println!(
            "{:<3} {:<7.3} {:<10} {:<6.3} {:<6.2} {:<6.2} {:<6.2} {:<5} {}",
            rank + 1,
            m.final_score,
            m.confidence_level(),
            m.similarity_score,
            m.arc_match_bonus,
            m.bpm_proximity,
            m.key_compatibility,
            m.song.times_used,
            m.song.filename
        );
    }
    Ok(())
}

fn stats(config: &AppConfig) -> Result<()> {
    let store = open_store(config)?;
    println!("Songs in catalog: {}", store.song_count()?);

    let most_used = store.most_used(5)?;
    if !most_used.is_empty() {
        println!("Most used:");
        for song in most_used {
            println!("  {:<4} {}", song.times_used, song.filename);
        }
    }

    match EmbeddingIndex::load(&config.index_path) {
        Ok(index) => {
            let index_stats = index.stats();
            println!(
                "Index: {} songs, dimension {} (model {})",
                index_stats.total_songs,
                index_stats.embedding_dimension,
                index.model_name()
            );
        }
        Err(_) => println!("Index: not built (run `reindex`)"),
    }
    Ok(())
}
