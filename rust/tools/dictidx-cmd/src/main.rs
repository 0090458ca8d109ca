use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "dictidx-cmd")]
#[command(about = "Command-line utility for building and querying sectioned dictionary indexes")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a dictionary (.idx, .dict, .ifo) from a tab-separated word list
    Build {
        /// Input file with one `word<TAB>content` entry per line
        input: PathBuf,

        /// Output base path; `.idx`, `.dict` and `.ifo` are appended
        base: PathBuf,

        /// Book name recorded in the info file
        #[arg(long, default_value = "dictionary")]
        bookname: String,

        #[command(flatten)]
        sections: commands::SectionArgs,

        /// Also write the section index (`<base>.idxidx`)
        #[arg(long)]
        with_sections: bool,

        /// Compress the content into `<base>.dict.dz`
        #[arg(long)]
        compress: bool,
    },

    /// Build the section index of a primary index
    BuildSections {
        /// Primary index file
        index: PathBuf,

        /// Output file (defaults to the index path with an `idx` suffix appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        sections: commands::SectionArgs,
    },

    /// Write a copy of a primary index grouped by section prefix
    Sort {
        /// Primary index to sort
        input: PathBuf,

        /// Sorted output index
        output: PathBuf,

        #[command(flatten)]
        sections: commands::SectionArgs,
    },

    /// Look a word up in a dictionary
    Lookup {
        /// Dictionary base path (`<base>.idx`, `<base>.idxidx`, `<base>.dict[.dz]`)
        base: PathBuf,

        /// Word to look up
        word: String,

        /// Compare keys after case folding
        #[arg(short, long)]
        ignore_case: bool,

        /// Print every matching entry instead of the first one
        #[arg(short, long)]
        all: bool,
    },

    /// List the records of a primary or section index
    Dump {
        /// Index file
        index: PathBuf,

        /// Stop after this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Treat the file as a section index and print its statistics
        #[arg(long)]
        stats: bool,
    },

    /// Display the header and chunk table of a dictzip file
    InspectDz {
        /// Dictzip file
        path: PathBuf,

        /// Inflate every chunk to verify the container
        #[arg(long)]
        verify: bool,
    },

    /// Compress a content file into a dictzip container
    Compress {
        /// Input file
        input: PathBuf,

        /// Output file (defaults to the input path with `.dz` appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Uncompressed bytes per chunk
        #[arg(long, default_value_t = dictidx::dictzip::writer::DEFAULT_CHUNK_LENGTH)]
        chunk_length: u16,

        /// Deflate level, 0 to 9
        #[arg(long, default_value_t = 9)]
        level: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            base,
            bookname,
            sections,
            with_sections,
            compress,
        } => commands::build::run(input, base, bookname, sections, with_sections, compress),
        Commands::BuildSections {
            index,
            output,
            sections,
        } => commands::build_sections::run(index, output, sections),
        Commands::Sort {
            input,
            output,
            sections,
        } => commands::sort::run(input, output, sections),
        Commands::Lookup {
            base,
            word,
            ignore_case,
            all,
        } => commands::lookup::run(base, word, ignore_case, all),
        Commands::Dump {
            index,
            limit,
            stats,
        } => commands::dump::run(index, limit, stats),
        Commands::InspectDz { path, verify } => commands::inspect_dz::run(path, verify),
        Commands::Compress {
            input,
            output,
            chunk_length,
            level,
        } => commands::compress::run(input, output, chunk_length, level),
    }
}
