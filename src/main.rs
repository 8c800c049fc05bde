use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;

use fm_overlap::index::fm::{FMIndex, IndexMeta, IndexOpt};
use fm_overlap::index::occ::DEFAULT_SAMPLE_RATE;
use fm_overlap::index::record;
use fm_overlap::index::sa::SuffixArray;
use fm_overlap::io::reads::ReadTable;
use fm_overlap::overlap::{self, OverlapOpt};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "fm-overlap", author, version, about = "FM-index search and overlap detection over a read collection", arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the FM index of a FASTA/FASTQ read set
    Index {
        /// Reads file (FASTA or FASTQ)
        reads: String,
        /// Output prefix for the index file
        #[arg(short, long, default_value = "reads")]
        output: String,
        /// Occ table sampling interval
        #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE as u64, value_parser = clap::value_parser!(u64).range(1..))]
        sample_rate: u64,
        /// Write the line-oriented text record (<prefix>.bwt) instead of binary (<prefix>.fm)
        #[arg(long)]
        text: bool,
    },
    /// Exact backward search for one or more patterns
    Search {
        /// Index file (.fm or .bwt)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Patterns over $ACGT
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Detect suffix/prefix overlaps between all reads
    Overlap {
        /// Index file (.fm or .bwt) built from the same reads
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reads file the index was built from
        reads: String,
        #[arg(short = 'm', long = "min-overlap", default_value_t = 45)]
        min_overlap: usize,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
        /// Only search the forward strand of each read
        #[arg(long = "no-reverse")]
        no_reverse: bool,
        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Print index size breakdown and build metadata
    Info {
        #[arg(short = 'i', long = "index")]
        index: String,
    },
    /// Recompute every rank from scratch and compare with the sampled table
    Validate {
        #[arg(short = 'i', long = "index")]
        index: String,
    },
    /// Print the per-row table i, L(i), O(L(i), i), suffix
    Dump {
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reads file the index was built from
        reads: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Index { reads, output, sample_rate, text } => {
            let opt = IndexOpt { sample_rate: sample_rate as usize };
            run_index(&reads, &output, &opt, text)
        }
        Commands::Search { index, patterns } => run_search(&index, &patterns),
        Commands::Overlap { index, reads, min_overlap, threads, no_reverse, out } => {
            let opt = OverlapOpt { min_overlap, threads, reverse_complement: !no_reverse };
            run_overlap(&index, &reads, out.as_deref(), &opt)
        }
        Commands::Info { index } => run_info(&index),
        Commands::Validate { index } => {
            load_index(&index)?.validate()?;
            log::info!("index '{}' is consistent", index);
            Ok(())
        }
        Commands::Dump { index, reads } => run_dump(&index, &reads),
    }
}

fn load_index(path: &str) -> Result<FMIndex> {
    record::load_any(path).map_err(|e| anyhow::anyhow!("cannot load index '{}': {}", path, e))
}

fn load_reads(path: &str) -> Result<ReadTable> {
    ReadTable::from_path(path).map_err(|e| anyhow::anyhow!("cannot read '{}': {}", path, e))
}

fn run_index(reads_path: &str, output: &str, opt: &IndexOpt, text: bool) -> Result<()> {
    let reads = load_reads(reads_path)?;
    if reads.is_empty() {
        bail!("reads file '{}' contains no sequences", reads_path);
    }

    let sa = SuffixArray::build(&reads);
    let mut fm = FMIndex::build(&sa, &reads, opt)?;
    log::info!("{}", fm.size_report());

    if text {
        let out_path = format!("{}.bwt", output);
        record::save_text(&fm, &out_path).map_err(|e| anyhow::anyhow!("cannot write index to '{}': {}", out_path, e))?;
    } else {
        fm.set_meta(IndexMeta {
            reads_file: Some(reads_path.to_string()),
            build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
            build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        });
        let out_path = format!("{}.fm", output);
        fm.save_to_file(&out_path).map_err(|e| anyhow::anyhow!("cannot write index to '{}': {}", out_path, e))?;
    }
    Ok(())
}

fn run_search(index_path: &str, patterns: &[String]) -> Result<()> {
    let fm = load_index(index_path)?;
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for p in patterns {
        let iv = fm.backward_search(p.as_bytes())?;
        writeln!(out, "{}\t{}\t{}\t{}", p, iv.lower, iv.upper, iv.len())?;
    }
    out.flush()?;
    Ok(())
}

fn run_overlap(index_path: &str, reads_path: &str, out_path: Option<&str>, opt: &OverlapOpt) -> Result<()> {
    let fm = load_index(index_path)?;
    let reads = load_reads(reads_path)?;
    // 记录中不保存后缀数组，从同一批 read 重新生成
    let sa = SuffixArray::build(&reads);
    let overlaps = overlap::find_overlaps(&fm, &sa, &reads, opt)?;

    let mut out: Box<dyn Write> = if let Some(p) = out_path {
        Box::new(std::io::BufWriter::new(std::fs::File::create(p)?))
    } else {
        Box::new(std::io::BufWriter::new(std::io::stdout()))
    };
    overlap::write_overlaps(&mut out, &overlaps, &reads)?;
    out.flush()?;
    Ok(())
}

fn run_info(index_path: &str) -> Result<()> {
    let fm = load_index(index_path)?;
    println!("strings: {}", fm.num_strings());
    println!("sample rate: {}", fm.sample_rate());
    println!("{}", fm.size_report());
    let meta = fm.meta();
    if let Some(r) = &meta.reads_file {
        println!("reads: {}", r);
    }
    if let Some(a) = &meta.build_args {
        println!("built with: {}", a);
    }
    if let Some(t) = &meta.build_timestamp {
        println!("built at: {}", t);
    }
    Ok(())
}

fn run_dump(index_path: &str, reads_path: &str) -> Result<()> {
    let fm = load_index(index_path)?;
    let reads = load_reads(reads_path)?;
    let sa = SuffixArray::build(&reads);
    if sa.len() != fm.len() {
        bail!("reads '{}' do not match index '{}'", reads_path, index_path);
    }
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    fm.write_table(&mut out, &sa, &reads)?;
    out.flush()?;
    Ok(())
}
