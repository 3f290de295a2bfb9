use crate::bio::fasta::{parse_fasta_files, write_fasta, write_fasta_to_writer};
use crate::bio::sequence::Sequence;
use crate::core::distance::{DistanceEngine, DistanceMetric, DEFAULT_KMER_SIZE};
use crate::core::guide_tree::GuideTreeBuilder;
use crate::core::linkage::Linkage;
use crate::core::newick;
use crate::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct SortArgs {
    /// FASTA files to sort (.gz supported); multiple files are combined in
    /// argument order before sorting
    #[arg(value_name = "FASTA", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file for the sorted FASTA (.gz by extension), defaults to stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Distance metric for tree construction (edit, kmer)
    #[arg(short = 'm', long, default_value = "kmer")]
    pub metric: DistanceMetric,

    /// k-mer length for the kmer metric
    #[arg(short = 'k', long, default_value_t = DEFAULT_KMER_SIZE)]
    pub kmer_size: usize,

    /// Linkage rule for agglomerative clustering (average, single, complete)
    #[arg(short = 'l', long, default_value = "average")]
    pub linkage: Linkage,

    /// Order by an existing guide tree in Newick format instead of building one
    #[arg(short = 't', long, value_name = "FILE")]
    pub tree: Option<PathBuf>,

    /// Save the constructed guide tree in Newick format
    #[arg(short = 'O', long, value_name = "FILE", conflicts_with = "tree")]
    pub tree_output: Option<PathBuf>,
}

pub fn run(args: &SortArgs) -> Result<()> {
    info!("Reading {} input file(s)", args.inputs.len());
    let sequences = parse_fasta_files(&args.inputs)?;
    info!("Loaded {} sequences", sequences.len());
    if let Some(first) = sequences.first() {
        info!("Input looks like {:?} data", first.detect_type());
    }

    let order = match &args.tree {
        Some(tree_path) => {
            info!("Ordering by guide tree from {}", tree_path.display());
            order_from_newick(tree_path, &sequences)?
        }
        None => {
            let tree = build_tree(args, &sequences)?;

            if let Some(tree_path) = &args.tree_output {
                newick::write_newick_file(tree_path, &tree, &sequences)?;
                info!("Wrote guide tree to {}", tree_path.display());
            }

            tree.traversal_order()?
        }
    };

    let sorted: Vec<Sequence> = order.iter().map(|&i| sequences[i].clone()).collect();

    match &args.output {
        Some(path) => {
            write_fasta(path, &sorted)?;
            info!("Wrote {} sequences to {}", sorted.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_fasta_to_writer(&mut writer, &sorted)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn build_tree(args: &SortArgs, sequences: &[Sequence]) -> Result<crate::core::guide_tree::GuideTree> {
    info!(
        "Computing pairwise distances ({} metric, {} linkage)",
        args.metric, args.linkage
    );

    let progress = ProgressBar::new(DistanceEngine::pair_count(sequences.len()));
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} pairs ({eta})")
            .expect("static progress template"),
    );

    let engine = DistanceEngine::new(args.metric).with_kmer_size(args.kmer_size);
    let matrix = engine.compute_with_progress(sequences, Some(&progress))?;
    progress.finish_and_clear();

    info!("Building guide tree over {} sequences", sequences.len());
    GuideTreeBuilder::new(args.linkage).build(&matrix)
}

/// Order sequences by the leaf order of an external guide tree. Leaves that
/// name no input sequence are skipped with a warning; sequences the tree
/// never names are appended in input order.
fn order_from_newick(path: &PathBuf, sequences: &[Sequence]) -> Result<Vec<usize>> {
    let tree = newick::read_newick(path)?;

    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(sequences.len());
    for (i, seq) in sequences.iter().enumerate() {
        if index_by_id.insert(seq.id.as_str(), i).is_some() {
            warn!("Duplicate sequence id '{}', keeping the last occurrence", seq.id);
        }
    }

    let mut order = Vec::with_capacity(sequences.len());
    let mut emitted = vec![false; sequences.len()];

    for name in tree.leaf_names() {
        match index_by_id.get(name) {
            Some(&i) if !emitted[i] => {
                emitted[i] = true;
                order.push(i);
            }
            Some(_) => warn!("Guide tree names leaf '{}' more than once, ignoring repeat", name),
            None => warn!("Guide tree leaf '{}' not found in input, skipping", name),
        }
    }

    let missing = emitted.iter().filter(|&&e| !e).count();
    if missing > 0 {
        warn!(
            "{} sequence(s) absent from the guide tree, appending in input order",
            missing
        );
        for (i, done) in emitted.iter().enumerate() {
            if !done {
                order.push(i);
            }
        }
    }

    Ok(order)
}
