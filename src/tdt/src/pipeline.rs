use std::io::Write;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::thread;

use anyhow::{Context, Result};
use batch_queue::BatchQueue;
use gwas_io::{
    parse,
    read::{Pedigree, SampleIndex, VariantRecord, VcfReader},
    write,
};
use log::{debug, error, info, trace};

use crate::config::TdtConfig;
use crate::error::TdtError;
use crate::filter::{self, VariantFilter};
use crate::kernel;
use crate::result::{TdtResult, OUTPUT_HEADER};

/// Records handed to one kernel invocation.
const MAX_CHUNK_SIZE: usize = 1000;

/// The sample index is built by whichever worker pops the first batch, then
/// shared. `None` marks a failed build (already logged) so the remaining
/// workers can stand down instead of retrying.
type SharedIndex = OnceLock<Option<Arc<SampleIndex>>>;

/// Run the full TDT pipeline: reader -> worker pool -> writer, linked by
/// two bounded queues. Blocks until the output file is complete.
pub fn run(config: &TdtConfig, filters: &[Box<dyn VariantFilter>]) -> Result<()> {
    parse::check_input_file(&config.vcf)?;
    parse::check_input_file(&config.ped)?;

    info!("Reading pedigree file...");
    let pedigree = Pedigree::read(&config.ped)?;
    info!("{} families parsed", pedigree.len());

    parse::create_output_directory(&config.output_dir)?;
    let output_path = config.output_dir.join(&config.output_filename);
    info!("TDT output file: {}", output_path.display());

    let reader = VcfReader::new(&config.vcf, config.decompression_threads)?;
    let sample_names: Vec<String> = reader.samples().to_vec();

    let workers    = config.workers.max(1);
    let batch_size = config.batch_size.max(1);
    let read_queue : BatchQueue<Vec<VariantRecord>> = BatchQueue::open("batches", config.max_batches.max(1), 1);
    let write_queue: BatchQueue<Vec<TdtResult>>     = BatchQueue::open("output", config.max_batches.max(1).min(10) * workers, workers);
    let shared_index: SharedIndex = OnceLock::new();

    info!("About to perform TDT test with {workers} workers...");
    thread::scope(|scope| -> Result<()> {
        let reader_queue = read_queue.clone();
        let reader_handle = scope.spawn(move || reader.read_batches(&reader_queue, batch_size));

        let worker_handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let context = WorkerContext {
                    read_queue  : read_queue.clone(),
                    write_queue : write_queue.clone(),
                    pedigree    : &pedigree,
                    sample_names: &sample_names,
                    index       : &shared_index,
                    filters,
                    config,
                };
                scope.spawn(move || worker_loop(worker_id, &context))
            })
            .collect();

        let writer_handle = scope.spawn(|| write_results(&output_path, &write_queue));

        let reader_outcome = reader_handle.join()
            .map_err(|_| TdtError::ThreadPanicked { role: "variant reader" })?;
        for handle in worker_handles {
            handle.join().map_err(|_| TdtError::ThreadPanicked { role: "worker" })?;
        }
        let lines = writer_handle.join()
            .map_err(|_| TdtError::ThreadPanicked { role: "writer" })??;

        // Reported last so a failing reader still drains workers and writer.
        reader_outcome?;
        info!("{lines} TDT results written to '{}'", output_path.display());
        Ok(())
    })
}

struct WorkerContext<'scope> {
    read_queue  : BatchQueue<Vec<VariantRecord>>,
    write_queue : BatchQueue<Vec<TdtResult>>,
    pedigree    : &'scope Pedigree,
    sample_names: &'scope [String],
    index       : &'scope SharedIndex,
    filters     : &'scope [Box<dyn VariantFilter>],
    config      : &'scope TdtConfig,
}

fn worker_loop(worker_id: usize, context: &WorkerContext) {
    let mut batches = 0usize;
    while let Some(batch) = context.read_queue.pop() {
        // The first batch to arrive anywhere triggers the index build.
        let index = context.index.get_or_init(|| {
            match SampleIndex::from_names(context.sample_names) {
                Ok(index) => Some(Arc::new(index)),
                Err(e)    => {
                    error!("Failed to index the variant stream's sample names: {e}");
                    None
                }
            }
        });
        let Some(index) = index else {
            // Keep draining so the reader never blocks on a full queue.
            while context.read_queue.pop().is_some() {}
            break
        };

        if batches % 20 == 0 {
            debug!("[worker {worker_id}] batch {batches} reached: {} records", batch.len());
        }

        let passed = filter::apply_chain(batch, context.filters);
        for chunk in passed.chunks(MAX_CHUNK_SIZE) {
            let results: Vec<TdtResult> = chunk
                .iter()
                .map(|record| {
                    kernel::test_variant(
                        record,
                        context.pedigree,
                        index,
                        &*context.config.affected,
                        context.config.permute.as_deref(),
                    )
                })
                .collect();
            context.write_queue.push(results);
        }
        batches += 1;
    }
    trace!("[worker {worker_id}] exiting after {batches} batches");
    context.write_queue.close_writer();
}

/// Writer role: open the output file, emit the header, then drain result
/// chunks until every worker has closed its handle. On a write failure the
/// queue is still drained so no worker stays parked on a dead sink.
fn write_results(path: &Path, queue: &BatchQueue<Vec<TdtResult>>) -> Result<usize> {
    let outcome = try_write_results(path, queue);
    if outcome.is_err() {
        while queue.pop().is_some() {}
    }
    outcome
}

fn try_write_results(path: &Path, queue: &BatchQueue<Vec<TdtResult>>) -> Result<usize> {
    let loc_msg = || format!("While writing TDT results to '{}'", path.display());
    let mut writer = write::create_output_file(path)?;
    writeln!(writer, "{OUTPUT_HEADER}").with_context(loc_msg)?;

    let mut lines = 0usize;
    while let Some(results) = queue.pop() {
        for result in results {
            writeln!(writer, "{result}").with_context(loc_msg)?;
            lines += 1;
        }
    }
    writer.flush().with_context(loc_msg)?;
    Ok(lines)
}
