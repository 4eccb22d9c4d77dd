//! Basic worker pool usage example
//!
//! Demonstrates pool creation, rendezvous submission, panic isolation and
//! shutdown.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use std::thread;
use std::time::Duration;
use wkpool::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== wkpool - Basic Usage Example ===\n");

    let pool = WkPool::new(4)?;
    println!("1. Started pool with {} workers", pool.size());
    println!("   Worker states: {:?}", pool.worker_states());

    println!("\n2. Submitting simple jobs:");
    for i in 0..10 {
        // Blocks until one of the workers takes the job
        pool.execute(move || {
            println!(
                "  Job {} executing on thread {:?}",
                i,
                thread::current().name().unwrap_or("?")
            );
            thread::sleep(Duration::from_millis(50));
        })?;
    }
    println!("   Submitted 10 jobs");

    println!("\n3. Submitting a job that panics:");
    pool.submit(ClosureJob::with_name(
        || panic!("something went wrong"),
        "FaultyJob",
    ))?;
    pool.execute(|| println!("  The worker that caught the panic is still serving"))?;

    println!("\n4. Non-blocking submission:");
    match pool.try_execute(|| println!("  Ran via try_execute")) {
        Ok(()) => println!("   An idle worker took the job"),
        Err(e) => println!("   Rejected: {}", e),
    }

    println!("\n5. Stopping the pool...");
    pool.stop()?;

    println!("\n6. Per-worker statistics:");
    for stat in pool.stats_snapshot() {
        println!(
            "   Worker {}: {:?}, {} processed, {} panicked, avg time: {:.2}μs",
            stat.worker_id,
            stat.state,
            stat.jobs_processed,
            stat.jobs_panicked,
            stat.average_processing_time_us
        );
    }
    println!("   Total jobs submitted: {}", pool.total_jobs_submitted());

    println!("\n7. Submitting after stop:");
    if let Err(e) = pool.execute(|| {}) {
        println!("   Rejected: {}", e);
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
