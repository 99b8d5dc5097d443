use clap::{crate_authors, crate_version, Clap};
use slog::*;
use std::{process::exit, thread, time::Duration};
use workers::{Result, WorkerPool};

#[derive(Clap)]
#[clap(version =crate_version!() , author = crate_authors!())]
struct Options {
    #[clap(long, short, default_value = "4")]
    workers: usize,

    #[clap(long, default_value = "2000")]
    delay_ms: u64,

    #[clap(long, default_value = "3000")]
    run_ms: u64,
}

fn main() {
    let logger = logger();
    let options = Options::parse();

    if let Err(e) = run(&options, &logger) {
        error!(&logger, "{}", e);
        exit(1);
    }
}

fn logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, o!())
}

fn run(options: &Options, logger: &Logger) -> Result<()> {
    info!(logger, "worker pool demo";
        "version" => crate_version!(),
        "workers" => options.workers,
    );

    let worker_threads = WorkerPool::new(options.workers);
    let event_loop = WorkerPool::new(1);

    worker_threads.start()?;
    event_loop.start()?;

    let log = logger.clone();
    worker_threads.submit(move || info!(log, "task A"))?;
    let log = logger.clone();
    worker_threads.submit(move || info!(log, "task B"))?;

    let log = logger.clone();
    event_loop.submit(move || info!(log, "task C"))?;
    let log = logger.clone();
    event_loop.submit(move || info!(log, "task D"))?;

    let log = logger.clone();
    worker_threads.submit_after(
        move || info!(log, "task E (delayed)"),
        Duration::from_millis(options.delay_ms),
    )?;

    thread::sleep(Duration::from_millis(options.run_ms));

    worker_threads.stop();
    event_loop.stop();

    worker_threads.join()?;
    event_loop.join()?;

    for failure in worker_threads.failures().try_iter() {
        warn!(logger, "task panicked";
            "worker" => failure.worker,
            "reason" => failure.reason,
        );
    }

    Ok(())
}
