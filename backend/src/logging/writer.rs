//! Background thread that owns the sinks.
//!
//! Log calls enqueue a command and return immediately; sink I/O happens here,
//! off the request path. Failures are reported on standard error and
//! otherwise ignored.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use super::{LogRecord, LogSink};

pub(crate) enum Command {
    Record(Box<LogRecord>),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub(crate) type CommandSender = mpsc::UnboundedSender<Command>;

/// Spawn the writer thread and return its command channel.
pub(crate) fn spawn(sinks: Vec<Box<dyn LogSink>>) -> io::Result<(CommandSender, JoinHandle<()>)> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let handle = thread::Builder::new()
        .name("log-writer".to_owned())
        .spawn(move || run(sinks, receiver))?;
    Ok((sender, handle))
}

fn run(mut sinks: Vec<Box<dyn LogSink>>, mut receiver: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = receiver.blocking_recv() {
        match command {
            Command::Record(record) => write_all(&mut sinks, &record),
            Command::Flush(done) => {
                flush_all(&mut sinks);
                // The caller may have stopped waiting.
                let _ = done.send(());
            }
            Command::Shutdown => break,
        }
    }
    for sink in &mut sinks {
        if let Err(error) = sink.close() {
            report(sink.name(), "close", &error);
        }
    }
}

fn write_all(sinks: &mut [Box<dyn LogSink>], record: &LogRecord) {
    for sink in sinks.iter_mut() {
        if !sink.filter().accepts(record.level()) {
            continue;
        }
        if let Err(error) = sink.write(record) {
            report(sink.name(), "write", &error);
        }
    }
}

fn flush_all(sinks: &mut [Box<dyn LogSink>]) {
    for sink in sinks.iter_mut() {
        if let Err(error) = sink.flush() {
            report(sink.name(), "flush", &error);
        }
    }
}

pub(super) fn report(sink: &str, operation: &str, error: &io::Error) {
    let _ = writeln!(io::stderr(), "log sink {sink} {operation} failed: {error}");
}
