// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress channel: the single-writer/single-reader contract every
// operation reports through.
//
// Percent values within one call never go backward and a successful call
// always ends on 100. The reporter enforces both, so operations only name
// their checkpoints.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::{DocMorphError, Result};

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion in `[0, 100]`.
    pub percent: u8,
    /// Short human-readable stage description.
    pub status: String,
    /// Set only on the terminal event of a failed call.
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn new(percent: u8, status: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            status: status.into(),
            error: None,
        }
    }
}

/// Receiver side of the progress channel.
pub trait ProgressSink: Send {
    fn emit(&mut self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent) + Send,
{
    fn emit(&mut self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        // A dropped receiver means nobody is listening any more.
        if self.send(event).is_err() {
            debug!("progress receiver dropped");
        }
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Sink that records every event, for tests and batch callers.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<ProgressEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events.iter().map(|e| e.percent).collect()
    }

    pub fn last(&self) -> Option<&ProgressEvent> {
        self.events.last()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }
}

/// Writer side of the progress channel for one operation invocation.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    last: u8,
    finished: bool,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            sink,
            last: 0,
            finished: false,
        }
    }

    /// Emit a checkpoint. Values below the last emitted percent are raised to
    /// it; values above 100 are clamped.
    pub fn report(&mut self, percent: u8, status: impl Into<String>) {
        if self.finished {
            warn!("progress reported after completion, ignoring");
            return;
        }
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        let event = ProgressEvent::new(percent, status);
        debug!(percent, status = %event.status, "progress");
        self.sink.emit(event);
    }

    /// Emit a checkpoint for step `index` of `total`, interpolated linearly
    /// across `[from, to]`.
    pub fn step(&mut self, from: u8, to: u8, index: usize, total: usize, status: impl Into<String>) {
        let total = total.max(1);
        let span = f32::from(to.saturating_sub(from));
        let offset = (span * index as f32 / total as f32).round() as u8;
        self.report(from.saturating_add(offset), status);
    }

    /// Emit the terminal 100% event.
    pub fn finish(&mut self, status: impl Into<String>) {
        self.report(100, status);
        self.finished = true;
    }

    /// Pass an operation's result through, emitting a terminal error event
    /// (at the current percent) when it failed.
    pub fn conclude<T>(mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    fn fail(&mut self, err: &DocMorphError) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.sink.emit(ProgressEvent {
            percent: self.last,
            status: "Failed".into(),
            error: Some(err.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_never_goes_backward() {
        let mut sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(&mut sink);
        reporter.report(40, "a");
        reporter.report(20, "b");
        reporter.report(250, "c");
        assert_eq!(sink.percents(), vec![40, 40, 100]);
    }

    #[test]
    fn step_interpolates_across_span() {
        let mut sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(&mut sink);
        for i in 0..4 {
            reporter.step(10, 80, i, 4, format!("file {i}"));
        }
        reporter.finish("done");
        assert_eq!(sink.percents(), vec![10, 28, 45, 63, 100]);
    }

    #[test]
    fn nothing_is_emitted_after_finish() {
        let mut sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(&mut sink);
        reporter.finish("done");
        reporter.report(50, "late");
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn conclude_reports_failure_once() {
        let mut sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(&mut sink);
        reporter.report(30, "working");
        let result: Result<()> = reporter.conclude(Err(DocMorphError::render("boom")));
        assert!(result.is_err());
        let last = sink.last().unwrap();
        assert_eq!(last.percent, 30);
        assert!(last.error.as_deref().unwrap().contains("boom"));
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |event: ProgressEvent| seen.push(event.percent);
            let mut reporter = ProgressReporter::new(&mut sink);
            reporter.report(10, "start");
            reporter.finish("end");
        }
        assert_eq!(seen, vec![10, 100]);
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        {
            let mut reporter = ProgressReporter::new(&mut tx);
            reporter.report(10, "one");
            reporter.finish("two");
        }
        drop(tx);
        let mut got = Vec::new();
        while let Some(event) = rx.recv().await {
            got.push(event.percent);
        }
        assert_eq!(got, vec![10, 100]);
    }
}
