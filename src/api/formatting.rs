//! Presentation sinks for tick reports
//!
//! The refresh loop hands every [`TickReport`] to a [`PositionSink`]. Sinks
//! here render to a text stream, a JSON-lines stream, or forward owned copies
//! over a channel to another thread.

use crate::api::types::{TickReport, TickStatus};
use std::fmt;
use std::io::Write;
use std::sync::mpsc::Sender;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Failure to deliver a report
#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    /// Writing to the output stream failed
    IoError { message: String },
    /// The report could not be serialized
    SerializationError { message: String },
    /// The receiving end of a channel sink was dropped
    Disconnected,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::IoError { message } => write!(f, "Sink I/O error: {}", message),
            SinkError::SerializationError { message } => {
                write!(f, "Report serialization error: {}", message)
            }
            SinkError::Disconnected => write!(f, "Report receiver disconnected"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(error: std::io::Error) -> Self {
        SinkError::IoError {
            message: error.to_string(),
        }
    }
}

/// Consumer of tick reports
pub trait PositionSink {
    fn publish(&mut self, report: &TickReport) -> SinkResult<()>;
}

impl<S: PositionSink + ?Sized> PositionSink for Box<S> {
    fn publish(&mut self, report: &TickReport) -> SinkResult<()> {
        (**self).publish(report)
    }
}

/// One human-readable line per tick, plus anchor lines when verbose
pub struct TextSink<W: Write> {
    writer: W,
    verbose: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also print every contributing anchor
    pub fn verbose(mut self, enable: bool) -> Self {
        self.verbose = enable;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Render the summary line for a report
pub fn format_report_line(report: &TickReport) -> String {
    match (report.status, report.position) {
        (TickStatus::Located, Some(position)) => {
            let strongest = report
                .strongest
                .as_ref()
                .map(|a| format!(", strongest {} at {} dBm", a.label, a.rssi))
                .unwrap_or_default();
            format!(
                "#{} position {} from {} anchor(s){}",
                report.sequence,
                position,
                report.anchors.len(),
                strongest
            )
        }
        (TickStatus::ScanFailed, _) => format!(
            "#{} scan failed in all {} passes",
            report.sequence, report.failed_passes
        ),
        (TickStatus::NoSignal, _) => format!("#{} no access points in range", report.sequence),
        _ => format!(
            "#{} no surveyed access point among {} observed",
            report.sequence, report.samples_observed
        ),
    }
}

impl<W: Write> PositionSink for TextSink<W> {
    fn publish(&mut self, report: &TickReport) -> SinkResult<()> {
        writeln!(self.writer, "{}", format_report_line(report))?;

        if self.verbose {
            for anchor in &report.anchors {
                let distance = anchor
                    .distance_m
                    .map(|d| format!(" ~{:.1} m", d))
                    .unwrap_or_default();
                writeln!(
                    self.writer,
                    "    {} ({:.1}, {:.1}) {} dBm weight {:.4e}{}",
                    anchor.label, anchor.x, anchor.y, anchor.rssi, anchor.weight, distance
                )?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PositionSink for JsonLinesSink<W> {
    fn publish(&mut self, report: &TickReport) -> SinkResult<()> {
        let line = serde_json::to_string(report).map_err(|e| SinkError::SerializationError {
            message: e.to_string(),
        })?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Sends owned reports to another thread
pub struct ChannelSink {
    sender: Sender<TickReport>,
}

impl ChannelSink {
    pub fn new(sender: Sender<TickReport>) -> Self {
        Self { sender }
    }
}

impl PositionSink for ChannelSink {
    fn publish(&mut self, report: &TickReport) -> SinkResult<()> {
        self.sender
            .send(report.clone())
            .map_err(|_| SinkError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EstimatedPosition, WeightedAnchor};
    use std::sync::mpsc;

    fn create_test_report() -> TickReport {
        let anchor = WeightedAnchor {
            label: "AA:BB:CC:00:00:01".to_string(),
            x: 120.0,
            y: 80.0,
            weight: 0.25,
            rssi: -52,
            distance_m: Some(2.0),
        };
        TickReport {
            sequence: 7,
            timestamp_ms: 1_700_000_000_000,
            status: TickStatus::Located,
            position: Some(EstimatedPosition { x: 120.0, y: 80.0 }),
            strongest: Some(anchor.clone()),
            anchors: vec![anchor],
            samples_observed: 4,
            failed_passes: 0,
        }
    }

    #[test]
    fn test_text_sink_summary_line() {
        let mut sink = TextSink::new(Vec::new());
        sink.publish(&create_test_report()).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "#7 position (120.0, 80.0) from 1 anchor(s), strongest AA:BB:CC:00:00:01 at -52 dBm\n"
        );
    }

    #[test]
    fn test_text_sink_verbose_lists_anchors() {
        let mut sink = TextSink::new(Vec::new()).verbose(true);
        sink.publish(&create_test_report()).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("-52 dBm"));
        assert!(lines[1].contains("~2.0 m"));
    }

    #[test]
    fn test_empty_state_lines() {
        let mut report = create_test_report();
        report.status = TickStatus::NoSignal;
        report.position = None;
        assert_eq!(format_report_line(&report), "#7 no access points in range");

        report.status = TickStatus::NoMatch;
        assert!(format_report_line(&report).contains("among 4 observed"));
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.publish(&create_test_report()).unwrap();
        sink.publish(&create_test_report()).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: TickReport = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, create_test_report());
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelSink::new(tx);
        sink.publish(&create_test_report()).unwrap();
        assert_eq!(rx.recv().unwrap().sequence, 7);

        drop(rx);
        assert_eq!(sink.publish(&create_test_report()), Err(SinkError::Disconnected));
    }
}
