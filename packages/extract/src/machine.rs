//! Line-at-a-time field extraction state machine.
//!
//! ```text
//! Awaiting(j)  --line == label[j]-------------> Consuming(j)
//! Consuming(j) --line == label[j+1]-----------> Consuming(j+1), field j buffered
//! Consuming(j) --stop marker------------------> Halted, field j buffered
//! Consuming(j) --noise------------------------> Consuming(j), line dropped
//! Consuming(j) --other------------------------> Consuming(j), line appended
//! ```
//!
//! Whenever the buffer reaches one value per label a [`RawRecord`] is
//! emitted and the buffer is cleared.

use crate::revision::{LabelSequence, LineRules};
use crate::{ExtractError, FlushPolicy};

/// Field values for one label cycle, in label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// One value per label consumed so far.
    pub fields: Vec<String>,
    /// `false` when this is an incomplete trailing block flushed at the end
    /// of the stream.
    pub complete: bool,
}

/// Where the machine is in the label cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the current label to appear.
    Awaiting,
    /// Accumulating the text of the current field.
    Consuming,
    /// A stop marker was seen; every further line is ignored.
    Halted,
}

/// What a single [`FieldMachine::step`] did with its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The line was not the awaited label, or the machine has halted.
    Ignored,
    /// The line was the awaited label and its field is now open.
    FieldStarted,
    /// The line was added to the open field.
    Appended,
    /// The line matched the noise filter and was dropped.
    Discarded,
    /// The line was the next label: the open field was closed and the next
    /// one opened. Carries the record if that closed a full cycle.
    FieldCompleted(Option<RawRecord>),
    /// The line was a stop marker: the open field was closed and the
    /// machine halted. Carries the record if that closed a full cycle.
    Stopped(Option<RawRecord>),
}

/// Extraction state: current label index, the open field, and the fields
/// buffered for the record under construction.
#[derive(Debug)]
pub struct FieldMachine<'a, R: ?Sized> {
    labels: &'a LabelSequence,
    rules: &'a R,
    label_index: usize,
    phase: Phase,
    field: String,
    buffer: Vec<String>,
}

impl<'a, R: LineRules + ?Sized> FieldMachine<'a, R> {
    /// Creates a machine awaiting the first label.
    #[must_use]
    pub const fn new(labels: &'a LabelSequence, rules: &'a R) -> Self {
        Self {
            labels,
            rules,
            label_index: 0,
            phase: Phase::Awaiting,
            field: String::new(),
            buffer: Vec::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the label whose field is awaited or open.
    #[must_use]
    pub const fn label_index(&self) -> usize {
        self.label_index
    }

    /// Field values buffered for the record under construction.
    #[must_use]
    pub fn buffered(&self) -> &[String] {
        &self.buffer
    }

    /// Feeds one line to the machine.
    pub fn step(&mut self, line: &str) -> Step {
        match self.phase {
            Phase::Halted => Step::Ignored,
            Phase::Awaiting => {
                if line == self.labels.label(self.label_index) {
                    self.phase = Phase::Consuming;
                    Step::FieldStarted
                } else {
                    Step::Ignored
                }
            }
            Phase::Consuming => {
                if line == self.labels.label(self.label_index + 1) {
                    Step::FieldCompleted(self.close_field())
                } else if self.rules.is_stop(line) {
                    let record = self.close_field();
                    self.phase = Phase::Halted;
                    Step::Stopped(record)
                } else if self.rules.is_noise(line) {
                    Step::Discarded
                } else {
                    self.field.push_str(line);
                    self.field.push(' ');
                    Step::Appended
                }
            }
        }
    }

    /// Ends the stream.
    ///
    /// An open field is closed with whatever it holds, which may complete
    /// the final record. Any remaining incomplete buffer is then handled
    /// according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::MalformedRecord`] under
    /// [`FlushPolicy::Strict`] if an incomplete buffer remains.
    pub fn finish(mut self, policy: FlushPolicy) -> Result<Option<RawRecord>, ExtractError> {
        if self.phase == Phase::Consuming
            && let Some(record) = self.close_field()
        {
            return Ok(Some(record));
        }

        if self.buffer.is_empty() {
            return Ok(None);
        }

        let found = self.buffer.len();
        let expected = self.labels.len();
        match policy {
            FlushPolicy::Strict => Err(ExtractError::MalformedRecord { found, expected }),
            FlushPolicy::Lenient => {
                log::warn!("Flushing incomplete trailing record ({found} of {expected} fields)");
                Ok(Some(RawRecord {
                    fields: std::mem::take(&mut self.buffer),
                    complete: false,
                }))
            }
        }
    }

    fn close_field(&mut self) -> Option<RawRecord> {
        let value = self.field.trim().to_owned();
        self.field.clear();
        self.buffer.push(value);
        self.label_index = (self.label_index + 1) % self.labels.len();

        if self.buffer.len() == self.labels.len() {
            Some(RawRecord {
                fields: std::mem::take(&mut self.buffer),
                complete: true,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::FnRules;

    fn labels() -> LabelSequence {
        LabelSequence::new(["A:", "B:", "C:"]).unwrap()
    }

    fn rules() -> impl LineRules {
        FnRules::new(
            |l: &str| l.starts_with("Page"),
            |l: &str| l.starts_with("Certification:"),
        )
    }

    #[test]
    fn awaits_first_label() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        assert_eq!(machine.step("preamble"), Step::Ignored);
        assert_eq!(machine.step("B:"), Step::Ignored);
        assert_eq!(machine.phase(), Phase::Awaiting);
        assert_eq!(machine.step("A:"), Step::FieldStarted);
        assert_eq!(machine.phase(), Phase::Consuming);
        assert_eq!(machine.label_index(), 0);
    }

    #[test]
    fn next_label_closes_field_and_opens_next() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        machine.step("A:");
        assert_eq!(machine.step("first"), Step::Appended);
        assert_eq!(machine.step("line"), Step::Appended);
        assert_eq!(machine.step("B:"), Step::FieldCompleted(None));
        assert_eq!(machine.label_index(), 1);
        assert_eq!(machine.phase(), Phase::Consuming);
        assert_eq!(machine.buffered(), &["first line".to_owned()]);
    }

    #[test]
    fn only_the_next_label_closes_a_field() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        machine.step("A:");
        assert_eq!(machine.step("C:"), Step::Appended);
        assert_eq!(machine.step("A:"), Step::Appended);
        machine.step("B:");
        assert_eq!(machine.buffered(), &["C: A:".to_owned()]);
    }

    #[test]
    fn full_cycle_emits_record() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        for line in ["A:", "a", "B:", "b", "C:", "c"] {
            machine.step(line);
        }
        let step = machine.step("A:");
        assert_eq!(
            step,
            Step::FieldCompleted(Some(RawRecord {
                fields: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
                complete: true,
            }))
        );
        assert_eq!(machine.label_index(), 0);
        assert!(machine.buffered().is_empty());
    }

    #[test]
    fn noise_is_discarded() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        machine.step("A:");
        machine.step("kept");
        assert_eq!(machine.step("Page 2 of 5"), Step::Discarded);
        machine.step("text");
        machine.step("B:");
        assert_eq!(machine.buffered(), &["kept text".to_owned()]);
    }

    #[test]
    fn noise_outside_a_field_is_just_ignored() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);
        assert_eq!(machine.step("Page 1 of 5"), Step::Ignored);
    }

    #[test]
    fn stop_marker_halts() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        machine.step("A:");
        machine.step("a");
        assert_eq!(machine.step("Certification: I certify"), Step::Stopped(None));
        assert_eq!(machine.phase(), Phase::Halted);
        assert_eq!(machine.step("B:"), Step::Ignored);
        assert_eq!(machine.buffered(), &["a".to_owned()]);
    }

    #[test]
    fn stop_marker_can_close_a_cycle() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        for line in ["A:", "a", "B:", "b", "C:", "c"] {
            machine.step(line);
        }
        let step = machine.step("Certification:");
        assert!(matches!(step, Step::Stopped(Some(ref r)) if r.fields.len() == 3 && r.complete));
        assert_eq!(machine.finish(FlushPolicy::Strict).unwrap(), None);
    }

    #[test]
    fn stop_marker_before_first_label_is_ignored() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        assert_eq!(machine.step("Certification:"), Step::Ignored);
        assert_eq!(machine.step("A:"), Step::FieldStarted);
    }

    #[test]
    fn finish_closes_open_last_field() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        for line in ["A:", "a", "B:", "b", "C:", "c", "more"] {
            machine.step(line);
        }
        let record = machine.finish(FlushPolicy::Strict).unwrap().unwrap();
        assert_eq!(record.fields, vec!["a", "b", "c more"]);
        assert!(record.complete);
    }

    #[test]
    fn lenient_finish_flushes_partial() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        for line in ["A:", "a", "B:", "b"] {
            machine.step(line);
        }
        let record = machine.finish(FlushPolicy::Lenient).unwrap().unwrap();
        assert_eq!(record.fields, vec!["a", "b"]);
        assert!(!record.complete);
    }

    #[test]
    fn strict_finish_rejects_partial() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        for line in ["A:", "a", "B:", "b"] {
            machine.step(line);
        }
        let err = machine.finish(FlushPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MalformedRecord {
                found: 2,
                expected: 3
            }
        ));
    }

    #[test]
    fn finish_without_any_label_is_empty() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);
        machine.step("nothing here");
        assert_eq!(machine.finish(FlushPolicy::Strict).unwrap(), None);
    }

    #[test]
    fn blank_lines_keep_their_separator() {
        let labels = labels();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        for line in ["A:", "", "x", "", "y", ""] {
            machine.step(line);
        }
        machine.step("B:");
        assert_eq!(machine.buffered(), &["x  y".to_owned()]);
    }

    #[test]
    fn single_label_sequence_cycles_on_itself() {
        let labels = LabelSequence::new(["Item:"]).unwrap();
        let rules = rules();
        let mut machine = FieldMachine::new(&labels, &rules);

        machine.step("Item:");
        machine.step("one");
        let step = machine.step("Item:");
        assert_eq!(
            step,
            Step::FieldCompleted(Some(RawRecord {
                fields: vec!["one".to_owned()],
                complete: true,
            }))
        );
    }
}
