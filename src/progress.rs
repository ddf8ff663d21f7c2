// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Progress reporting for page fetches and downloads

use std::cell::RefCell;
use std::io::{self, Read};

use indicatif::{ProgressBar, ProgressStyle};

/// What a progress total counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Pages,
    Bytes,
}

/// Sink for incremental progress
///
/// Implementations use interior mutability so a single reporter can be shared
/// by reference between the catalog and the acquirer.
pub trait Progress {
    /// Start a new task; `total` is `None` when the size is unknown
    fn begin(&self, message: &str, total: Option<u64>, unit: Unit);
    /// Replace the expected total once it becomes known
    fn set_total(&self, total: u64);
    /// Record `delta` more units of work
    fn advance(&self, delta: u64);
    /// End the current task
    fn finish(&self);
}

/// Progress sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn begin(&self, _message: &str, _total: Option<u64>, _unit: Unit) {}
    fn set_total(&self, _total: u64) {}
    fn advance(&self, _delta: u64) {}
    fn finish(&self) {}
}

/// Terminal progress bar drawn on stderr
///
/// indicatif hides the bar on its own when stderr is not a terminal.
#[derive(Default)]
pub struct Bar {
    current: RefCell<Option<ProgressBar>>,
}

impl Bar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn style(unit: Unit, bounded: bool) -> ProgressStyle {
        let template = match (unit, bounded) {
            (Unit::Bytes, true) => "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
            (Unit::Bytes, false) => "{spinner} {msg} {bytes} ({bytes_per_sec})",
            (Unit::Pages, true) => "{msg} [{bar:30}] {pos}/{len}",
            (Unit::Pages, false) => "{spinner} {msg} {pos}",
        };
        ProgressStyle::with_template(template)
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Progress for Bar {
    fn begin(&self, message: &str, total: Option<u64>, unit: Unit) {
        let bar = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        bar.set_style(Self::style(unit, total.is_some()));
        bar.set_message(message.to_string());
        if let Some(previous) = self.current.replace(Some(bar)) {
            previous.finish_and_clear();
        }
    }

    fn set_total(&self, total: u64) {
        if let Some(bar) = self.current.borrow().as_ref() {
            bar.set_length(total);
        }
    }

    fn advance(&self, delta: u64) {
        if let Some(bar) = self.current.borrow().as_ref() {
            bar.inc(delta);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

/// Reader adapter that reports every byte read
pub struct ProgressReader<'a, R> {
    inner: R,
    progress: &'a dyn Progress,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    pub fn new(inner: R, progress: &'a dyn Progress) -> Self {
        Self { inner, progress }
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.progress.advance(read as u64);
        Ok(read)
    }
}
