use crate::build::BuildResult;
use crate::dev::DevNotice;
use crate::mode::Mode;
use crate::report::Reporter;

/// One call made on a [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    BuildStarted(Mode),
    BuildAborted,
    BuildFinished(BuildResult),
    Dev(DevNotice),
}

/// Reporter that remembers every call, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<ReportEvent>,
}

impl Reporter for RecordingReporter {
    fn build_started(&mut self, mode: Mode) {
        self.events.push(ReportEvent::BuildStarted(mode));
    }

    fn build_aborted(&mut self) {
        self.events.push(ReportEvent::BuildAborted);
    }

    fn build_finished(&mut self, result: &BuildResult) {
        self.events.push(ReportEvent::BuildFinished(result.clone()));
    }

    fn dev_notice(&mut self, notice: &DevNotice) {
        self.events.push(ReportEvent::Dev(notice.clone()));
    }
}
