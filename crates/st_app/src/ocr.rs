/// OCR lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No OCR work in progress.
    #[default]
    Idle,
    /// An OCR job has been started and is expected to complete asynchronously.
    Running,
}

/// Minimal OCR job model: at most one job at a time.
#[derive(Debug, Default)]
pub struct Model {
    phase: Phase,
    completed: u64,
}

impl Model {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Number of jobs that reached `finish`.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Enter `Running`. Returns `false` (and changes nothing) if a job is already running.
    pub fn try_start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.phase = Phase::Running;
        true
    }

    pub fn finish(&mut self) {
        if self.is_running() {
            self.completed += 1;
        }
        self.phase = Phase::Idle;
    }
}
