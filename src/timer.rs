#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTick {
    Running(u32),
    Expired,
    Stopped,
}

/// Countdown for one question, advanced one unit per tick by the owner.
#[derive(Clone, Debug)]
pub struct QuestionTimer {
    duration: u32,
    time_left: u32,
    stopped: bool,
}

impl QuestionTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration: duration_secs,
            time_left: duration_secs,
            stopped: false,
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn progress_percent(&self) -> f32 {
        if self.duration == 0 {
            return 0.0;
        }
        self.time_left as f32 / self.duration as f32 * 100.0
    }

    /// `Expired` is reported exactly once; the timer stops itself at that point.
    pub fn tick(&mut self) -> TimerTick {
        if self.stopped {
            return TimerTick::Stopped;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.stopped = true;
            return TimerTick::Expired;
        }
        TimerTick::Running(self.time_left)
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
