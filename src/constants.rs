/// Marks one blank inside a question sentence. Counting and splitting both use this run.
pub const BLANK_MARKER: &str = "_____________";

pub const TIMER_DURATION_SECS: u32 = 30;
pub const TIMER_TICK_MS: u64 = 1_000;
pub const MIN_TIMER_SECS: u32 = 5;
pub const MAX_TIMER_SECS: u32 = 300;

pub const OPTION_ID_PREFIX: &str = "option-";
pub const BLANK_ID_PREFIX: &str = "blank-";
pub const BLANK_TARGET_KIND: &str = "blank";

pub const DEFAULT_API_URL: &str = "http://localhost:3001/data";

pub const PROMPT_IDLE: &str = "Drag words to the blanks above:";
pub const PROMPT_DRAGGING: &str = "Drop the word onto a blank";

pub fn clamp_timer_secs(secs: u32) -> u32 {
    secs.clamp(MIN_TIMER_SECS, MAX_TIMER_SECS)
}
