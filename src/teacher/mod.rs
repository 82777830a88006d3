pub mod cleaner;
pub mod lesson;
pub mod prompts;
pub mod sequencer;
