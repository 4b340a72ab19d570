// Domain models - Re-exports the records consumed by the pipeline
//
// This module is split into focused files by domain:
// - question.rs: Question records served by the help desk API

mod question;

pub use question::Question;
