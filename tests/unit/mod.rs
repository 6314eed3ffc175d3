//! Unit test modules.

mod audio_test;
mod workout_engine_test;
mod workout_parser_test;
