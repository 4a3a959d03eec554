//! Useful utilities for parsing and working with CommonMark files.

mod parser;

pub use parser::*;

use pulldown_cmark::Event;
use pulldown_cmark_to_cmark::{cmark_with_options, Options};
use std::borrow::Borrow;

use crate::error::Result;

pub trait EventIteratorExt {
    /// Consume an event collection and return a stringified representation.
    fn stringify(self) -> Result<String>;
}

impl<'a, I, E> EventIteratorExt for I
where
    I: Iterator<Item = E>,
    E: Borrow<Event<'a>>,
{
    fn stringify(self) -> Result<String> {
        let mut buffer = String::new();
        let options = Options {
            code_block_token_count: 3,
            ..Default::default()
        };

        cmark_with_options(self, &mut buffer, options)?;

        Ok(buffer)
    }
}

/// Flatten soft and hard breaks into single spaces, so multi-line link texts and
/// list items read as one line.
pub fn flatten_breaks(event: Event<'_>) -> Event<'_> {
    match event {
        Event::SoftBreak | Event::HardBreak => Event::Text(" ".into()),
        other => other,
    }
}
