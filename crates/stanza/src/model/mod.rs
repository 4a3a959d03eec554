mod catalog;
mod course;
mod front_matter;
mod index;
mod lesson;
mod link;
mod section;
mod slug;

pub use catalog::*;
pub use course::*;
pub use front_matter::*;
pub use index::*;
pub use lesson::*;
pub use link::*;
pub use section::*;
pub use slug::*;
