//! The ledger kept in the sheet file.
//!
//! [work::Work] maps day keys to [day::Day]s, a day maps activity names to
//! [activity::Activity]s, and an activity is a list of [entry::Entry] intervals. Days and
//! activities are created on first access, and values still in their loaded form are built when
//! they're first touched.

pub mod activity;
pub mod day;
pub mod entry;
pub mod jira;
pub mod note;
pub mod tag;
pub mod work;

pub use activity::Activity;
pub use day::Day;
pub use entry::Entry;
pub use jira::JiraTicket;
pub use note::Note;
pub use tag::Tag;
pub use work::Work;
