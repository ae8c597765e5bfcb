//! View state machines. Each component takes messages through `update` and
//! renders a serialisable view model through `view`; none of them perform
//! I/O. Mutations leave a component as a returned value for the caller to
//! dispatch.

pub mod entry_modal;
pub mod entry_table;
pub mod shell;

pub use entry_modal::{EntryModal, ModalKind, ModalMsg, ModalView};
pub use entry_table::{EntryTable, RowView, SortOrder, TableMsg, TableView};
pub use shell::{Shell, ShellCommand, ShellMsg, ShellView};
