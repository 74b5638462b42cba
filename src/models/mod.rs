mod entry;
mod forms;
mod user;

pub use entry::{EntryValue, UtilizationEntry, ValueSchema};
pub use forms::{EntryForm, FilterForm, LoginForm, RegisterForm};
pub use user::{Credential, Role, SessionUser};
