mod file;
mod share;
mod user;

pub use file::{File, NewFile};
pub use share::Share;
pub use user::User;
