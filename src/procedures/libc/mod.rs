//! summaries for `libc.so.6`.

mod putchar;
mod puts;
mod strlen;

pub use self::putchar::Putchar;
pub use self::puts::Puts;
pub use self::strlen::Strlen;

pub const LIBRARY: &str = "libc.so.6";
