//! The runtime library (§6): the 12 external routines a compiled program
//! links against for I/O and string handling. Built as a static/dynamic
//! library so `llpc-gen`'s linker step can pull it in alongside the object
//! file the emitter produces.

mod io;
mod strings;

pub use io::*;
pub use strings::*;
