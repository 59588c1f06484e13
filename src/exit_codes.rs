//! Process exit codes of the `buildplan` binary.
//!
//! Scripts driving a build can tell a broken descriptor set (`3`) apart from
//! an unreadable one (`1`) or a mistyped command line (`2`, reported by
//! clap).

use crate::error::Error;

pub const SUCCESS: u8 = 0;
/// I/O, parse and every other failure.
pub const FAILURE: u8 = 1;
/// Invalid command-line usage.
pub const USAGE: u8 = 2;
/// The descriptors themselves are defective.
pub const DESCRIPTOR_DEFECT: u8 = 3;

/// Maps a command failure to its exit code.
///
/// Looks through the whole context chain, so library errors wrapped with
/// `anyhow::Context` are still recognised.
pub fn for_error(error: &anyhow::Error) -> u8 {
    let defect = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<Error>())
        .any(Error::is_descriptor_defect);
    if defect {
        DESCRIPTOR_DEFECT
    } else {
        FAILURE
    }
}
