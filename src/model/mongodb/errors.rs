//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key write error.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    if let ErrorKind::Write(WriteFailure::WriteError(ref e)) = *err.kind {
        return e.code == DUPLICATE_KEY;
    }
    false
}

/// If the given error is an unordered bulk write that failed purely due to
/// duplicate keys, return how many inserts were rejected.
pub fn duplicate_keys_in_bulk_error(err: &DbError) -> Option<usize> {
    if let ErrorKind::BulkWrite(ref failure) = *err.kind {
        if failure.write_concern_error.is_none() {
            if let Some(ref write_errors) = failure.write_errors {
                if write_errors.iter().all(|e| e.code == DUPLICATE_KEY) {
                    return Some(write_errors.len());
                }
            }
        }
    }
    None
}
