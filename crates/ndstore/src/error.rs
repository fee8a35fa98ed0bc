use std::error::Error;
use std::fmt;

/// Messages for the read error codes; index 0 means success.
pub const READ_ERROR_MESSAGES: [&str; 8] = [
    "no error",
    "error opening container file",
    "couldn't find data set in container file",
    "error reading data from container file",
    "error reading data slice from container file",
    "invalid slice of container data",
    "non-positive rank in container file",
    "error opening data set in container file",
];

/// Failure of a container read. Each variant has a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    OpenFailed,
    DatasetNotFound,
    ReadFailed,
    SliceReadFailed,
    InvalidSlice,
    InvalidRank,
    DatasetOpenFailed,
}

impl ReadError {
    pub const fn code(self) -> i32 {
        match self {
            ReadError::OpenFailed => 1,
            ReadError::DatasetNotFound => 2,
            ReadError::ReadFailed => 3,
            ReadError::SliceReadFailed => 4,
            ReadError::InvalidSlice => 5,
            ReadError::InvalidRank => 6,
            ReadError::DatasetOpenFailed => 7,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ReadError::OpenFailed),
            2 => Some(ReadError::DatasetNotFound),
            3 => Some(ReadError::ReadFailed),
            4 => Some(ReadError::SliceReadFailed),
            5 => Some(ReadError::InvalidSlice),
            6 => Some(ReadError::InvalidRank),
            7 => Some(ReadError::DatasetOpenFailed),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        READ_ERROR_MESSAGES[self.code() as usize]
    }
}

/// Message for a read error code, or `None` for codes outside the table.
pub fn read_strerror(code: i32) -> Option<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|idx| READ_ERROR_MESSAGES.get(idx).copied())
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for ReadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_the_table() {
        for code in 1..=7 {
            let err = ReadError::from_code(code).unwrap();
            assert_eq!(err.code(), code);
            assert_eq!(read_strerror(code), Some(err.message()));
        }
        assert_eq!(ReadError::from_code(0), None);
        assert_eq!(ReadError::from_code(8), None);
    }

    #[test]
    fn strerror_covers_success_and_rejects_unknown_codes() {
        assert_eq!(read_strerror(0), Some("no error"));
        assert_eq!(read_strerror(-1), None);
        assert_eq!(read_strerror(42), None);
        assert_eq!(
            ReadError::InvalidSlice.to_string(),
            "invalid slice of container data"
        );
    }
}
