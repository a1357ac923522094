// The layout here follows the approach of wrapping a private ErrorKind enum
// where each variant holds a small struct describing one failure class. The
// public type stays small and the constructors document exactly which layer
// can produce which failure.

use std::io;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Debug)]
enum ErrorKind {
    /// An error that occurs when the spectral bin grid is misconfigured
    Grid(GridError),
    /// An error that occurs when a configuration value is invalid
    Config(ConfigError),
    /// An error that occurs when an unknown absorber name is specified
    AbsorberName(AbsorberNameError),
    /// An error that occurs when a delta record's sample arrays are not
    /// aligned
    RecordShape(RecordShapeError),
    /// An error that occurs when a sample maps outside the bin grid during
    /// pair accumulation (the per-cell failure path)
    BinIndex(BinIndexError),
    /// An error that occurs when the worker pool cannot be constructed
    WorkerPool(WorkerPoolError),
    /// An I/O error raised while writing output
    Io(io::Error),
    /// A serialization error raised while writing output
    Serialize(serde_json::Error),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that the spectral bin grid is
    /// misconfigured
    pub(crate) fn grid(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::Grid(GridError { what }),
        }
    }

    /// produce an error indicating that a configuration value is invalid
    pub(crate) fn config(field: &'static str, what: &'static str) -> Self {
        Error {
            kind: ErrorKind::Config(ConfigError { field, what }),
        }
    }

    /// produce an error indicating that an unknown absorber name was
    /// specified
    pub(crate) fn absorber_name(actual: String) -> Self {
        Error {
            kind: ErrorKind::AbsorberName(AbsorberNameError { actual }),
        }
    }

    /// produce an error indicating that a delta record's sample arrays have
    /// mismatched lengths
    pub(crate) fn record_shape(id: i64, what: &'static str) -> Self {
        Error {
            kind: ErrorKind::RecordShape(RecordShapeError { id, what }),
        }
    }

    /// produce an error indicating that a sample of the given record mapped
    /// outside the bin grid
    pub(crate) fn bin_index(record_id: i64, bin_index: i64, num_pixels: usize) -> Self {
        Error {
            kind: ErrorKind::BinIndex(BinIndexError {
                record_id,
                bin_index,
                num_pixels,
            }),
        }
    }

    /// produce an error indicating that the worker pool could not be built
    pub(crate) fn worker_pool(what: String) -> Self {
        Error {
            kind: ErrorKind::WorkerPool(WorkerPoolError { what }),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Serialize(err),
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            ErrorKind::Grid(err) => err.fmt(f),
            ErrorKind::Config(err) => err.fmt(f),
            ErrorKind::AbsorberName(err) => err.fmt(f),
            ErrorKind::RecordShape(err) => err.fmt(f),
            ErrorKind::BinIndex(err) => err.fmt(f),
            ErrorKind::WorkerPool(err) => err.fmt(f),
            ErrorKind::Io(err) => err.fmt(f),
            ErrorKind::Serialize(err) => err.fmt(f),
        }
    }
}

/// An error that occurs when the spectral bin grid is misconfigured
#[derive(Clone, Debug)]
struct GridError {
    what: &'static str,
}

impl core::fmt::Display for GridError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "problem with the spectral bin grid: {}", self.what)
    }
}

/// An error that occurs when a configuration value is invalid
#[derive(Clone, Debug)]
struct ConfigError {
    field: &'static str,
    what: &'static str,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "problem with configured {}: {}", self.field, self.what)
    }
}

/// An error that occurs when an unknown absorber name is specified
#[derive(Clone, Debug)]
struct AbsorberNameError {
    actual: String,
}

impl core::fmt::Display for AbsorberNameError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"{}\" is not a known absorber name", self.actual)
    }
}

/// An error that occurs when a delta record's sample arrays are not aligned
#[derive(Clone, Debug)]
struct RecordShapeError {
    id: i64,
    what: &'static str,
}

impl core::fmt::Display for RecordShapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "delta record {}: {}", self.id, self.what)
    }
}

/// An error that occurs when a sample maps outside the bin grid
#[derive(Clone, Debug)]
struct BinIndexError {
    record_id: i64,
    bin_index: i64,
    num_pixels: usize,
}

impl core::fmt::Display for BinIndexError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "delta record {} produced bin index {} but the grid only has {} \
             pixels (samples must be pre-filtered to the observed range)",
            self.record_id, self.bin_index, self.num_pixels
        )
    }
}

/// An error that occurs when the worker pool cannot be constructed
#[derive(Clone, Debug)]
struct WorkerPoolError {
    what: String,
}

impl core::fmt::Display for WorkerPoolError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "failed to build the worker pool: {}", self.what)
    }
}
