use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! consistency_error {
    ($method:expr, $index:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Consistency {
            method: $method.to_string(),
            index: $index,
            message: format!($fmt $(, $arg)*),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure aborts the patch of the class being processed; nothing is retried, since the
/// shape of a given class file is fixed and a second attempt cannot succeed. The host decides
/// whether to continue with the unpatched class or to abort loading.
///
/// # Error Categories
///
/// ## Container Errors
/// - [`Error::Malformed`] - The input bytes are not a well-formed class file
/// - [`Error::OutOfBounds`] - A read ran past the end of the input
/// - [`Error::InvalidDescriptor`] - A field or method descriptor could not be parsed
/// - [`Error::ConstantPoolFull`] - Adding a constant would exceed the 65535 entry limit
/// - [`Error::BranchOutOfRange`] - A relocated branch no longer fits its offset encoding
///
/// ## Shape Mismatch Errors
/// - [`Error::MethodNotFound`] - The target method does not exist in the class
/// - [`Error::AnchorNotFound`] - The target method never calls the expected callee
/// - [`Error::UnresolvedFieldType`] - A field the injected code reads was not recorded
/// - [`Error::Consistency`] - The method body does not have the expected shape
///
/// ## Internal Errors
/// - [`Error::StackUnderflow`] - Stack simulation popped an empty operand stack
///
/// # Examples
///
/// ```rust,no_run
/// use veinpatch::{patch_class, Error};
///
/// let bytes = std::fs::read("ItemInWorldManager.class")?;
/// match patch_class(&bytes, false) {
///     Ok(patched) => println!("patched, {} bytes", patched.len()),
///     Err(Error::AnchorNotFound { method, callee }) => {
///         eprintln!("{method} never calls {callee}, wrong game version?");
///     }
///     Err(e) => eprintln!("patch failed: {e}"),
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The class file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// A field or method descriptor does not follow the JVM descriptor grammar.
    #[error("Invalid descriptor - {0}")]
    InvalidDescriptor(String),

    /// The constant pool has no room for another entry.
    #[error("Constant pool exceeds 65535 entries")]
    ConstantPoolFull,

    /// A branch offset no longer fits into its instruction encoding after relocation.
    #[error("Branch at instruction {index} in {method} is out of range ({offset})")]
    BranchOutOfRange {
        /// Method containing the branch
        method: String,
        /// Index of the branch instruction
        index: usize,
        /// The offset that did not fit
        offset: i64,
    },

    /// The method to patch does not exist in the class.
    #[error("Method {method} not found in {class}")]
    MethodNotFound {
        /// Internal name of the class that was searched
        class: String,
        /// Resolved name of the method that was expected
        method: String,
    },

    /// The method to patch never calls the expected callee.
    #[error("Method {method} has no call to {callee}")]
    AnchorNotFound {
        /// Name of the method that was scanned
        method: String,
        /// Resolved name of the callee that was expected
        callee: String,
    },

    /// A field required by the injected call was not recorded during the field scan.
    #[error("No descriptor recorded for field {0}")]
    UnresolvedFieldType(String),

    /// The method body does not have the shape the transformation was written against.
    #[error("Unexpected shape in {method} at instruction {index}: {message}")]
    Consistency {
        /// Method being transformed
        method: String,
        /// Index of the instruction where the expectation failed
        index: usize,
        /// What was expected
        message: String,
    },

    /// Stack simulation popped a value from an empty operand stack.
    ///
    /// This signals a defect in the splicer rather than a problem with the input.
    #[error("Stack underflow in {method} at instruction {index}")]
    StackUnderflow {
        /// Method being simulated
        method: String,
        /// Index of the instruction that underflowed
        index: usize,
    },

    /// A mapping file line could not be understood.
    #[error("Invalid mapping at line {line}: {message}")]
    InvalidMapping {
        /// One-based line number in the mapping source
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
