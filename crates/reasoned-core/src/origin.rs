//! The single call-site location captured when an error is finalized.

use std::fmt;
use std::panic::Location;

/// Where a reasoned error was created.
///
/// Always one frame: the immediate caller of the finalization entry point.
/// `module` and `operation` are only known when the origin is captured with
/// [`origin!`](crate::origin!) (which the `reasoned!` macro does); the
/// `#[track_caller]` path records file, line and column only and leaves them
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin {
    module: &'static str,
    operation: &'static str,
    file: &'static str,
    line: u32,
    column: u32,
}

impl Origin {
    pub const fn new(
        module: &'static str,
        operation: &'static str,
        file: &'static str,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            module,
            operation,
            file,
            line,
            column,
        }
    }

    /// Origin of a rebuilt error whose call site was not transported.
    pub const fn unknown() -> Self {
        Self::new("", "", "", 0, 0)
    }

    /// Capture the location of the caller.
    ///
    /// Every function between the public entry point and this call must be
    /// `#[track_caller]` for the location to point at user code.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new("", "", location.file(), location.line(), location.column())
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn is_unknown(&self) -> bool {
        self.file.is_empty() && self.line == 0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("<unknown>");
        }
        match (self.module.is_empty(), self.operation.is_empty()) {
            (false, false) => write!(f, "{}::{} ", self.module, self.operation)?,
            (false, true) => write!(f, "{} ", self.module)?,
            (true, false) => write!(f, "{} ", self.operation)?,
            (true, true) => {}
        }
        write!(f, "({}:{}:{})", self.file, self.line, self.column)
    }
}

/// Strip the helper suffix and closure frames from a nested fn's type name,
/// leaving the name of the enclosing function.
#[doc(hidden)]
pub fn operation_name(type_name: &'static str) -> &'static str {
    let mut name = type_name.strip_suffix("::__origin").unwrap_or(type_name);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    match name.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

/// Capture a full [`Origin`] at the macro call site: module path, enclosing
/// function, file, line and column.
#[macro_export]
macro_rules! origin {
    () => {{
        fn __origin() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::Origin::new(
            ::core::module_path!(),
            $crate::origin::operation_name(__type_name_of(__origin)),
            ::core::file!(),
            ::core::line!(),
            ::core::column!(),
        )
    }};
}
