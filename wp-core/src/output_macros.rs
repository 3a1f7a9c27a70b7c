//! Output macros for the wp-manager CLI.
//!
//! Plain output goes to stdout; diagnostics go to stderr so that `list` and
//! `info` output stays parseable.

#[macro_export]
macro_rules! wp_println {
    () => {
        println!();
    };
    ($($arg:tt)*) => {
        println!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! wp_error {
    ($($arg:tt)*) => {{
        use $crate::colored::Colorize;
        eprintln!("{}", format!($($arg)*).red());
    }};
}

#[macro_export]
macro_rules! wp_error_hint {
    ($($arg:tt)*) => {{
        use $crate::colored::Colorize;
        eprintln!("{}", format!("💡 {}", format!($($arg)*)).yellow());
    }};
}

#[macro_export]
macro_rules! wp_warning {
    ($($arg:tt)*) => {{
        use $crate::colored::Colorize;
        eprintln!("{}", format!("⚠ {}", format!($($arg)*)).yellow());
    }};
}
