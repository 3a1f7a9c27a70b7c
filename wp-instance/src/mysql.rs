//! MySQL client invocations run inside an instance's `mysql` container.
//!
//! The root password is taken from the container's own
//! `MYSQL_ROOT_PASSWORD`, so it never appears in the argument list that
//! gets logged or echoed back in engine errors.

/// Quote `arg` for a POSIX shell.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '='));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// `sh -c 'exec <program> -uroot -p"$MYSQL_ROOT_PASSWORD" <args>'`.
fn as_root(program: &str, args: &[&str]) -> Vec<String> {
    let mut script = format!("exec {} -uroot -p\"$MYSQL_ROOT_PASSWORD\"", program);
    for arg in args {
        script.push(' ');
        script.push_str(&shell_quote(arg));
    }
    vec!["sh".to_string(), "-c".to_string(), script]
}

pub fn ping_command() -> Vec<String> {
    as_root("mysqladmin", &["ping", "-h", "127.0.0.1", "--silent"])
}

/// Dump one database. Binary columns are hex-encoded so the dump survives
/// any transport unchanged.
pub fn dump_command(database: &str) -> Vec<String> {
    as_root(
        "mysqldump",
        &[
            "--single-transaction",
            "--routines",
            "--triggers",
            "--hex-blob",
            database,
        ],
    )
}

/// Read a dump from stdin into `database`.
pub fn restore_command(database: &str) -> Vec<String> {
    as_root("mysql", &[database])
}
