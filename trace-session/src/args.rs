//! Splitting the process argv into tracer and target parts

/// Separator between tracer arguments and the target command line
pub const SEPARATOR: &str = "--";

/// Tracer and target halves of the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSplit {
    /// Everything before the separator, including argv[0]
    pub tracer_args: Vec<String>,
    /// Target path exactly as given
    pub target: String,
    /// Target argv, starting with the path as given
    pub target_args: Vec<String>,
}

/// Split `argv` at the first `--`
///
/// With a separator, the target path is the token right after it and the
/// target argv is everything after it. Without one, the whole argv belongs
/// to the tracer, the target argv is empty and the path is taken from the
/// slot one past the argv terminator, which is the first environment entry.
/// Returns `None` when that slot does not exist.
pub fn split_args(argv: &[String], envp: &[String]) -> Option<ArgSplit> {
    match argv.iter().position(|a| a == SEPARATOR) {
        Some(dpos) => {
            let target_args = argv[dpos + 1..].to_vec();
            let target = target_args.first()?.clone();
            Some(ArgSplit {
                tracer_args: argv[..dpos].to_vec(),
                target,
                target_args,
            })
        }
        None => {
            let target = envp.first()?.clone();
            tracing::warn!(
                "No '{}' separator on the command line, assuming target {:?}",
                SEPARATOR,
                target
            );
            Some(ArgSplit {
                tracer_args: argv.to_vec(),
                target,
                target_args: Vec::new(),
            })
        }
    }
}
