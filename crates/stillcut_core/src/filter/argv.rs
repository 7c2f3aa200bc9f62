//! Command-line vectors for both engine passes.

use crate::engine::{INPUT_FILE, OUTPUT_FILE};

/// argv for the diagnostic pass: decimation graph, audio stripped, debug
/// verbosity so per-frame verdicts reach the log.
pub fn diagnostic_argv(graph: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        INPUT_FILE.to_string(),
        "-vf".to_string(),
        graph.to_string(),
        "-an".to_string(),
        OUTPUT_FILE.to_string(),
        "-loglevel".to_string(),
        "debug".to_string(),
    ]
}

/// argv for the second pass applying `selection_filter`.
pub fn excision_argv(selection_filter: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        INPUT_FILE.to_string(),
        "-vf".to_string(),
        selection_filter.to_string(),
        "-an".to_string(),
        OUTPUT_FILE.to_string(),
    ]
}

/// Render argv for logging.
pub fn display_argv(tool: &str, argv: &[String]) -> String {
    let mut parts = vec![tool.to_string()];
    parts.extend(argv.iter().map(|arg| {
        if arg.contains([' ', '\'', ',']) {
            format!("\"{}\"", arg)
        } else {
            arg.clone()
        }
    }));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_pass_raises_verbosity() {
        let argv = diagnostic_argv("fps=1");
        assert_eq!(argv[..4], ["-i", "input.mp4", "-vf", "fps=1"]);
        assert!(argv.contains(&"-an".to_string()));
        assert_eq!(argv[argv.len() - 2..], ["-loglevel", "debug"]);
    }

    #[test]
    fn excision_pass_writes_fixed_output() {
        let argv = excision_argv("select='1',setpts=N/FRAME_RATE/TB");
        assert_eq!(argv.last().map(String::as_str), Some("output.mp4"));
        assert!(!argv.contains(&"-loglevel".to_string()));
    }

    #[test]
    fn display_quotes_filter_arguments() {
        let shown = display_argv("ffmpeg", &excision_argv("select='1',setpts=N/FRAME_RATE/TB"));
        assert_eq!(
            shown,
            "ffmpeg -i input.mp4 -vf \"select='1',setpts=N/FRAME_RATE/TB\" -an output.mp4"
        );
    }
}
