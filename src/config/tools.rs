//! External tool configuration (`[js_minifier]`, `[css_minifier]`, `[packer]`).
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// How to invoke one external program.
///
/// `args` may contain the placeholders `{input}`, `{output}` and `{log}`,
/// which are replaced with the concrete paths for each call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    /// Program name (looked up on `PATH`) or path to the executable.
    pub program: String,
    /// Argument template.
    #[serde(default)]
    pub args: Vec<String>,
    /// Kill the program after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolSpec {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            timeout_secs: None,
        }
    }

    /// Substitute the path placeholders in the argument template.
    #[must_use]
    pub fn render_args(&self, input: &Path, output: &Path, log: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let log = log.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{log}", &log)
            })
            .collect()
    }

    /// Configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The three adapters used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Minifier for concatenated JavaScript; result on stdout.
    pub js_minifier: ToolSpec,
    /// Minifier for concatenated CSS; result on stdout.
    pub css_minifier: ToolSpec,
    /// Symbol packer run on minified JavaScript.
    pub packer: ToolSpec,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            js_minifier: ToolSpec::new("uglifyjs", &["{input}", "--compress", "--mangle"]),
            css_minifier: ToolSpec::new("uglifycss", &["{input}"]),
            packer: ToolSpec::new("packer", &["-i", "{input}", "-o", "{output}", "-l", "{log}"]),
        }
    }
}

impl ToolsConfig {
    /// All adapters with the role name used in diagnostics.
    #[must_use]
    pub fn roles(&self) -> [(&'static str, &ToolSpec); 3] {
        [
            ("js minifier", &self.js_minifier),
            ("css minifier", &self.css_minifier),
            ("packer", &self.packer),
        ]
    }
}
